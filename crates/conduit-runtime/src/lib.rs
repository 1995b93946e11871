//! Conduit Runtime - configuration and logging around the dispatch engine.
//!
//! This crate provides:
//! - Layered configuration loading on `figment` ([`ConfigLoader`])
//! - Logging setup on `tracing-subscriber` ([`LoggingBuilder`])
//! - [`bootstrap`], which turns a provider and a [`ConduitConfig`] into a
//!   ready [`Mediator`]
//!
//! ```rust,ignore
//! use conduit_runtime::{bootstrap, config::load_config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config()?;
//!
//!     let mut registry = ServiceRegistry::new();
//!     registry.add_request_handler::<Ping, _>(PingHandler)?;
//!
//!     let mediator = bootstrap(registry, &config)?;
//!     mediator.send(Ping("hello".into())).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

use conduit_core::{Mediator, ServiceProvider};
use tracing::info;

// Re-exports
pub use config::{
    ConduitConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, MediatorSettings,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Validates `config`, installs logging, and builds a mediator over `provider`.
///
/// Logging is only installed if no global subscriber exists yet, so calling
/// this more than once (for example from tests) is harmless.
pub fn bootstrap(
    provider: impl ServiceProvider,
    config: &ConduitConfig,
) -> RuntimeResult<Mediator> {
    config::validate_config(config)?;
    logging::init_from_config(&config.logging);

    let mediator = Mediator::with_config(provider, config.mediator.to_core_config());
    info!(
        publish_strategy = ?config.mediator.publish_strategy,
        "Mediator ready"
    );
    Ok(mediator)
}

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::{PublishStrategy, ServiceRegistry};

    #[test]
    fn test_bootstrap_applies_mediator_settings() {
        let mut config = ConduitConfig::default();
        config.mediator.publish_strategy = PublishStrategy::Concurrent;

        let mediator = bootstrap(ServiceRegistry::new(), &config).unwrap();

        assert_eq!(
            mediator.config().publish_strategy,
            PublishStrategy::Concurrent
        );
        assert_eq!(mediator.cached_entries().total(), 0);
    }

    #[test]
    fn test_bootstrap_rejects_invalid_config() {
        let mut config = ConduitConfig::default();
        config.logging.max_files = 0;

        let err = bootstrap(ServiceRegistry::new(), &config).unwrap_err();
        assert!(matches!(err, RuntimeError::Config(ConfigError::ValidationError { .. })));
    }
}
