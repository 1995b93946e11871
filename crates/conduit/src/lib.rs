//! # Conduit
//!
//! A typed, in-process mediator.
//!
//! ## Overview
//!
//! Callers hand a message to the [`Mediator`](core::Mediator) and never
//! reference the code that handles it:
//!
//! - **Requests** reach exactly one handler and return its response
//! - **Notifications** reach every registered handler; failures are aggregated
//! - **Stream requests** return a lazy, cancellable stream of results
//! - **Pipeline behaviors** wrap request handling in registration order
//!
//! ```text
//! ┌────────┐     ┌──────────┐     ┌────┐   ┌────┐   ┌─────────┐
//! │ caller │────▶│ Mediator │────▶│ B1 │──▶│ B2 │──▶│ Handler │
//! └────────┘     └──────────┘     └────┘   └────┘   └─────────┘
//!                     │
//!                     └──▶ NotificationHandler × N
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conduit::prelude::*;
//!
//! struct Ping(String);
//!
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl RequestHandler<Ping> for PingHandler {
//!     async fn handle(&self, request: &Ping, _cancel: &CancellationToken) -> DispatchResult<String> {
//!         Ok(format!("pong: {}", request.0))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = ServiceRegistry::new();
//!     registry.add_request_handler::<Ping, _>(PingHandler)?;
//!
//!     let mediator = bootstrap(registry, &load_config()?)?;
//!     println!("{}", mediator.send(Ping("hello".into())).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: `conduit.toml` configuration files (default)
//! - `yaml-config`: `conduit.yaml` configuration files
//! - `json-log`: JSON log output

pub use conduit_core as core;
pub use conduit_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use conduit::prelude::*;
/// ```
pub mod prelude {
    // Message contracts, handlers, and dispatch
    pub use conduit_core::prelude::*;

    // Errors
    pub use conduit_core::{AggregateError, RegistryError};

    // Tuning
    pub use conduit_core::{MediatorConfig, PublishStrategy};

    // Runtime - configuration and bootstrap
    pub use conduit_runtime::config::load_config;
    pub use conduit_runtime::{ConduitConfig, ConfigLoader, bootstrap};
}
