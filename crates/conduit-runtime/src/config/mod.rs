//! Configuration module for the Conduit runtime.
//!
//! Layered loading (defaults, files, `CONDUIT_*` environment variables) and
//! validation of mediator and logging settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ConduitConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, MediatorSettings,
    SpanEventConfig,
};
pub use validation::validate_config;
