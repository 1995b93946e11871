//! Error types for the Conduit dispatch engine.
//!
//! Two families live here:
//!
//! - [`DispatchError`] - everything that can go wrong while a message is in
//!   flight (resolution, handler failures, cancellation, aggregation).
//! - [`RegistryError`] - problems detected while handlers are being
//!   registered, before any dispatch happens.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Boxed error type produced by handlers and behaviors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors that can occur while dispatching a message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An untyped value does not satisfy the contract required by the call.
    #[error("invalid argument of type '{type_name}': {reason}")]
    InvalidArgument {
        /// Name of the offending type, when known.
        type_name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// No handler is registered for a request or stream request.
    #[error("no handler registered for '{message}'")]
    HandlerNotFound {
        /// The message type name.
        message: &'static str,
    },

    /// The operation observed a cancellation signal.
    #[error("operation cancelled")]
    Cancelled,

    /// A handler or behavior failed.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    /// A request did not complete within the configured limit.
    #[error("'{message}' timed out after {after:?}")]
    Timeout {
        /// The request type name.
        message: &'static str,
        /// The elapsed limit.
        after: Duration,
    },

    /// One or more notification handlers failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl DispatchError {
    /// Wraps an arbitrary error as a handler failure.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            type_name,
            reason: reason.into(),
        }
    }

    /// Creates a handler-not-found error for `T`.
    pub fn not_found<T: ?Sized>() -> Self {
        Self::HandlerNotFound {
            message: std::any::type_name::<T>(),
        }
    }

    /// Returns `true` if this error represents cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// =============================================================================
// Aggregate Errors
// =============================================================================

/// The collected failures of a single `publish` call.
///
/// Failures are kept in the order the handlers were invoked. The aggregate is
/// only ever constructed with at least one failure.
#[derive(Debug)]
pub struct AggregateError {
    notification: &'static str,
    errors: Vec<DispatchError>,
}

impl AggregateError {
    pub(crate) fn new(notification: &'static str, errors: Vec<DispatchError>) -> Self {
        Self {
            notification,
            errors,
        }
    }

    /// Name of the notification type that was being published.
    pub fn notification(&self) -> &'static str {
        self.notification
    }

    /// The individual handler failures, in invocation order.
    pub fn errors(&self) -> &[DispatchError] {
        &self.errors
    }

    /// Number of failed handlers.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always `false` for aggregates produced by the mediator.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the aggregate, returning the individual failures.
    pub fn into_errors(self) -> Vec<DispatchError> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} handler(s) failed for '{}'",
            self.errors.len(),
            self.notification
        )?;
        for (i, err) in self.errors.iter().enumerate() {
            write!(f, "; [{i}] {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised while registering services.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A second handler was registered for a single-handler contract.
    #[error("a handler for '{message}' is already registered")]
    DuplicateHandler {
        /// The message type name.
        message: &'static str,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_display_lists_failures() {
        let agg = AggregateError::new(
            "Pinged",
            vec![DispatchError::Cancelled, DispatchError::handler("boom")],
        );
        let text = agg.to_string();
        assert!(text.starts_with("2 handler(s) failed for 'Pinged'"));
        assert!(text.contains("[0] operation cancelled"));
        assert!(text.contains("[1] handler failed: boom"));
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let io = std::io::Error::other("disk gone");
        let err = DispatchError::handler(io);
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk gone"));
    }
}
