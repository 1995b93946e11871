//! Message contracts for the Conduit mediator.
//!
//! This module provides the three kinds of message the mediator routes:
//!
//! - [`Request`] - handled by exactly one handler, produces a response
//! - [`Notification`] - broadcast to zero or more handlers
//! - [`StreamRequest`] - handled by exactly one handler, produces a lazy stream
//!
//! plus the [`Unit`] sentinel used as the response of requests that have
//! nothing meaningful to return, and the type-erased [`AnyMessage`] /
//! [`AnyResponse`] pair used by untyped dispatch.
//!
//! # Example
//!
//! ```rust,ignore
//! use conduit_core::{Request, Notification, Unit};
//!
//! struct Ping { payload: String }
//!
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! struct Shutdown;
//!
//! impl Request for Shutdown {
//!     type Response = Unit;
//! }
//!
//! struct Pinged { at: u64 }
//!
//! impl Notification for Pinged {}
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;

// ============================================================================
// Message Traits
// ============================================================================

/// A message handled by exactly one [`RequestHandler`](crate::RequestHandler).
///
/// The associated [`Response`](Request::Response) type ties the request to its
/// handler contract. Requests without a meaningful answer use [`Unit`].
pub trait Request: Send + Sync + 'static {
    /// The value produced by the handler.
    type Response: Send + 'static;
}

/// A message broadcast to every registered
/// [`NotificationHandler`](crate::NotificationHandler).
///
/// Having no handler at all is valid; publishing is then a no-op.
pub trait Notification: Send + Sync + 'static {}

/// A message whose single handler produces a lazy sequence of items.
pub trait StreamRequest: Send + Sync + 'static {
    /// The element type of the produced stream.
    type Item: Send + 'static;
}

// ============================================================================
// Unit
// ============================================================================

/// The "no meaningful response" value.
///
/// `Unit` lets requests with and without a response share one dispatch shape.
/// It is always equal to itself and, unlike an empty result, survives untyped
/// dispatch as a real value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unit;

impl Unit {
    /// The single `Unit` value.
    pub const VALUE: Unit = Unit;
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("()")
    }
}

impl From<()> for Unit {
    fn from(_: ()) -> Self {
        Unit
    }
}

// ============================================================================
// AnyMessage
// ============================================================================

/// A message whose static type is unknown at the dispatch site.
///
/// The mediator inspects the runtime type identity to find out whether the
/// value is a request or a notification; see
/// [`Mediator::send_any`](crate::Mediator::send_any).
pub struct AnyMessage {
    value: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl AnyMessage {
    /// Erases a concrete value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Wraps a value that is already boxed.
    ///
    /// The concrete type name is not recoverable from a box, so diagnostics
    /// report it as `"<erased>"`.
    pub fn from_boxed(value: Box<dyn Any + Send + Sync>) -> Self {
        // Deref first: `value.type_id()` would name the box, not its contents.
        let type_id = (*value).type_id();
        Self {
            value,
            type_id,
            type_name: "<erased>",
        }
    }

    /// Returns the runtime type identity of the wrapped value.
    pub fn value_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the name of the wrapped type, if it was known when erased.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Attempts to take the value as `T`, handing the message back on mismatch.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let Self {
            value,
            type_id,
            type_name,
        } = self;
        value.downcast::<T>().map(|v| *v).map_err(|value| Self {
            value,
            type_id,
            type_name,
        })
    }
}

impl fmt::Debug for AnyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyMessage")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// AnyResponse
// ============================================================================

/// A type-erased response returned by untyped dispatch.
///
/// Keeps the concrete type name around so callers can log or inspect what
/// came back without knowing the type statically.
pub struct AnyResponse {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl AnyResponse {
    /// Wraps a concrete response value.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the name of the concrete response type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the response is of type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Returns `true` if the response is the [`Unit`] value.
    pub fn is_unit(&self) -> bool {
        self.is::<Unit>()
    }

    /// Attempts to borrow the response as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Attempts to take the response as `T`, handing it back on mismatch.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        self.value
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|value| Self { value, type_name })
    }

    /// Returns the inner boxed value.
    pub fn into_inner(self) -> Box<dyn Any + Send> {
        self.value
    }
}

impl fmt::Debug for AnyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyResponse")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
