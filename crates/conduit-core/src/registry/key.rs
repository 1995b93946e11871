//! Keys identifying services in a [`ServiceProvider`](super::ServiceProvider).

use std::any::TypeId;

use crate::foundation::{Notification, Request, StreamRequest};

/// The role a service plays for a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    /// The single [`RequestHandler`](crate::RequestHandler) of a request type.
    RequestHandler,
    /// An ordered [`PipelineBehavior`](crate::PipelineBehavior) of a request type.
    PipelineBehavior,
    /// A [`NotificationHandler`](crate::NotificationHandler) of a notification type.
    NotificationHandler,
    /// The single [`StreamHandler`](crate::StreamHandler) of a stream request type.
    StreamHandler,
    /// A [`MessageContract`](super::MessageContract) describing what a type is.
    Contract,
}

/// Identifies a set of services: a message type paired with a role.
///
/// `ServiceKey::request_handler::<Ping>()` plays the part of the closed
/// generic `RequestHandler<Ping>` type in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    message: TypeId,
    role: ServiceRole,
}

impl ServiceKey {
    /// Creates a key from a raw type identity and role.
    pub fn new(message: TypeId, role: ServiceRole) -> Self {
        Self { message, role }
    }

    /// Key of the handler for request `R`.
    pub fn request_handler<R: Request>() -> Self {
        Self::new(TypeId::of::<R>(), ServiceRole::RequestHandler)
    }

    /// Key of the behaviors for request `R`.
    pub fn pipeline_behavior<R: Request>() -> Self {
        Self::new(TypeId::of::<R>(), ServiceRole::PipelineBehavior)
    }

    /// Key of the handlers for notification `N`.
    pub fn notification_handler<N: Notification>() -> Self {
        Self::new(TypeId::of::<N>(), ServiceRole::NotificationHandler)
    }

    /// Key of the handler for stream request `S`.
    pub fn stream_handler<S: StreamRequest>() -> Self {
        Self::new(TypeId::of::<S>(), ServiceRole::StreamHandler)
    }

    /// Key of the contracts recorded for the type with identity `message`.
    pub fn contract(message: TypeId) -> Self {
        Self::new(message, ServiceRole::Contract)
    }

    /// Returns the message type identity.
    pub fn message(&self) -> TypeId {
        self.message
    }

    /// Returns the role.
    pub fn role(&self) -> ServiceRole {
        self.role
    }
}
