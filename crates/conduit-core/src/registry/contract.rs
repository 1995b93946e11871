//! Message contracts: runtime answers to "what kind of message is this type?"
//!
//! Rust has no way to ask an opaque value which traits it implements, so the
//! registry records a [`MessageContract`] for every request and notification
//! type it learns about. Each contract carries a constructor for a small
//! erased shim that knows the concrete type and forwards untyped dispatch to
//! the typed mediator entry points.

use std::any::{TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::foundation::{
    AnyMessage, AnyResponse, DispatchError, DispatchResult, Notification, Request, Unit,
};
use crate::mediator::Mediator;

/// Which dispatch contract a message type satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// The type implements [`Request`].
    Request,
    /// The type implements [`Notification`].
    Notification,
}

/// A recorded fact that some type is a request or a notification.
#[derive(Clone, Copy)]
pub struct MessageContract {
    kind: MessageKind,
    type_id: TypeId,
    type_name: &'static str,
    bind: fn() -> Arc<dyn ErasedMessage>,
}

impl MessageContract {
    /// Contract for request type `R`.
    pub fn request<R: Request>() -> Self {
        Self {
            kind: MessageKind::Request,
            type_id: TypeId::of::<R>(),
            type_name: type_name::<R>(),
            bind: bind_request::<R>,
        }
    }

    /// Contract for notification type `N`.
    pub fn notification<N: Notification>() -> Self {
        Self {
            kind: MessageKind::Notification,
            type_id: TypeId::of::<N>(),
            type_name: type_name::<N>(),
            bind: bind_notification::<N>,
        }
    }

    /// Returns the contract kind.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns the type identity of the message type.
    pub fn message_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the name of the message type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn bind(&self) -> Arc<dyn ErasedMessage> {
        (self.bind)()
    }
}

impl fmt::Debug for MessageContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageContract")
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .finish()
    }
}

// ============================================================================
// Erased Shims
// ============================================================================

/// Forwards an [`AnyMessage`] to the typed mediator API for one concrete type.
pub(crate) trait ErasedMessage: Send + Sync {
    fn dispatch<'a>(
        &'a self,
        mediator: &'a Mediator,
        message: AnyMessage,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>>;
}

fn bind_request<R: Request>() -> Arc<dyn ErasedMessage> {
    Arc::new(RequestShim::<R>(PhantomData))
}

fn bind_notification<N: Notification>() -> Arc<dyn ErasedMessage> {
    Arc::new(NotificationShim::<N>(PhantomData))
}

struct RequestShim<R>(PhantomData<fn(R)>);

impl<R: Request> ErasedMessage for RequestShim<R> {
    fn dispatch<'a>(
        &'a self,
        mediator: &'a Mediator,
        message: AnyMessage,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
        async move {
            let request = downcast_message::<R>(message)?;
            mediator
                .send_with(request, cancel)
                .await
                .map(AnyResponse::new)
        }
        .boxed()
    }
}

struct NotificationShim<N>(PhantomData<fn(N)>);

impl<N: Notification> ErasedMessage for NotificationShim<N> {
    fn dispatch<'a>(
        &'a self,
        mediator: &'a Mediator,
        message: AnyMessage,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
        async move {
            let notification = downcast_message::<N>(message)?;
            mediator.publish_with(notification, cancel).await?;
            Ok(AnyResponse::new(Unit))
        }
        .boxed()
    }
}

fn downcast_message<T: Send + Sync + 'static>(message: AnyMessage) -> DispatchResult<T> {
    message.downcast::<T>().map_err(|message| {
        DispatchError::invalid_argument(
            message.type_name(),
            format!("expected a value of type '{}'", type_name::<T>()),
        )
    })
}
