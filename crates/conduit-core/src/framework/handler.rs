//! Handler traits for the Conduit mediator.
//!
//! Each message kind has its own handler contract:
//!
//! | Message               | Handler                  | Cardinality |
//! |-----------------------|--------------------------|-------------|
//! | [`Request`]           | [`RequestHandler`]       | exactly one |
//! | [`Notification`]      | [`NotificationHandler`]  | zero or more|
//! | [`StreamRequest`]     | [`StreamHandler`]        | exactly one |
//!
//! Handlers receive the cancellation token of the current call and are
//! expected to check it at their own suspension points; the mediator never
//! aborts a handler forcibly.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use conduit_core::{DispatchResult, Request, RequestHandler};
//! use tokio_util::sync::CancellationToken;
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
//! ```

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::foundation::{DispatchResult, Notification, Request, StreamRequest};

/// The stream type produced by a [`StreamHandler`].
pub type ItemStream<T> = BoxStream<'static, DispatchResult<T>>;

/// Handles a single request type and produces its response.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Handles the request.
    async fn handle(&self, request: &R, cancel: &CancellationToken) -> DispatchResult<R::Response>;
}

/// Reacts to a published notification.
///
/// Failures are collected by the mediator and never prevent the other
/// handlers of the same notification from running.
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync + 'static {
    /// Handles the notification.
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> DispatchResult<()>;
}

/// Produces the item stream for a stream request.
///
/// `handle` is only called once the consumer starts polling, so
/// implementations may do their setup work eagerly inside it.
pub trait StreamHandler<S: StreamRequest>: Send + Sync + 'static {
    /// Creates the stream of items for `request`.
    ///
    /// `cancel` fires when either the creation-time or any consumption-time
    /// token is cancelled, or when the consumer drops the stream.
    fn handle(&self, request: S, cancel: CancellationToken) -> ItemStream<S::Item>;
}
