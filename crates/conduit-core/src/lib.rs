//! # Conduit Core
//!
//! The dispatch engine of the Conduit in-process mediator.
//!
//! A [`Mediator`] routes three kinds of message:
//!
//! - a [`Request`] goes to exactly one [`RequestHandler`], wrapped by an
//!   ordered chain of [`PipelineBehavior`]s, and yields a response;
//! - a [`Notification`] goes to every registered [`NotificationHandler`];
//! - a [`StreamRequest`] goes to one [`StreamHandler`] and yields a lazy
//!   [`ResponseStream`].
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Message Contracts**: [`Request`], [`Notification`], [`StreamRequest`], [`Unit`]
//! - **Type Erasure**: [`AnyMessage`], [`AnyResponse`]
//! - **Errors**: [`DispatchError`], [`AggregateError`], [`RegistryError`]
//!
//! ### Framework Layer
//!
//! - **Handlers**: [`RequestHandler`], [`NotificationHandler`], [`StreamHandler`]
//! - **Pipeline**: [`PipelineBehavior`] and the [`Next`] continuation
//! - **Built-in Behaviors**: pre/post processors, [`LoggingBehavior`], [`TimeoutBehavior`]
//!
//! ### Registry Layer
//!
//! - **Lookup Contract**: [`ServiceProvider`] keyed by [`ServiceKey`]
//! - **In-memory Registry**: [`ServiceRegistry`]
//! - **Message Contracts**: [`MessageContract`] records backing untyped dispatch
//!
//! ### Mediator Layer
//!
//! - **Dispatch**: [`Mediator`] with per-kind resolution caches
//! - **Tuning**: [`MediatorConfig`], [`PublishStrategy`]
//!
//! ```text
//! ┌────────┐     ┌──────────┐     ┌─────────────────┐
//! │ caller │────▶│ Mediator │────▶│ ServiceProvider │  (first use only)
//! └────────┘     │  caches  │     └─────────────────┘
//!                │          │────▶ B1 ─▶ B2 ─▶ Handler
//!                └──────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use conduit_core::prelude::*;
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
//!     registry
//!         .add_request_handler::<Ping, _>(PingHandler)?
//!         .add_behavior::<Ping, _>(LoggingBehavior::new());
//!
//!     let mediator = Mediator::new(registry);
//!     assert_eq!(mediator.send(Ping("hi".into())).await?, "pong: hi");
//!     Ok(())
//! }
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;
pub mod mediator;
pub mod registry;

pub use framework::behavior;

// Re-export foundation types
pub use foundation::{
    AggregateError, AnyMessage, AnyResponse, BoxError, DispatchError, DispatchResult,
    Notification, RegistryError, RegistryResult, Request, StreamRequest, Unit,
};

// Re-export framework types
pub use framework::{
    ItemStream, LoggingBehavior, Next, NotificationHandler, PipelineBehavior,
    PostProcessorBehavior, PreProcessorBehavior, RequestHandler, RequestPostProcessor,
    RequestPreProcessor, StreamHandler, TimeoutBehavior,
};

// Re-export registry types
pub use registry::{
    MessageContract, MessageKind, ServiceArc, ServiceKey, ServiceProvider, ServiceRegistry,
    ServiceRole, downcast_service, erase_service,
};

// Re-export mediator types
pub use mediator::{CacheStats, Mediator, MediatorConfig, PublishStrategy, ResponseStream};

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;

/// Everything needed to declare messages, write handlers, and dispatch.
pub mod prelude {
    pub use crate::{
        AnyMessage, AnyResponse, CancellationToken, DispatchError, DispatchResult, ItemStream,
        LoggingBehavior, Mediator, Next, Notification, NotificationHandler, PipelineBehavior,
        Request, RequestHandler, RequestPostProcessor, RequestPreProcessor, ResponseStream,
        ServiceRegistry, StreamHandler, StreamRequest, TimeoutBehavior, Unit, async_trait,
    };
}
