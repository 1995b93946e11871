//! Framework layer - handlers and the request pipeline.
//!
//! This module contains everything that runs while a message is handled:
//! - Handler traits for requests, notifications, and stream requests
//! - Pipeline behaviors and the [`Next`] continuation
//! - Built-in behaviors (pre/post processors, logging, timeout)

pub mod behavior;
pub mod handler;
pub mod pipeline;

pub use behavior::{
    LoggingBehavior, PostProcessorBehavior, PreProcessorBehavior, RequestPostProcessor,
    RequestPreProcessor, TimeoutBehavior,
};
pub use handler::{ItemStream, NotificationHandler, RequestHandler, StreamHandler};
pub use pipeline::{Next, PipelineBehavior};
