//! Foundation layer - message contracts and error types.
//!
//! This module contains the vocabulary every other layer speaks:
//! - Message traits ([`Request`], [`Notification`], [`StreamRequest`])
//! - The [`Unit`] sentinel and the type-erased [`AnyMessage`] / [`AnyResponse`]
//! - Dispatch and registry errors

pub mod error;
pub mod message;

pub use error::{
    AggregateError, BoxError, DispatchError, DispatchResult, RegistryError, RegistryResult,
};
pub use message::{AnyMessage, AnyResponse, Notification, Request, StreamRequest, Unit};
