//! Type registry - the lookup capability the mediator depends on.
//!
//! The mediator treats discovery and construction of handlers as a black box
//! behind [`ServiceProvider`]: given a [`ServiceKey`], return zero, one, or
//! many instances. [`ServiceRegistry`] is the in-memory implementation
//! shipped with the crate.
//!
//! ```text
//! ┌──────────┐  ServiceKey   ┌─────────────────┐
//! │ Mediator │──────────────▶│ ServiceProvider │──▶ Arc<dyn RequestHandler<R>>
//! │          │◀──────────────│ (ServiceRegistry│──▶ Arc<dyn PipelineBehavior<R>> ...
//! └──────────┘  ServiceArc   │  or your own)   │──▶ MessageContract
//!                            └─────────────────┘
//! ```

pub mod collection;
pub mod contract;
pub mod key;
pub mod provider;

pub use collection::ServiceRegistry;
pub use contract::{MessageContract, MessageKind};
pub use key::{ServiceKey, ServiceRole};
pub use provider::{ServiceArc, ServiceProvider, downcast_service, erase_service};

pub(crate) use contract::ErasedMessage;
