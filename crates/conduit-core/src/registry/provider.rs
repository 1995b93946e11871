//! The type registry contract consumed by the mediator.

use std::any::Any;
use std::sync::Arc;

use super::key::ServiceKey;

/// Type alias for the heterogeneous values handed out by a provider.
///
/// The inner `dyn Any` is actually an `Arc<dyn SomeTrait>` (for example
/// `Arc<dyn RequestHandler<Ping>>`) upcast to `Any`. Consumers downcast it
/// back with [`downcast_service`].
pub type ServiceArc = Arc<dyn Any + Send + Sync>;

/// Lookup-by-type capability the mediator depends on.
///
/// The mediator never constructs handlers or behaviors itself; it asks a
/// provider for them by [`ServiceKey`]. How instances are discovered, built,
/// and scoped is entirely up to the implementation.
///
/// Implementations must keep the answer for a key stable for as long as a
/// [`Mediator`](crate::Mediator) uses them: the mediator caches what it
/// resolves and never asks again.
pub trait ServiceProvider: Send + Sync + 'static {
    /// Returns the single instance registered under `key`, if any.
    ///
    /// Used for single-handler contracts. Providers are responsible for
    /// rejecting a second registration for such keys.
    fn resolve_one(&self, key: &ServiceKey) -> Option<ServiceArc>;

    /// Returns every instance registered under `key`, in registration order.
    fn resolve_many(&self, key: &ServiceKey) -> Vec<ServiceArc>;
}

impl<P: ServiceProvider + ?Sized> ServiceProvider for Arc<P> {
    fn resolve_one(&self, key: &ServiceKey) -> Option<ServiceArc> {
        (**self).resolve_one(key)
    }

    fn resolve_many(&self, key: &ServiceKey) -> Vec<ServiceArc> {
        (**self).resolve_many(key)
    }
}

/// Recovers a typed service from a [`ServiceArc`].
///
/// `T` is usually a trait object such as `dyn RequestHandler<Ping>`; the
/// stored value must be an `Arc<T>`.
pub fn downcast_service<T: ?Sized + 'static>(service: &ServiceArc) -> Option<Arc<T>> {
    service.downcast_ref::<Arc<T>>().map(Arc::clone)
}

/// Erases a typed service into a [`ServiceArc`].
pub fn erase_service<T: ?Sized + Send + Sync + 'static>(service: Arc<T>) -> ServiceArc {
    Arc::new(service)
}
