//! In-memory [`ServiceProvider`] implementation.

use std::any::type_name;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::debug;

use super::contract::MessageContract;
use super::key::ServiceKey;
use super::provider::{ServiceArc, ServiceProvider, downcast_service, erase_service};
use crate::foundation::{Notification, RegistryError, RegistryResult, Request, StreamRequest};
use crate::framework::{
    NotificationHandler, PipelineBehavior, PostProcessorBehavior, PreProcessorBehavior,
    RequestHandler, RequestPostProcessor, RequestPreProcessor, StreamHandler,
};

/// A simple registry holding pre-built service instances.
///
/// Instances are stored once and shared by every dispatch. Registration order
/// is preserved for multi-instance roles (behaviors, notification handlers).
/// Single-handler roles reject a second registration with
/// [`RegistryError::DuplicateHandler`].
///
/// Registering any handler or behavior also records the matching
/// [`MessageContract`], which is what lets untyped dispatch recognise the
/// message type.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = ServiceRegistry::new();
/// registry
///     .add_request_handler::<Ping, _>(PingHandler)?
///     .add_behavior::<Ping, _>(LoggingBehavior::new())
///     .add_notification_handler::<Pinged, _>(AuditTrail::default());
///
/// let mediator = Mediator::new(registry);
/// ```
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<ServiceKey, Vec<ServiceArc>>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Registers the handler for request `R`.
    pub fn add_request_handler<R, H>(&mut self, handler: H) -> RegistryResult<&mut Self>
    where
        R: Request,
        H: RequestHandler<R>,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.insert_single::<R>(ServiceKey::request_handler::<R>(), erase_service(handler))?;
        self.record_contract(MessageContract::request::<R>());
        Ok(self)
    }

    /// Appends a pipeline behavior for request `R`.
    pub fn add_behavior<R, B>(&mut self, behavior: B) -> &mut Self
    where
        R: Request,
        B: PipelineBehavior<R>,
    {
        let behavior: Arc<dyn PipelineBehavior<R>> = Arc::new(behavior);
        self.push(ServiceKey::pipeline_behavior::<R>(), erase_service(behavior));
        self.record_contract(MessageContract::request::<R>());
        self
    }

    /// Appends a pre-processor for request `R` as a pipeline stage.
    pub fn add_pre_processor<R, P>(&mut self, processor: P) -> &mut Self
    where
        R: Request,
        P: RequestPreProcessor<R>,
    {
        self.add_behavior::<R, _>(PreProcessorBehavior::new(processor))
    }

    /// Appends a post-processor for request `R` as a pipeline stage.
    pub fn add_post_processor<R, P>(&mut self, processor: P) -> &mut Self
    where
        R: Request,
        R::Response: Sync,
        P: RequestPostProcessor<R>,
    {
        self.add_behavior::<R, _>(PostProcessorBehavior::new(processor))
    }

    /// Appends a handler for notification `N`.
    pub fn add_notification_handler<N, H>(&mut self, handler: H) -> &mut Self
    where
        N: Notification,
        H: NotificationHandler<N>,
    {
        let handler: Arc<dyn NotificationHandler<N>> = Arc::new(handler);
        self.push(ServiceKey::notification_handler::<N>(), erase_service(handler));
        self.record_contract(MessageContract::notification::<N>());
        self
    }

    /// Registers the handler for stream request `S`.
    pub fn add_stream_handler<S, H>(&mut self, handler: H) -> RegistryResult<&mut Self>
    where
        S: StreamRequest,
        H: StreamHandler<S>,
    {
        let handler: Arc<dyn StreamHandler<S>> = Arc::new(handler);
        self.insert_single::<S>(ServiceKey::stream_handler::<S>(), erase_service(handler))?;
        Ok(self)
    }

    /// Records that `R` is a request without registering anything for it.
    ///
    /// Untyped dispatch of such a value then fails with
    /// [`HandlerNotFound`](crate::DispatchError::HandlerNotFound) rather than
    /// [`InvalidArgument`](crate::DispatchError::InvalidArgument).
    pub fn declare_request<R: Request>(&mut self) -> &mut Self {
        self.record_contract(MessageContract::request::<R>());
        self
    }

    /// Records that `N` is a notification without registering a handler.
    pub fn declare_notification<N: Notification>(&mut self) -> &mut Self {
        self.record_contract(MessageContract::notification::<N>());
        self
    }

    /// Returns `true` if at least one service is registered under `key`.
    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.services.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Returns the number of registered keys.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    fn insert_single<M: 'static>(
        &mut self,
        key: ServiceKey,
        service: ServiceArc,
    ) -> RegistryResult<()> {
        match self.services.entry(key) {
            Entry::Occupied(e) if !e.get().is_empty() => Err(RegistryError::DuplicateHandler {
                message: type_name::<M>(),
            }),
            entry => {
                entry.or_default().push(service);
                debug!(message = type_name::<M>(), role = ?key.role(), "Registered handler");
                Ok(())
            }
        }
    }

    fn push(&mut self, key: ServiceKey, service: ServiceArc) {
        self.services.entry(key).or_default().push(service);
    }

    fn record_contract(&mut self, contract: MessageContract) {
        let key = ServiceKey::contract(contract.message_type_id());
        let existing = self.services.entry(key).or_default();
        let known = existing
            .iter()
            .filter_map(downcast_service::<MessageContract>)
            .any(|c| c.kind() == contract.kind());
        if !known {
            existing.push(erase_service(Arc::new(contract)));
        }
    }
}

impl ServiceProvider for ServiceRegistry {
    fn resolve_one(&self, key: &ServiceKey) -> Option<ServiceArc> {
        self.services.get(key).and_then(|v| v.first()).cloned()
    }

    fn resolve_many(&self, key: &ServiceKey) -> Vec<ServiceArc> {
        self.services.get(key).cloned().unwrap_or_default()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("key_count", &self.services.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{DispatchResult, Unit};
    use crate::framework::{ItemStream, Next};
    use crate::registry::MessageKind;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct Ping;

    impl Request for Ping {
        type Response = Unit;
    }

    impl Notification for Ping {}

    struct Ticks;

    impl StreamRequest for Ticks {
        type Item = u32;
    }

    struct PingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(&self, _request: &Ping, _cancel: &CancellationToken) -> DispatchResult<Unit> {
            Ok(Unit)
        }
    }

    #[async_trait]
    impl NotificationHandler<Ping> for PingHandler {
        async fn handle(&self, _notification: &Ping, _cancel: &CancellationToken) -> DispatchResult<()> {
            Ok(())
        }
    }

    struct Passthrough;

    #[async_trait]
    impl PipelineBehavior<Ping> for Passthrough {
        async fn handle(
            &self,
            _request: &Ping,
            next: Next<'_, Unit>,
            _cancel: &CancellationToken,
        ) -> DispatchResult<Unit> {
            next.run().await
        }
    }

    struct TickHandler;

    impl StreamHandler<Ticks> for TickHandler {
        fn handle(&self, _request: Ticks, _cancel: CancellationToken) -> ItemStream<u32> {
            Box::pin(futures::stream::iter([Ok(1)]))
        }
    }

    fn contracts(registry: &ServiceRegistry) -> Vec<MessageKind> {
        registry
            .resolve_many(&ServiceKey::contract(std::any::TypeId::of::<Ping>()))
            .iter()
            .filter_map(downcast_service::<MessageContract>)
            .map(|c| c.kind())
            .collect()
    }

    #[test]
    fn test_second_request_handler_is_rejected() {
        let mut registry = ServiceRegistry::new();
        registry.add_request_handler::<Ping, _>(PingHandler).unwrap();

        let err = registry
            .add_request_handler::<Ping, _>(PingHandler)
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateHandler { .. }));
        assert_eq!(
            registry
                .resolve_many(&ServiceKey::request_handler::<Ping>())
                .len(),
            1
        );
    }

    #[test]
    fn test_second_stream_handler_is_rejected() {
        let mut registry = ServiceRegistry::new();
        registry.add_stream_handler::<Ticks, _>(TickHandler).unwrap();
        assert!(registry.add_stream_handler::<Ticks, _>(TickHandler).is_err());
    }

    #[test]
    fn test_behaviors_keep_registration_order() {
        let mut registry = ServiceRegistry::new();
        let first: Arc<dyn PipelineBehavior<Ping>> = Arc::new(Passthrough);
        registry.push(ServiceKey::pipeline_behavior::<Ping>(), erase_service(first.clone()));
        registry.add_behavior::<Ping, _>(Passthrough);

        let resolved = registry.resolve_many(&ServiceKey::pipeline_behavior::<Ping>());
        assert_eq!(resolved.len(), 2);
        let head = downcast_service::<dyn PipelineBehavior<Ping>>(&resolved[0]).unwrap();
        assert!(Arc::ptr_eq(&head, &first));
    }

    #[test]
    fn test_contracts_recorded_once_per_kind() {
        let mut registry = ServiceRegistry::new();
        registry.add_request_handler::<Ping, _>(PingHandler).unwrap();
        registry.add_behavior::<Ping, _>(Passthrough);
        registry.declare_request::<Ping>();
        assert_eq!(contracts(&registry), vec![MessageKind::Request]);

        registry.add_notification_handler::<Ping, _>(PingHandler);
        registry.add_notification_handler::<Ping, _>(PingHandler);
        assert_eq!(
            contracts(&registry),
            vec![MessageKind::Request, MessageKind::Notification]
        );
    }

    #[test]
    fn test_resolve_unknown_key_is_empty() {
        let registry = ServiceRegistry::new();
        assert!(registry.is_empty());
        assert!(
            registry
                .resolve_one(&ServiceKey::request_handler::<Ping>())
                .is_none()
        );
        assert!(
            registry
                .resolve_many(&ServiceKey::notification_handler::<Ping>())
                .is_empty()
        );
    }
}
