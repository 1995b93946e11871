//! The dispatch engine.
//!
//! [`Mediator`] is the entry point for every kind of message. It owns one
//! resolution cache per message kind and asks its [`ServiceProvider`] for
//! handlers only on the first dispatch of each concrete type:
//!
//! ```text
//! send::<R>() ──▶ request cache ──miss──▶ provider ──▶ RequestPipeline<R>
//!                      │hit                                   │
//!                      └───────────────▶ B1 ─▶ B2 ─▶ Handler ◀┘
//! ```
//!
//! Cloning a `Mediator` is cheap and shares the caches.

mod cache;
mod dynamic;
mod notification;
mod request;
mod stream;

pub use stream::ResponseStream;

use std::any::{TypeId, type_name};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, span};

use self::cache::ResolutionCache;
use self::dynamic::DynamicBinding;
use self::notification::NotificationFanOut;
use self::request::RequestPipeline;
use self::stream::StreamBinding;
use crate::foundation::{
    AnyMessage, AnyResponse, DispatchResult, Notification, Request, StreamRequest,
};
use crate::registry::ServiceProvider;

// ============================================================================
// Configuration
// ============================================================================

/// How `publish` drives the handlers of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStrategy {
    /// One handler after another, in registration order.
    #[default]
    Sequential,
    /// All handlers started together; failures are still reported in
    /// registration order.
    Concurrent,
}

/// Tunables of a [`Mediator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Strategy used by [`Mediator::publish`].
    pub publish_strategy: PublishStrategy,
}

impl MediatorConfig {
    /// Sets the publish strategy.
    pub fn with_publish_strategy(mut self, strategy: PublishStrategy) -> Self {
        self.publish_strategy = strategy;
        self
    }
}

/// Number of prepared wrappers held by each resolution cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Resolved request pipelines.
    pub requests: usize,
    /// Resolved notification handler sets.
    pub notifications: usize,
    /// Resolved stream handlers.
    pub streams: usize,
    /// Contract lookups for untyped dispatch.
    pub dynamic: usize,
}

impl CacheStats {
    /// Total number of cached entries.
    pub fn total(&self) -> usize {
        self.requests + self.notifications + self.streams + self.dynamic
    }
}

// ============================================================================
// Mediator
// ============================================================================

/// Routes requests, notifications, and stream requests to their handlers.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = ServiceRegistry::new();
/// registry.add_request_handler::<Ping, _>(PingHandler)?;
///
/// let mediator = Mediator::new(registry);
/// let pong = mediator.send(Ping("hello".into())).await?;
/// ```
///
/// # Thread Safety
///
/// `Mediator` is `Send + Sync`; clones share the provider and caches.
#[derive(Clone)]
pub struct Mediator {
    inner: Arc<MediatorInner>,
}

struct MediatorInner {
    provider: Arc<dyn ServiceProvider>,
    config: MediatorConfig,
    requests: ResolutionCache,
    notifications: ResolutionCache,
    streams: ResolutionCache,
    dynamic: ResolutionCache,
}

impl Mediator {
    /// Creates a mediator with the default configuration.
    pub fn new(provider: impl ServiceProvider) -> Self {
        Self::with_config(provider, MediatorConfig::default())
    }

    /// Creates a mediator with an explicit configuration.
    pub fn with_config(provider: impl ServiceProvider, config: MediatorConfig) -> Self {
        Self {
            inner: Arc::new(MediatorInner {
                provider: Arc::new(provider),
                config,
                requests: ResolutionCache::new("request"),
                notifications: ResolutionCache::new("notification"),
                streams: ResolutionCache::new("stream"),
                dynamic: ResolutionCache::new("dynamic"),
            }),
        }
    }

    /// Returns the configuration this mediator was built with.
    pub fn config(&self) -> &MediatorConfig {
        &self.inner.config
    }

    /// Reports how many wrappers each cache holds.
    pub fn cached_entries(&self) -> CacheStats {
        CacheStats {
            requests: self.inner.requests.len(),
            notifications: self.inner.notifications.len(),
            streams: self.inner.streams.len(),
            dynamic: self.inner.dynamic.len(),
        }
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Sends a request to its single handler through the pipeline.
    ///
    /// # Errors
    ///
    /// [`HandlerNotFound`](crate::DispatchError::HandlerNotFound) when no
    /// handler is registered; otherwise whatever the first failing behavior
    /// or the handler returned.
    pub async fn send<R: Request>(&self, request: R) -> DispatchResult<R::Response> {
        self.send_with(request, CancellationToken::new()).await
    }

    /// Like [`send`](Self::send), observing `cancel`.
    pub async fn send_with<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        let span = span!(Level::DEBUG, "send", request = type_name::<R>());
        async move {
            let pipeline = self.inner.requests.get_or_try_insert(TypeId::of::<R>(), || {
                RequestPipeline::<R>::resolve(self.inner.provider.as_ref())
            })?;
            pipeline.invoke(&request, &cancel).await
        }
        .instrument(span)
        .await
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    /// Publishes a notification to every registered handler.
    ///
    /// Having no handler is not an error. All handlers run even if some fail;
    /// failures come back together as
    /// [`Aggregate`](crate::DispatchError::Aggregate).
    pub async fn publish<N: Notification>(&self, notification: N) -> DispatchResult<()> {
        self.publish_with(notification, CancellationToken::new())
            .await
    }

    /// Like [`publish`](Self::publish), observing `cancel`.
    pub async fn publish_with<N: Notification>(
        &self,
        notification: N,
        cancel: CancellationToken,
    ) -> DispatchResult<()> {
        let span = span!(Level::DEBUG, "publish", notification = type_name::<N>());
        async move {
            let fan_out = self
                .inner
                .notifications
                .get_or_try_insert(TypeId::of::<N>(), || {
                    NotificationFanOut::<N>::resolve(self.inner.provider.as_ref())
                })?;
            fan_out
                .invoke(&notification, &cancel, self.inner.config.publish_strategy)
                .await
        }
        .instrument(span)
        .await
    }

    // ------------------------------------------------------------------------
    // Streams
    // ------------------------------------------------------------------------

    /// Opens the stream produced by the handler of `request`.
    ///
    /// The handler is resolved now but not invoked until the stream is first
    /// polled.
    pub async fn create_stream<S: StreamRequest>(
        &self,
        request: S,
    ) -> DispatchResult<ResponseStream<S::Item>> {
        self.create_stream_with(request, CancellationToken::new())
            .await
    }

    /// Like [`create_stream`](Self::create_stream); the producer observes
    /// `cancel` and the stream ends when it fires.
    pub async fn create_stream_with<S: StreamRequest>(
        &self,
        request: S,
        cancel: CancellationToken,
    ) -> DispatchResult<ResponseStream<S::Item>> {
        let span = span!(Level::DEBUG, "create_stream", request = type_name::<S>());
        let binding = span.in_scope(|| {
            self.inner.streams.get_or_try_insert(TypeId::of::<S>(), || {
                StreamBinding::<S>::resolve(self.inner.provider.as_ref())
            })
        })?;
        Ok(binding.open(request, cancel))
    }

    // ------------------------------------------------------------------------
    // Untyped dispatch
    // ------------------------------------------------------------------------

    /// Sends a request whose static type is unknown.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`](crate::DispatchError::InvalidArgument) when the
    /// value's type has no recorded request contract; otherwise the same
    /// errors as [`send`](Self::send).
    ///
    /// Contracts are recorded when handlers or behaviors are registered, so a
    /// request type the provider has never seen is reported as
    /// `InvalidArgument` here where [`send`](Self::send) would report
    /// [`HandlerNotFound`](crate::DispatchError::HandlerNotFound). Use
    /// [`ServiceRegistry::declare_request`](crate::ServiceRegistry::declare_request)
    /// to get the latter.
    pub async fn send_any(&self, request: AnyMessage) -> DispatchResult<AnyResponse> {
        self.send_any_with(request, CancellationToken::new()).await
    }

    /// Like [`send_any`](Self::send_any), observing `cancel`.
    pub async fn send_any_with(
        &self,
        request: AnyMessage,
        cancel: CancellationToken,
    ) -> DispatchResult<AnyResponse> {
        let binding = self.dynamic_binding(&request)?;
        let shim = binding.request()?;
        shim.dispatch(self, request, cancel).await
    }

    /// Publishes a notification whose static type is unknown.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`](crate::DispatchError::InvalidArgument) when the
    /// value's type has no recorded notification contract.
    pub async fn publish_any(&self, notification: AnyMessage) -> DispatchResult<()> {
        self.publish_any_with(notification, CancellationToken::new())
            .await
    }

    /// Like [`publish_any`](Self::publish_any), observing `cancel`.
    pub async fn publish_any_with(
        &self,
        notification: AnyMessage,
        cancel: CancellationToken,
    ) -> DispatchResult<()> {
        let binding = self.dynamic_binding(&notification)?;
        let shim = binding.notification()?;
        shim.dispatch(self, notification, cancel).await.map(|_| ())
    }

    fn dynamic_binding(&self, message: &AnyMessage) -> DispatchResult<Arc<DynamicBinding>> {
        self.inner
            .dynamic
            .get_or_try_insert(message.value_type_id(), || {
                DynamicBinding::resolve(self.inner.provider.as_ref(), message)
            })
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("config", &self.inner.config)
            .field("cached", &self.cached_entries())
            .finish()
    }
}
