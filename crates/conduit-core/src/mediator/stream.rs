//! Stream dispatch and the [`ResponseStream`] handed to consumers.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{self, FusedStream, Stream, StreamExt};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, trace};

use crate::foundation::{DispatchError, DispatchResult, StreamRequest};
use crate::framework::{ItemStream, StreamHandler};
use crate::registry::{ServiceKey, ServiceProvider, downcast_service};

/// The resolved handler of one stream request type.
pub(crate) struct StreamBinding<S: StreamRequest> {
    handler: Arc<dyn StreamHandler<S>>,
}

impl<S: StreamRequest> StreamBinding<S> {
    pub(crate) fn resolve(provider: &dyn ServiceProvider) -> DispatchResult<Self> {
        let handler = provider
            .resolve_one(&ServiceKey::stream_handler::<S>())
            .as_ref()
            .and_then(downcast_service::<dyn StreamHandler<S>>)
            .ok_or_else(|| {
                debug!(request = type_name::<S>(), "No stream handler registered");
                DispatchError::not_found::<S>()
            })?;

        Ok(Self { handler })
    }

    /// Builds a stream that calls the handler on its first poll.
    pub(crate) fn open(&self, request: S, cancel: CancellationToken) -> ResponseStream<S::Item> {
        let producer = cancel.child_token();
        let handler = Arc::clone(&self.handler);
        let token = producer.clone();

        let items = stream::once(async move { handler.handle(request, token) })
            .flatten()
            .boxed();

        ResponseStream::new(items, producer)
    }
}

/// A lazily produced sequence of results from a stream request.
///
/// The stream ends after the producer finishes, after the first producer
/// error, or after a cancellation token fires. Cancellation is reported once
/// as [`DispatchError::Cancelled`]; nothing is yielded afterwards.
///
/// Dropping the stream cancels the token the producer was given.
///
/// # Example
///
/// ```rust,ignore
/// let mut ticks = mediator
///     .create_stream(Countdown { from: 3 })
///     .await?
///     .cancel_on(shutdown.clone());
///
/// while let Some(tick) = ticks.next().await {
///     println!("{}", tick?);
/// }
/// ```
pub struct ResponseStream<T> {
    inner: Option<ItemStream<T>>,
    cancellation: Vec<Pin<Box<WaitForCancellationFutureOwned>>>,
    producer: CancellationToken,
}

impl<T> ResponseStream<T> {
    fn new(inner: ItemStream<T>, producer: CancellationToken) -> Self {
        let watch = Box::pin(producer.clone().cancelled_owned());
        Self {
            inner: Some(inner),
            cancellation: vec![watch],
            producer,
        }
    }

    /// Also ends the stream when `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        if self.inner.is_some() {
            self.cancellation.push(Box::pin(token.cancelled_owned()));
        }
        self
    }

    /// Returns `true` once the stream has ended.
    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    fn release(&mut self) {
        self.inner = None;
        self.cancellation.clear();
        self.producer.cancel();
    }
}

impl<T> Stream for ResponseStream<T> {
    type Item = DispatchResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.inner.is_none() {
            return Poll::Ready(None);
        }

        if this
            .cancellation
            .iter_mut()
            .any(|watch| watch.as_mut().poll(cx).is_ready())
        {
            trace!("Response stream cancelled");
            this.release();
            return Poll::Ready(Some(Err(DispatchError::Cancelled)));
        }

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Err(e))) => {
                this.release();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.release();
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl<T> FusedStream for ResponseStream<T> {
    fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }
}

impl<T> Drop for ResponseStream<T> {
    fn drop(&mut self) {
        self.producer.cancel();
    }
}

impl<T> fmt::Debug for ResponseStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("finished", &self.inner.is_none())
            .field("watched_tokens", &self.cancellation.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Numbers(Vec<u32>);

    impl StreamRequest for Numbers {
        type Item = u32;
    }

    struct NumbersHandler {
        called: Arc<AtomicBool>,
    }

    impl StreamHandler<Numbers> for NumbersHandler {
        fn handle(&self, request: Numbers, _cancel: CancellationToken) -> ItemStream<u32> {
            self.called.store(true, Ordering::SeqCst);
            stream::iter(request.0.into_iter().map(Ok)).boxed()
        }
    }

    struct Faulty;

    impl StreamHandler<Numbers> for Faulty {
        fn handle(&self, _request: Numbers, _cancel: CancellationToken) -> ItemStream<u32> {
            stream::iter(vec![
                Ok(1),
                Err(DispatchError::handler("sensor offline")),
                Ok(3),
            ])
            .boxed()
        }
    }

    fn binding(handler: impl StreamHandler<Numbers>) -> StreamBinding<Numbers> {
        StreamBinding {
            handler: Arc::new(handler),
        }
    }

    #[tokio::test]
    async fn test_production_is_lazy() {
        let called = Arc::new(AtomicBool::new(false));
        let bound = binding(NumbersHandler {
            called: called.clone(),
        });

        let mut numbers = bound.open(Numbers(vec![5]), CancellationToken::new());
        assert!(!called.load(Ordering::SeqCst));

        assert_eq!(numbers.next().await.unwrap().unwrap(), 5);
        assert!(called.load(Ordering::SeqCst));
        assert!(numbers.next().await.is_none());
        assert!(numbers.is_terminated());
    }

    #[tokio::test]
    async fn test_cancellation_yields_once_then_ends() {
        let bound = binding(NumbersHandler {
            called: Arc::default(),
        });
        let consumer = CancellationToken::new();
        let mut numbers = bound
            .open(Numbers(vec![1, 2, 3, 4]), CancellationToken::new())
            .cancel_on(consumer.clone());

        let mut seen = Vec::new();
        while let Some(item) = numbers.next().await {
            match item {
                Ok(n) => {
                    seen.push(n);
                    if seen.len() == 2 {
                        consumer.cancel();
                    }
                }
                Err(e) => {
                    assert!(e.is_cancelled());
                    seen.push(0);
                }
            }
        }

        assert_eq!(seen, vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn test_creation_token_cancels_stream() {
        let bound = binding(NumbersHandler {
            called: Arc::default(),
        });
        let creation = CancellationToken::new();
        let mut numbers = bound.open(Numbers(vec![1, 2]), creation.clone());

        creation.cancel();
        assert!(numbers.next().await.unwrap().unwrap_err().is_cancelled());
        assert!(numbers.next().await.is_none());
    }

    #[tokio::test]
    async fn test_producer_error_terminates() {
        let mut numbers = binding(Faulty).open(Numbers(vec![]), CancellationToken::new());

        assert_eq!(numbers.next().await.unwrap().unwrap(), 1);
        assert!(matches!(
            numbers.next().await,
            Some(Err(DispatchError::Handler(_)))
        ));
        assert!(numbers.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_cancels_producer_token() {
        struct Capture(Arc<parking_lot::Mutex<Option<CancellationToken>>>);

        impl StreamHandler<Numbers> for Capture {
            fn handle(&self, _request: Numbers, cancel: CancellationToken) -> ItemStream<u32> {
                *self.0.lock() = Some(cancel);
                stream::pending().boxed()
            }
        }

        let slot = Arc::new(parking_lot::Mutex::new(None));
        let mut numbers =
            binding(Capture(slot.clone())).open(Numbers(vec![]), CancellationToken::new());

        // Poll once so the producer is started.
        assert!(futures::poll!(numbers.next()).is_pending());
        let token = slot.lock().clone().unwrap();
        assert!(!token.is_cancelled());

        drop(numbers);
        assert!(token.is_cancelled());
    }
}
