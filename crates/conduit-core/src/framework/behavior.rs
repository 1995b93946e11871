//! Built-in pipeline behaviors.
//!
//! - [`PreProcessorBehavior`] / [`PostProcessorBehavior`] adapt the simpler
//!   [`RequestPreProcessor`] / [`RequestPostProcessor`] hooks into ordinary
//!   behaviors, so they honour registration order like any other stage.
//! - [`LoggingBehavior`] opens a `tracing` span per request and records how
//!   it ended.
//! - [`TimeoutBehavior`] bounds how long the rest of the pipeline may run.
//!
//! None of these are installed implicitly; register them per request type.

use std::any::type_name;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, debug, span, warn};

use super::pipeline::{Next, PipelineBehavior};
use crate::foundation::{DispatchError, DispatchResult, Request};

// ============================================================================
// Pre/Post Processors
// ============================================================================

/// A hook that runs before the rest of the pipeline.
///
/// Returning an error aborts the request before any later stage runs.
#[async_trait]
pub trait RequestPreProcessor<R: Request>: Send + Sync + 'static {
    /// Inspects the request before it is handled.
    async fn process(&self, request: &R, cancel: &CancellationToken) -> DispatchResult<()>;
}

/// A hook that observes a successful response.
///
/// Not called when an inner stage failed. Returning an error replaces the
/// response with that error.
#[async_trait]
pub trait RequestPostProcessor<R: Request>: Send + Sync + 'static {
    /// Inspects the request and its response after handling.
    async fn process(
        &self,
        request: &R,
        response: &R::Response,
        cancel: &CancellationToken,
    ) -> DispatchResult<()>;
}

/// Runs a [`RequestPreProcessor`] as a pipeline stage.
pub struct PreProcessorBehavior<P> {
    processor: P,
}

impl<P> PreProcessorBehavior<P> {
    /// Wraps a pre-processor.
    pub fn new(processor: P) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl<R, P> PipelineBehavior<R> for PreProcessorBehavior<P>
where
    R: Request,
    P: RequestPreProcessor<R>,
{
    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R::Response>,
        cancel: &CancellationToken,
    ) -> DispatchResult<R::Response> {
        self.processor.process(request, cancel).await?;
        next.run().await
    }
}

/// Runs a [`RequestPostProcessor`] as a pipeline stage.
pub struct PostProcessorBehavior<P> {
    processor: P,
}

impl<P> PostProcessorBehavior<P> {
    /// Wraps a post-processor.
    pub fn new(processor: P) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl<R, P> PipelineBehavior<R> for PostProcessorBehavior<P>
where
    R: Request,
    R::Response: Sync,
    P: RequestPostProcessor<R>,
{
    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R::Response>,
        cancel: &CancellationToken,
    ) -> DispatchResult<R::Response> {
        let response = next.run().await?;
        self.processor.process(request, &response, cancel).await?;
        Ok(response)
    }
}

// ============================================================================
// LoggingBehavior
// ============================================================================

/// Wraps the rest of the pipeline in a `tracing` span.
///
/// Logs completion at `DEBUG` with the elapsed time, and failures at `WARN`.
/// Cancellation is logged at `DEBUG` since it is usually caller-initiated.
pub struct LoggingBehavior<R> {
    _marker: PhantomData<fn(R)>,
}

impl<R> LoggingBehavior<R> {
    /// Creates a logging behavior for requests of type `R`.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R> Default for LoggingBehavior<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for LoggingBehavior<R> {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R::Response>,
        _cancel: &CancellationToken,
    ) -> DispatchResult<R::Response> {
        let request_name = type_name::<R>();
        let span = span!(Level::DEBUG, "request", request = request_name);
        let started = Instant::now();

        let result = next.run().instrument(span.clone()).await;
        let elapsed = started.elapsed();

        let _enter = span.enter();
        match &result {
            Ok(_) => debug!(?elapsed, "Request handled"),
            Err(DispatchError::Cancelled) => debug!(?elapsed, "Request cancelled"),
            Err(e) => warn!(?elapsed, error = %e, "Request failed"),
        }
        result
    }
}

// ============================================================================
// TimeoutBehavior
// ============================================================================

/// Fails the request with [`DispatchError::Timeout`] if the rest of the
/// pipeline does not finish within the limit.
///
/// The inner future is dropped on expiry; the call's cancellation token is
/// left untouched since it belongs to the caller.
pub struct TimeoutBehavior<R> {
    limit: Duration,
    _marker: PhantomData<fn(R)>,
}

impl<R> TimeoutBehavior<R> {
    /// Creates a timeout behavior with the given limit.
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            _marker: PhantomData,
        }
    }

    /// Returns the configured limit.
    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for TimeoutBehavior<R> {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R::Response>,
        _cancel: &CancellationToken,
    ) -> DispatchResult<R::Response> {
        match tokio::time::timeout(self.limit, next.run()).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout {
                message: type_name::<R>(),
                after: self.limit,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::handler::RequestHandler;
    use crate::framework::pipeline::compose;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Double(u32);

    impl Request for Double {
        type Response = u32;
    }

    struct DoubleHandler;

    #[async_trait]
    impl RequestHandler<Double> for DoubleHandler {
        async fn handle(&self, request: &Double, _cancel: &CancellationToken) -> DispatchResult<u32> {
            Ok(request.0 * 2)
        }
    }

    struct Stall;

    #[async_trait]
    impl RequestHandler<Double> for Stall {
        async fn handle(&self, _request: &Double, _cancel: &CancellationToken) -> DispatchResult<u32> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(0)
        }
    }

    struct RejectZero;

    #[async_trait]
    impl RequestPreProcessor<Double> for RejectZero {
        async fn process(&self, request: &Double, _cancel: &CancellationToken) -> DispatchResult<()> {
            if request.0 == 0 {
                return Err(DispatchError::invalid_argument("Double", "zero"));
            }
            Ok(())
        }
    }

    struct CountResponses(Arc<AtomicUsize>);

    #[async_trait]
    impl RequestPostProcessor<Double> for CountResponses {
        async fn process(
            &self,
            _request: &Double,
            response: &u32,
            _cancel: &CancellationToken,
        ) -> DispatchResult<()> {
            self.0.fetch_add(*response as usize, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_pre_processor_short_circuits() {
        let seen = Arc::new(AtomicUsize::new(0));
        let behaviors: Vec<Arc<dyn PipelineBehavior<Double>>> = vec![
            Arc::new(PreProcessorBehavior::new(RejectZero)),
            Arc::new(PostProcessorBehavior::new(CountResponses(seen.clone()))),
        ];
        let cancel = CancellationToken::new();

        let err = compose(&Double(0), &DoubleHandler, &behaviors, &cancel)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArgument { .. }));
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        let out = compose(&Double(4), &DoubleHandler, &behaviors, &cancel)
            .run()
            .await
            .unwrap();
        assert_eq!(out, 8);
        assert_eq!(seen.load(Ordering::SeqCst), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_behavior_expires() {
        let behaviors: Vec<Arc<dyn PipelineBehavior<Double>>> =
            vec![Arc::new(TimeoutBehavior::new(Duration::from_millis(50)))];
        let cancel = CancellationToken::new();

        let err = compose(&Double(1), &Stall, &behaviors, &cancel)
            .run()
            .await
            .unwrap_err();
        match err {
            DispatchError::Timeout { after, .. } => assert_eq!(after, Duration::from_millis(50)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_logging_behavior_is_transparent() {
        let behaviors: Vec<Arc<dyn PipelineBehavior<Double>>> =
            vec![Arc::new(LoggingBehavior::new())];
        let cancel = CancellationToken::new();

        let out = compose(&Double(21), &DoubleHandler, &behaviors, &cancel)
            .run()
            .await
            .unwrap();
        assert_eq!(out, 42);
    }
}
