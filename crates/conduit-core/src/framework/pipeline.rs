//! Request pipeline: ordered behaviors around a handler.
//!
//! A [`PipelineBehavior`] decorates the handling of one request type. Every
//! behavior receives a [`Next`] continuation standing for "the rest of the
//! pipeline"; calling [`Next::run`] hands control inward, not calling it
//! short-circuits the request.
//!
//! Behaviors are folded right-to-left around the handler so that the first
//! registered behavior is the outermost one:
//!
//! ```text
//!  send ─▶ B1 ─▶ B2 ─▶ Handler
//!  ok   ◀─ B1 ◀─ B2 ◀─┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::handler::RequestHandler;
use crate::foundation::{DispatchResult, Request};

/// A decorator around the handling of requests of type `R`.
///
/// # Example
///
/// ```rust,ignore
/// struct Audit;
///
/// #[async_trait]
/// impl PipelineBehavior<Ping> for Audit {
///     async fn handle(
///         &self,
///         request: &Ping,
///         next: Next<'_, String>,
///         _cancel: &CancellationToken,
///     ) -> DispatchResult<String> {
///         info!(payload = %request.0, "ping received");
///         next.run().await
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync + 'static {
    /// Runs this behavior, optionally delegating to `next`.
    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R::Response>,
        cancel: &CancellationToken,
    ) -> DispatchResult<R::Response>;
}

/// The remainder of a request pipeline.
///
/// Consumed by [`run`](Next::run), so every stage can invoke its successor at
/// most once.
pub struct Next<'a, T> {
    call: Box<dyn FnOnce() -> BoxFuture<'a, DispatchResult<T>> + Send + 'a>,
}

impl<'a, T: 'a> Next<'a, T> {
    pub(crate) fn new<F>(call: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'a, DispatchResult<T>> + Send + 'a,
    {
        Self {
            call: Box::new(call),
        }
    }

    /// Invokes the rest of the pipeline.
    pub fn run(self) -> BoxFuture<'a, DispatchResult<T>> {
        (self.call)()
    }
}

impl<T> std::fmt::Debug for Next<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Folds `behaviors` around `handler` into a single continuation.
pub(crate) fn compose<'a, R: Request>(
    request: &'a R,
    handler: &'a dyn RequestHandler<R>,
    behaviors: &'a [Arc<dyn PipelineBehavior<R>>],
    cancel: &'a CancellationToken,
) -> Next<'a, R::Response> {
    let innermost = Next::new(move || handler.handle(request, cancel));

    behaviors.iter().rev().fold(innermost, |next, behavior| {
        Next::new(move || behavior.handle(request, next, cancel))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::DispatchError;
    use parking_lot::Mutex;

    struct Echo;

    impl Request for Echo {
        type Response = Vec<&'static str>;
    }

    type Journal = Arc<Mutex<Vec<&'static str>>>;

    struct EchoHandler(Journal);

    #[async_trait]
    impl RequestHandler<Echo> for EchoHandler {
        async fn handle(
            &self,
            _request: &Echo,
            _cancel: &CancellationToken,
        ) -> DispatchResult<Vec<&'static str>> {
            self.0.lock().push("handler");
            Ok(vec!["handler"])
        }
    }

    struct Tag(&'static str, Journal);

    #[async_trait]
    impl PipelineBehavior<Echo> for Tag {
        async fn handle(
            &self,
            _request: &Echo,
            next: Next<'_, Vec<&'static str>>,
            _cancel: &CancellationToken,
        ) -> DispatchResult<Vec<&'static str>> {
            self.1.lock().push(self.0);
            let mut out = next.run().await?;
            out.push(self.0);
            Ok(out)
        }
    }

    struct Deny;

    #[async_trait]
    impl PipelineBehavior<Echo> for Deny {
        async fn handle(
            &self,
            _request: &Echo,
            _next: Next<'_, Vec<&'static str>>,
            _cancel: &CancellationToken,
        ) -> DispatchResult<Vec<&'static str>> {
            Err(DispatchError::handler("denied"))
        }
    }

    #[tokio::test]
    async fn test_compose_without_behaviors_calls_handler() {
        let journal = Journal::default();
        let handler = EchoHandler(journal.clone());
        let cancel = CancellationToken::new();

        let out = compose(&Echo, &handler, &[], &cancel).run().await.unwrap();
        assert_eq!(out, vec!["handler"]);
    }

    #[tokio::test]
    async fn test_compose_first_registered_is_outermost() {
        let journal = Journal::default();
        let handler = EchoHandler(journal.clone());
        let behaviors: Vec<Arc<dyn PipelineBehavior<Echo>>> = vec![
            Arc::new(Tag("b1", journal.clone())),
            Arc::new(Tag("b2", journal.clone())),
        ];
        let cancel = CancellationToken::new();

        let out = compose(&Echo, &handler, &behaviors, &cancel)
            .run()
            .await
            .unwrap();

        assert_eq!(*journal.lock(), vec!["b1", "b2", "handler"]);
        assert_eq!(out, vec!["handler", "b2", "b1"]);
    }

    #[tokio::test]
    async fn test_compose_short_circuit_skips_inner_stages() {
        let journal = Journal::default();
        let handler = EchoHandler(journal.clone());
        let behaviors: Vec<Arc<dyn PipelineBehavior<Echo>>> =
            vec![Arc::new(Deny), Arc::new(Tag("b2", journal.clone()))];
        let cancel = CancellationToken::new();

        let err = compose(&Echo, &handler, &behaviors, &cancel)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Handler(_)));
        assert!(journal.lock().is_empty());
    }
}
