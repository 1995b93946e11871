//! Notification fan-out.

use std::any::type_name;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::PublishStrategy;
use crate::foundation::{AggregateError, DispatchError, DispatchResult, Notification};
use crate::framework::NotificationHandler;
use crate::registry::{ServiceKey, ServiceProvider, downcast_service};

/// Every handler registered for one notification type, in registration order.
pub(crate) struct NotificationFanOut<N: Notification> {
    handlers: Vec<Arc<dyn NotificationHandler<N>>>,
}

impl<N: Notification> NotificationFanOut<N> {
    pub(crate) fn resolve(provider: &dyn ServiceProvider) -> DispatchResult<Self> {
        let handlers: Vec<_> = provider
            .resolve_many(&ServiceKey::notification_handler::<N>())
            .iter()
            .filter_map(downcast_service::<dyn NotificationHandler<N>>)
            .collect();

        debug!(
            notification = type_name::<N>(),
            handlers = handlers.len(),
            "Notification handlers resolved"
        );

        Ok(Self { handlers })
    }

    /// Runs every handler and aggregates the failures.
    ///
    /// A failing handler never prevents the others from running.
    pub(crate) async fn invoke(
        &self,
        notification: &N,
        cancel: &CancellationToken,
        strategy: PublishStrategy,
    ) -> DispatchResult<()> {
        let failures: Vec<DispatchError> = match strategy {
            PublishStrategy::Sequential => {
                let mut failures = Vec::new();
                for handler in &self.handlers {
                    if let Err(e) = handler.handle(notification, cancel).await {
                        failures.push(e);
                    }
                }
                failures
            }
            PublishStrategy::Concurrent => {
                join_all(self.handlers.iter().map(|h| h.handle(notification, cancel)))
                    .await
                    .into_iter()
                    .filter_map(Result::err)
                    .collect()
            }
        };

        if failures.is_empty() {
            return Ok(());
        }

        warn!(
            notification = type_name::<N>(),
            failed = failures.len(),
            handlers = self.handlers.len(),
            "Notification handlers failed"
        );
        Err(AggregateError::new(type_name::<N>(), failures).into())
    }
}
