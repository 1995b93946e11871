//! Request dispatch.

use std::any::type_name;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::foundation::{DispatchError, DispatchResult, Request};
use crate::framework::pipeline::compose;
use crate::framework::{PipelineBehavior, RequestHandler};
use crate::registry::{ServiceKey, ServiceProvider, downcast_service};

/// The resolved handler and behaviors of one request type.
pub(crate) struct RequestPipeline<R: Request> {
    handler: Arc<dyn RequestHandler<R>>,
    behaviors: Vec<Arc<dyn PipelineBehavior<R>>>,
}

impl<R: Request> RequestPipeline<R> {
    pub(crate) fn resolve(provider: &dyn ServiceProvider) -> DispatchResult<Self> {
        let handler = provider
            .resolve_one(&ServiceKey::request_handler::<R>())
            .as_ref()
            .and_then(downcast_service::<dyn RequestHandler<R>>)
            .ok_or_else(|| {
                debug!(request = type_name::<R>(), "No request handler registered");
                DispatchError::not_found::<R>()
            })?;

        let behaviors: Vec<_> = provider
            .resolve_many(&ServiceKey::pipeline_behavior::<R>())
            .iter()
            .filter_map(downcast_service::<dyn PipelineBehavior<R>>)
            .collect();

        debug!(
            request = type_name::<R>(),
            behaviors = behaviors.len(),
            "Request pipeline resolved"
        );

        Ok(Self { handler, behaviors })
    }

    pub(crate) async fn invoke(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> DispatchResult<R::Response> {
        compose(request, self.handler.as_ref(), &self.behaviors, cancel)
            .run()
            .await
    }
}
