//! Untyped dispatch: routing an [`AnyMessage`] through its recorded contracts.

use std::sync::Arc;

use tracing::debug;

use crate::foundation::{AnyMessage, DispatchError, DispatchResult};
use crate::registry::{
    ErasedMessage, MessageContract, MessageKind, ServiceKey, ServiceProvider, downcast_service,
};

/// The erased shims available for one concrete message type.
pub(crate) struct DynamicBinding {
    type_name: &'static str,
    request: Option<Arc<dyn ErasedMessage>>,
    notification: Option<Arc<dyn ErasedMessage>>,
}

impl DynamicBinding {
    /// Looks up the contracts recorded for the runtime type of `message`.
    ///
    /// Fails with [`DispatchError::InvalidArgument`] when the type is neither
    /// a known request nor a known notification.
    pub(crate) fn resolve(
        provider: &dyn ServiceProvider,
        message: &AnyMessage,
    ) -> DispatchResult<Self> {
        let contracts: Vec<Arc<MessageContract>> = provider
            .resolve_many(&ServiceKey::contract(message.value_type_id()))
            .iter()
            .filter_map(downcast_service::<MessageContract>)
            .collect();

        let Some(first) = contracts.first() else {
            debug!(message = message.type_name(), "No message contract recorded");
            return Err(DispatchError::invalid_argument(
                message.type_name(),
                "type is neither a registered request nor a registered notification",
            ));
        };

        let bind = |kind: MessageKind| {
            contracts
                .iter()
                .find(|c| c.kind() == kind)
                .map(|c| c.bind())
        };

        Ok(Self {
            type_name: first.type_name(),
            request: bind(MessageKind::Request),
            notification: bind(MessageKind::Notification),
        })
    }

    pub(crate) fn request(&self) -> DispatchResult<&Arc<dyn ErasedMessage>> {
        self.request.as_ref().ok_or_else(|| {
            DispatchError::invalid_argument(self.type_name, "type is not a request")
        })
    }

    pub(crate) fn notification(&self) -> DispatchResult<&Arc<dyn ErasedMessage>> {
        self.notification.as_ref().ok_or_else(|| {
            DispatchError::invalid_argument(self.type_name, "type is not a notification")
        })
    }
}
