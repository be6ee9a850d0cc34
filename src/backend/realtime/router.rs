/**
 * Message Router
 *
 * Dispatches a decoded envelope to the handler registered for its declared
 * type. Dispatch is a plain table lookup; adding a message type means
 * writing an `EnvelopeHandler` and registering it, nothing else changes.
 *
 * # Errors
 *
 * Per-frame failures are answered on the source connection before `route`
 * returns, so callers only need to log the returned error:
 * - no handler for the type: `{"error": "Unknown message type"}`
 * - handler rejected the envelope: `{"error": "<handler message>"}`
 */

use crate::backend::error::RealtimeError;
use crate::backend::realtime::connection::ConnectionHandle;
use crate::backend::realtime::delivery::{reply, DeliveryReport};
use crate::backend::realtime::handlers::{ChatHandler, NotificationHandler};
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::shared::{Envelope, MessageType, ServerFrame};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Handles every envelope of one message type
#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    async fn handle(
        &self,
        envelope: &Envelope,
        source: &ConnectionHandle,
        registry: &ConnectionRegistry,
    ) -> Result<DeliveryReport, RealtimeError>;
}

/// Registration table from message type to handler
#[derive(Clone, Default)]
pub struct MessageRouter {
    handlers: HashMap<MessageType, Arc<dyn EnvelopeHandler>>,
}

impl MessageRouter {
    /// Router with no handlers; every envelope is an unknown type
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the chat and notification handlers registered
    pub fn with_defaults() -> Self {
        let mut router = Self::new();
        router.register(MessageType::Chat, Arc::new(ChatHandler));
        router.register(MessageType::Notification, Arc::new(NotificationHandler));
        router
    }

    /// Register `handler` for `kind`, replacing any previous handler
    pub fn register(&mut self, kind: MessageType, handler: Arc<dyn EnvelopeHandler>) -> &mut Self {
        if self.handlers.insert(kind.clone(), handler).is_some() {
            tracing::warn!(kind = %kind, "[Router] Replaced handler");
        }
        self
    }

    pub fn handles(&self, kind: &MessageType) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Dispatch `envelope` from `source`
    pub async fn route(
        &self,
        envelope: &Envelope,
        source: &ConnectionHandle,
        registry: &ConnectionRegistry,
    ) -> Result<DeliveryReport, RealtimeError> {
        let Some(handler) = self.handlers.get(envelope.kind()) else {
            let error = RealtimeError::unknown_type(envelope.kind().as_str());
            reply(source, &ServerFrame::from(&error))?;
            return Err(error);
        };

        match handler.handle(envelope, source, registry).await {
            Err(error @ RealtimeError::Handler { .. }) => {
                reply(source, &ServerFrame::from(&error))?;
                Err(error)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().map(MessageType::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("MessageRouter").field("handlers", &kinds).finish()
    }
}
