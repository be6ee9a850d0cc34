/**
 * Chat Broadcast Handler
 *
 * Delivers `{"user": <sender>, "text": <text>}` to every open connection
 * except the one it came from. The sender name is the display name bound to
 * the source connection at handshake.
 */

use crate::backend::error::RealtimeError;
use crate::backend::realtime::connection::ConnectionHandle;
use crate::backend::realtime::delivery::{fan_out, DeliveryReport, EveryoneElse};
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::backend::realtime::router::EnvelopeHandler;
use crate::shared::{Envelope, Payload, ServerFrame};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct ChatHandler;

#[async_trait]
impl EnvelopeHandler for ChatHandler {
    async fn handle(
        &self,
        envelope: &Envelope,
        source: &ConnectionHandle,
        registry: &ConnectionRegistry,
    ) -> Result<DeliveryReport, RealtimeError> {
        let Payload::Chat(chat) = envelope.payload() else {
            return Err(RealtimeError::handler("expected a chat message"));
        };

        let sender = &source.identity().display_name;
        tracing::info!(
            connection_id = %source.id(),
            user = %sender,
            "[Realtime] Chat message received"
        );

        let frame = ServerFrame::chat(sender.as_str(), chat.text.as_str());
        fan_out(registry, source, &EveryoneElse, &frame).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::connection::{ConnectionState, Outbound};
    use crate::shared::codec::decode;
    use crate::shared::Identity;
    use tokio::sync::mpsc::Receiver;

    fn open(name: &str) -> (ConnectionHandle, Receiver<Outbound>) {
        let (handle, rx) = ConnectionHandle::new(Identity::new(format!("id-{name}"), name), 8);
        handle.transition(ConnectionState::Connecting, ConnectionState::Open);
        (handle, rx)
    }

    #[tokio::test]
    async fn test_chat_reaches_everyone_but_sender() {
        let registry = ConnectionRegistry::spawn();
        let (alice, mut alice_rx) = open("alice");
        let (bob, mut bob_rx) = open("bob");
        let (carol, mut carol_rx) = open("carol");
        for c in [&alice, &bob, &carol] {
            registry.register(c.clone()).await.unwrap();
        }

        // the payload's user field is not trusted
        let envelope = decode(br#"{"type":"CHAT","text":"hello","user":"mallory"}"#).unwrap();
        let report = ChatHandler.handle(&envelope, &alice, &registry).await.unwrap();

        assert_eq!(report.delivered, 2);
        let expected = Outbound::Frame(r#"{"user":"alice","text":"hello"}"#.to_string());
        assert_eq!(bob_rx.try_recv().unwrap(), expected);
        assert_eq!(carol_rx.try_recv().unwrap(), expected);
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_chat_skips_closing_recipient() {
        let registry = ConnectionRegistry::spawn();
        let (alice, _alice_rx) = open("alice");
        let (bob, mut bob_rx) = open("bob");
        let (carol, mut carol_rx) = open("carol");
        for c in [&alice, &bob, &carol] {
            registry.register(c.clone()).await.unwrap();
        }
        bob.transition(ConnectionState::Open, ConnectionState::Closing);

        let report = ChatHandler
            .handle(&Envelope::chat("still there?"), &alice, &registry)
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert!(report.failures.is_empty());
        assert!(bob_rx.try_recv().is_err());
        assert!(carol_rx.try_recv().is_ok());
    }
}
