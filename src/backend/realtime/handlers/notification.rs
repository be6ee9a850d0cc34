/**
 * Notification Handler
 *
 * Targeted delivery: the envelope names its recipients by display name or
 * user id, and every open connection bound to one of those identities gets
 *
 * ```json
 * {"notification": {"from": "alice", "text": "poke", "data": {...}}}
 * ```
 *
 * A user with several open connections receives it on each of them. The
 * source connection never receives its own notification, even when the
 * sender names themself. Naming nobody who is online is not an error.
 */

use crate::backend::error::RealtimeError;
use crate::backend::realtime::connection::ConnectionHandle;
use crate::backend::realtime::delivery::{fan_out, DeliveryReport, ToIdentities};
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::backend::realtime::router::EnvelopeHandler;
use crate::shared::{Envelope, NotificationBody, Payload, ServerFrame};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationHandler;

#[async_trait]
impl EnvelopeHandler for NotificationHandler {
    async fn handle(
        &self,
        envelope: &Envelope,
        source: &ConnectionHandle,
        registry: &ConnectionRegistry,
    ) -> Result<DeliveryReport, RealtimeError> {
        let Payload::Notification(notification) = envelope.payload() else {
            return Err(RealtimeError::handler("expected a notification"));
        };

        let policy = ToIdentities::new(notification.to.names());
        let frame = ServerFrame::Notification {
            notification: NotificationBody::new(
                source.identity().display_name.as_str(),
                notification.text.clone(),
                notification.data.clone(),
            ),
        };

        let report = fan_out(registry, source, &policy, &frame).await?;
        if report.targeted() == 0 {
            tracing::info!(
                connection_id = %source.id(),
                to = ?notification.to.names().collect::<Vec<_>>(),
                "[Realtime] Notification has no connected recipient"
            );
        }
        Ok(report)
    }
}
