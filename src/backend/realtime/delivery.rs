/**
 * Frame Delivery
 *
 * The one fan-out primitive behind every handler. A handler picks a
 * `RecipientPolicy`, builds a `ServerFrame`, and calls `fan_out`; the frame is
 * encoded once and queued on each selected connection with `try_send`.
 *
 * # Delivery Semantics
 *
 * Best-effort and fire-and-forget per recipient:
 * - a full outbound queue drops the frame for that recipient only and is
 *   recorded as a `DeliveryFailure`
 * - a recipient that closed between the snapshot and the send is skipped
 * - nothing here ever blocks on a slow client or fails the sender
 */

use crate::backend::error::RealtimeError;
use crate::backend::realtime::connection::{ConnectionHandle, ConnectionId, Outbound, SendFailure};
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::shared::codec::encode_frame;
use crate::shared::{EncodeError, ServerFrame};
use std::collections::HashSet;

/// Decides which open connections receive a frame
pub trait RecipientPolicy: Send + Sync {
    fn includes(&self, source: &ConnectionHandle, candidate: &ConnectionHandle) -> bool;
}

/// Every open connection except the source
#[derive(Debug, Clone, Copy, Default)]
pub struct EveryoneElse;

impl RecipientPolicy for EveryoneElse {
    fn includes(&self, source: &ConnectionHandle, candidate: &ConnectionHandle) -> bool {
        candidate.id() != source.id()
    }
}

/// Open connections whose identity answers to one of the given names,
/// excluding the source connection
#[derive(Debug, Clone, Default)]
pub struct ToIdentities {
    names: HashSet<String>,
}

impl ToIdentities {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl RecipientPolicy for ToIdentities {
    fn includes(&self, source: &ConnectionHandle, candidate: &ConnectionHandle) -> bool {
        if candidate.id() == source.id() {
            return false;
        }
        let identity = candidate.identity();
        self.names.contains(&identity.display_name) || self.names.contains(&identity.user_id)
    }
}

/// A frame that could not be queued for one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub connection: ConnectionId,
    pub reason: SendFailure,
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Frames queued successfully
    pub delivered: usize,
    /// Selected recipients that had already closed
    pub skipped: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    /// Recipients the policy selected
    pub fn targeted(&self) -> usize {
        self.delivered + self.skipped + self.failures.len()
    }
}

/// Queue `frame` on every open connection `policy` selects
pub async fn fan_out(
    registry: &ConnectionRegistry,
    source: &ConnectionHandle,
    policy: &dyn RecipientPolicy,
    frame: &ServerFrame,
) -> Result<DeliveryReport, RealtimeError> {
    let encoded = encode_frame(frame)?;
    let mut report = DeliveryReport::default();

    registry
        .for_each_open(|candidate| {
            if !policy.includes(source, candidate) {
                return;
            }
            match candidate.try_send(Outbound::Frame(encoded.clone())) {
                Ok(()) => report.delivered += 1,
                Err(SendFailure::Closed) => report.skipped += 1,
                Err(reason) => {
                    tracing::warn!(
                        connection_id = %candidate.id(),
                        user = %candidate.identity(),
                        %reason,
                        "[Realtime] Dropped frame for recipient"
                    );
                    report.failures.push(DeliveryFailure {
                        connection: candidate.id(),
                        reason,
                    });
                }
            }
        })
        .await?;

    tracing::debug!(
        connection_id = %source.id(),
        delivered = report.delivered,
        skipped = report.skipped,
        failed = report.failures.len(),
        "[Realtime] Fan-out complete"
    );

    Ok(report)
}

/// Queue `frame` on a single connection, logging when it cannot be queued
pub fn reply(connection: &ConnectionHandle, frame: &ServerFrame) -> Result<(), EncodeError> {
    let encoded = encode_frame(frame)?;
    if let Err(reason) = connection.try_send(Outbound::Frame(encoded)) {
        tracing::warn!(
            connection_id = %connection.id(),
            %reason,
            "[Realtime] Could not queue reply"
        );
    }
    Ok(())
}
