/**
 * WebSocket Session
 *
 * One authenticated WebSocket from upgrade to close.
 *
 * # Tasks
 *
 * Each connection runs as a pair:
 * - **writer task**: owns the socket sink and drains the connection's
 *   outbound queue in order; the only code that writes to the socket
 * - **reader loop**: reads frames in receipt order, decodes and routes them,
 *   and drives the keep-alive ping
 *
 * # Keep-alive
 *
 * The server pings every `ping_interval`. If nothing at all arrives from the
 * client within `pong_timeout` of a ping, the connection is closed through
 * the lifecycle manager like any other close.
 *
 * # Errors
 *
 * A frame that fails to decode gets `{"error": "Invalid message format"}`
 * and the loop carries on. Only a channel error, a close from either side,
 * keep-alive expiry or server shutdown ends the session.
 */

use crate::backend::error::RealtimeError;
use crate::backend::middleware::VerifiedIdentity;
use crate::backend::realtime::connection::{ConnectionHandle, Outbound};
use crate::backend::realtime::delivery::reply;
use crate::backend::realtime::lifecycle::CloseCause;
use crate::backend::server::state::AppState;
use crate::shared::codec::decode_limited;
use crate::shared::{Identity, ServerFrame};
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How long a closing session waits for its writer to flush
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Transport frame ceiling, relative to the decode limit
///
/// Frames between the decode limit and this ceiling still reach the decoder
/// and get an error frame; only frames beyond it fail the channel.
const TRANSPORT_HEADROOM: usize = 4;

/// Payload of server keep-alive pings
const PING_PAYLOAD: &[u8] = b"keep-alive";

/// `GET {ws_path}`
///
/// The credential is checked by `VerifiedIdentity` before the upgrade is
/// accepted; an unauthenticated request never reaches this body.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    VerifiedIdentity(identity): VerifiedIdentity,
    ws: WebSocketUpgrade,
) -> Response {
    let ceiling = state
        .config
        .max_frame_bytes
        .saturating_mul(TRANSPORT_HEADROOM);

    ws.max_message_size(ceiling)
        .on_upgrade(move |socket| run_connection(socket, state, identity))
}

/// Drive one connection until it closes
pub async fn run_connection(socket: WebSocket, state: AppState, identity: Identity) {
    let (connection, outbound) = state.lifecycle.accept(identity);
    let (sink, stream) = socket.split();

    let mut writer = tokio::spawn(write_loop(
        sink,
        outbound,
        connection.cancel_token().clone(),
    ));

    if let Err(e) = state.lifecycle.open(&connection).await {
        tracing::warn!(
            connection_id = %connection.id(),
            error = %e,
            "[Realtime] Could not open connection"
        );
        state.lifecycle.close(&connection, CloseCause::Shutdown).await;
        connection.cancel_token().cancel();
    } else {
        let cause = read_loop(stream, &connection, &state).await;
        state.lifecycle.close(&connection, cause).await;
    }

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer)
        .await
        .is_err()
    {
        tracing::debug!(connection_id = %connection.id(), "[Realtime] Writer did not drain in time");
        writer.abort();
    }
}

async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    connection: &ConnectionHandle,
    state: &AppState,
) -> CloseCause {
    let cancel = connection.cancel_token().clone();
    let ping_interval = state.config.ping_interval;
    let pong_timeout = state.config.pong_timeout;

    let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut keep_alive = KeepAlive::new(pong_timeout);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return CloseCause::Shutdown,

            _ = ping.tick() => send_ping(connection, &mut keep_alive),

            _ = wait_for(keep_alive.deadline()) => {
                tracing::warn!(
                    connection_id = %connection.id(),
                    user = %connection.identity(),
                    "[Realtime] Pong timeout"
                );
                return CloseCause::KeepAliveTimeout;
            }

            incoming = stream.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        tracing::warn!(
                            connection_id = %connection.id(),
                            error = %e,
                            "[Realtime] WebSocket receive error"
                        );
                        return CloseCause::Fault;
                    }
                    None => return CloseCause::ClientClosed,
                };

                keep_alive.heard_from_peer();

                match message {
                    Message::Text(text) => {
                        handle_frame(text.as_str().as_bytes(), connection, state).await
                    }
                    Message::Binary(bytes) => handle_frame(&bytes, connection, state).await,
                    Message::Close(frame) => {
                        tracing::debug!(
                            connection_id = %connection.id(),
                            reason = ?frame,
                            "[Realtime] Client initiated close"
                        );
                        return CloseCause::ClientClosed;
                    }
                    // pings are answered by the transport
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
        }
    }
}

/// Pong deadline bookkeeping for one connection
#[derive(Debug)]
struct KeepAlive {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl KeepAlive {
    fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    /// Start the pong clock unless it is already running
    fn pinged(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.timeout);
        }
    }

    /// Any traffic proves the peer is alive
    fn heard_from_peer(&mut self) {
        self.deadline = None;
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Queue a keep-alive ping and start the pong clock
///
/// The clock starts even when the ping cannot be queued: a peer whose queue
/// stays full has stopped reading, and must still time out.
fn send_ping(connection: &ConnectionHandle, keep_alive: &mut KeepAlive) {
    if let Err(reason) = connection.send_control(Outbound::Ping(PING_PAYLOAD.to_vec())) {
        tracing::debug!(
            connection_id = %connection.id(),
            %reason,
            "[Realtime] Could not queue ping"
        );
    }
    keep_alive.pinged(Instant::now());
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Decode and route one inbound frame
async fn handle_frame(bytes: &[u8], connection: &ConnectionHandle, state: &AppState) {
    let envelope = match decode_limited(bytes, state.config.max_frame_bytes) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection.id(),
                error = %e,
                "[Realtime] Undecodable frame"
            );
            let error = RealtimeError::from(e);
            if let Err(e) = reply(connection, &ServerFrame::from(&error)) {
                tracing::error!(error = %e, "[Realtime] Could not encode error frame");
            }
            return;
        }
    };

    if let Err(e) = state
        .router
        .route(&envelope, connection, &state.registry)
        .await
    {
        match e {
            RealtimeError::UnknownMessageType { .. } | RealtimeError::Handler { .. } => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    error = %e,
                    "[Realtime] Envelope rejected"
                );
            }
            _ => tracing::error!(
                connection_id = %connection.id(),
                kind = %envelope.kind(),
                error = %e,
                "[Realtime] Routing failed"
            ),
        }
    }
}

/// Drain the outbound queue into the socket
///
/// On cancellation, whatever is already queued (typically a close frame) is
/// still flushed before the sink is closed.
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
    cancel: CancellationToken,
) {
    loop {
        let item = tokio::select! {
            biased;
            item = outbound.recv() => item,
            _ = cancel.cancelled() => {
                while let Ok(item) = outbound.try_recv() {
                    if !write_one(&mut sink, item).await {
                        break;
                    }
                }
                break;
            }
        };

        let Some(item) = item else { break };
        if !write_one(&mut sink, item).await {
            break;
        }
    }

    let _ = sink.close().await;
}

/// Write one item; false once the socket should no longer be written to
async fn write_one(sink: &mut SplitSink<WebSocket, Message>, item: Outbound) -> bool {
    let is_close = matches!(item, Outbound::Close { .. });
    let message = match item {
        Outbound::Frame(text) => Message::Text(text.into()),
        Outbound::Ping(payload) => Message::Ping(payload.into()),
        Outbound::Close { code, reason } => Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })),
    };

    if let Err(e) = sink.send(message).await {
        tracing::debug!(error = %e, "[Realtime] WebSocket send failed");
        return false;
    }
    !is_close
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::connection::{ConnectionState, SendFailure};
    use tokio::sync::mpsc::Receiver;

    fn open(capacity: usize) -> (ConnectionHandle, Receiver<Outbound>) {
        let (handle, rx) = ConnectionHandle::new(Identity::new("u1", "alice"), capacity);
        handle.transition(ConnectionState::Connecting, ConnectionState::Open);
        (handle, rx)
    }

    #[tokio::test]
    async fn test_ping_queues_and_arms_deadline() {
        let (alice, mut rx) = open(4);
        let mut keep_alive = KeepAlive::new(Duration::from_secs(10));

        send_ping(&alice, &mut keep_alive);

        assert_eq!(rx.try_recv().unwrap(), Outbound::Ping(PING_PAYLOAD.to_vec()));
        assert!(keep_alive.deadline().is_some());
    }

    #[tokio::test]
    async fn test_full_queue_still_arms_deadline() {
        let (alice, _rx) = open(1);
        alice.try_send(Outbound::Frame("backlog".into())).unwrap();
        assert_eq!(
            alice.send_control(Outbound::Ping(Vec::new())),
            Err(SendFailure::Backpressure)
        );

        let mut keep_alive = KeepAlive::new(Duration::from_secs(10));
        send_ping(&alice, &mut keep_alive);
        assert!(keep_alive.deadline().is_some());
    }

    #[tokio::test]
    async fn test_stalled_peer_times_out() {
        let (alice, _rx) = open(1);
        alice.try_send(Outbound::Frame("backlog".into())).unwrap();

        let mut keep_alive = KeepAlive::new(Duration::from_millis(200));
        send_ping(&alice, &mut keep_alive);

        let expired = tokio::time::timeout(
            Duration::from_secs(1),
            wait_for(keep_alive.deadline()),
        )
        .await;
        assert!(expired.is_ok());
    }

    #[test]
    fn test_later_pings_do_not_extend_deadline() {
        let mut keep_alive = KeepAlive::new(Duration::from_secs(10));
        let start = Instant::now();

        keep_alive.pinged(start);
        keep_alive.pinged(start + Duration::from_secs(5));
        assert_eq!(keep_alive.deadline(), Some(start + Duration::from_secs(10)));

        keep_alive.heard_from_peer();
        assert_eq!(keep_alive.deadline(), None);
    }
}
