/**
 * Connection Lifecycle Manager
 *
 * The only component that moves a connection between states and the only
 * one that adds or removes registry entries.
 *
 * ```text
 * accept ──► Connecting ──open──► Open ──close──► Closed
 *                 │                               ▲
 *                 └────────────close──────────────┘
 * ```
 *
 * - `open` registers the connection exactly at `Connecting → Open`
 * - `close` may be called any number of times from any task (reader loop on
 *   client close or channel error, keep-alive timeout, server shutdown); the
 *   first call unregisters and cancels, the rest are no-ops
 * - `Closed` is terminal
 *
 * Every connection's cancellation token is a child of the manager's shutdown
 * token, so `shutdown` stops all of them at once.
 */

use crate::backend::error::RealtimeError;
use crate::backend::realtime::connection::{
    ConnectionHandle, ConnectionId, ConnectionState, Outbound,
};
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::shared::Identity;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Server going away (shutdown, unresponsive peer)
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Server hit an unexpected condition
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Why a connection is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCause {
    /// The client sent a close frame or the stream ended
    ClientClosed,
    /// The underlying channel failed
    Fault,
    /// No pong within the keep-alive timeout
    KeepAliveTimeout,
    /// The server is shutting down
    Shutdown,
}

impl CloseCause {
    /// Close frame the server sends for this cause, if any
    pub fn close_frame(&self) -> Option<(u16, &'static str)> {
        match self {
            // the transport answers the client's own close frame
            Self::ClientClosed => None,
            Self::Fault => Some((CLOSE_INTERNAL_ERROR, "connection error")),
            Self::KeepAliveTimeout => Some((CLOSE_GOING_AWAY, "keep-alive timeout")),
            Self::Shutdown => Some((CLOSE_GOING_AWAY, "server shutting down")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleManager {
    registry: ConnectionRegistry,
    shutdown: CancellationToken,
    queue_capacity: usize,
}

impl LifecycleManager {
    pub fn new(registry: ConnectionRegistry, queue_capacity: usize) -> Self {
        Self {
            registry,
            shutdown: CancellationToken::new(),
            queue_capacity,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// True once `shutdown` has started
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Create a `Connecting` connection for a verified identity
    ///
    /// Returns the handle and the receiving end of its outbound queue.
    pub fn accept(&self, identity: Identity) -> (ConnectionHandle, mpsc::Receiver<Outbound>) {
        ConnectionHandle::build(
            ConnectionId::new(),
            identity,
            self.queue_capacity,
            self.shutdown.child_token(),
        )
    }

    /// Move a connection to `Open` and register it
    pub async fn open(&self, connection: &ConnectionHandle) -> Result<(), RealtimeError> {
        if self.is_shutting_down() {
            connection.mark_closed();
            return Err(RealtimeError::fault("server is shutting down"));
        }
        if !connection.transition(ConnectionState::Connecting, ConnectionState::Open) {
            return Err(RealtimeError::fault(format!(
                "connection is {:?}, not connecting",
                connection.state()
            )));
        }

        if let Err(e) = self.registry.register(connection.clone()).await {
            connection.mark_closed();
            return Err(e.into());
        }

        tracing::info!(
            connection_id = %connection.id(),
            user = %connection.identity(),
            "[Realtime] Connection opened"
        );
        Ok(())
    }

    /// Close a connection; true only for the call that actually closed it
    pub async fn close(&self, connection: &ConnectionHandle, cause: CloseCause) -> bool {
        if !connection.mark_closed() {
            return false;
        }

        // no-op for a connection that never opened or was already drained
        if let Err(e) = self.registry.release(connection).await {
            tracing::warn!(
                connection_id = %connection.id(),
                error = %e,
                "[Realtime] Could not unregister connection"
            );
        }

        if let Some((code, reason)) = cause.close_frame() {
            let _ = connection.send_control(Outbound::Close {
                code,
                reason: reason.to_string(),
            });
        }
        connection.cancel_token().cancel();

        tracing::info!(
            connection_id = %connection.id(),
            user = %connection.identity(),
            cause = ?cause,
            "[Realtime] Connection closed"
        );
        true
    }

    /// Close every registered connection and refuse new ones
    pub async fn shutdown(&self) -> usize {
        self.shutdown.cancel();

        let connections = match self.registry.drain().await {
            Ok(connections) => connections,
            Err(e) => {
                tracing::warn!(error = %e, "[Realtime] Registry unavailable during shutdown");
                return 0;
            }
        };

        let mut closed = 0;
        for connection in &connections {
            if self.close(connection, CloseCause::Shutdown).await {
                closed += 1;
            }
        }

        tracing::info!(closed, "[Realtime] All connections closed");
        closed
    }
}
