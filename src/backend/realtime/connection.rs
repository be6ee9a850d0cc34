/**
 * Connection Handle
 *
 * A `ConnectionHandle` is the server-side view of one live WebSocket: its
 * id, the identity bound at handshake, its lifecycle state and its send
 * capability. Handles are cheap to clone; all clones refer to the same
 * connection.
 *
 * # Send Capability
 *
 * Nothing writes to a socket directly. Each connection owns a bounded
 * outbound queue drained by a single writer task, so frames on one
 * connection are never reordered and a broadcaster never waits on a slow
 * client: `try_send` either enqueues immediately or reports why it could not.
 *
 * # Lifecycle State
 *
 * `Connecting → Open → Closing → Closed`. Only the lifecycle manager moves a
 * connection between states; everyone else reads them.
 */

use crate::shared::Identity;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Unique runtime identifier of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Item on a connection's outbound queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Encoded JSON frame
    Frame(String),
    /// Keep-alive ping
    Ping(Vec<u8>),
    /// Close the socket with this code and reason
    Close { code: u16, reason: String },
}

/// Why a frame could not be queued for a connection
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// The outbound queue is full; the frame was dropped
    #[error("outbound queue full")]
    Backpressure,
    /// The connection is closing or closed
    #[error("connection closed")]
    Closed,
}

struct ConnectionInner {
    id: ConnectionId,
    identity: Identity,
    outbound: mpsc::Sender<Outbound>,
    state: AtomicU8,
    connected_at: DateTime<Utc>,
    cancel: CancellationToken,
}

/// Shared handle to one connection
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<ConnectionInner>,
}

impl ConnectionHandle {
    /// Create a connection in the `Connecting` state
    ///
    /// Returns the handle and the receiving end of its outbound queue, which
    /// the caller hands to whatever writes to the client.
    pub fn new(identity: Identity, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        Self::with_id(ConnectionId::new(), identity, capacity)
    }

    pub fn with_id(
        id: ConnectionId,
        identity: Identity,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Outbound>) {
        Self::build(id, identity, capacity, CancellationToken::new())
    }

    pub(crate) fn build(
        id: ConnectionId,
        identity: Identity,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Receiver<Outbound>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            inner: Arc::new(ConnectionInner {
                id,
                identity,
                outbound,
                state: AtomicU8::new(ConnectionState::Connecting as u8),
                connected_at: Utc::now(),
                cancel,
            }),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.inner.connected_at
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Open and its writer is still draining the queue
    pub fn is_writable(&self) -> bool {
        self.state() == ConnectionState::Open && !self.inner.outbound.is_closed()
    }

    /// True if both handles refer to the same connection instance
    pub fn same_connection(&self, other: &ConnectionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Queue a frame without waiting
    pub fn try_send(&self, frame: Outbound) -> Result<(), SendFailure> {
        if self.state() != ConnectionState::Open {
            return Err(SendFailure::Closed);
        }
        self.send_control(frame)
    }

    /// Queue a frame regardless of lifecycle state (close frames during teardown)
    pub(crate) fn send_control(&self, frame: Outbound) -> Result<(), SendFailure> {
        self.inner.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendFailure::Backpressure,
            mpsc::error::TrySendError::Closed(_) => SendFailure::Closed,
        })
    }

    /// Token cancelled when this connection must stop
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    /// Atomically move from `from` to `to`; false if the state was not `from`
    pub(crate) fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.inner
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Move to `Closed` from any earlier state; true only for the first caller
    pub(crate) fn mark_closed(&self) -> bool {
        self.inner.state.swap(ConnectionState::Closed as u8, Ordering::AcqRel)
            != ConnectionState::Closed as u8
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.inner.id)
            .field("identity", &self.inner.identity.display_name)
            .field("state", &self.state())
            .finish()
    }
}
