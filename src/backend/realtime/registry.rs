/**
 * Connection Registry
 *
 * The set of all currently open connections, the only mutable state shared
 * between connection tasks.
 *
 * # Single Owner
 *
 * The map lives inside one tokio task. `ConnectionRegistry` is a cheap,
 * cloneable handle that sends commands to that task over an mpsc channel and
 * awaits the answer on a oneshot. Because exactly one task ever touches the
 * map, concurrent register / unregister / iterate calls are serialized by
 * construction and nobody can observe a half-updated entry.
 *
 * # Iteration
 *
 * `for_each_open` visits a snapshot taken when the command is served.
 * Entries are re-checked for writability at visit time, so a connection that
 * closes mid-iteration is skipped rather than delivered to. A connection
 * registered after the snapshot is simply not visited.
 *
 * # Duplicate Ids
 *
 * `register` with an id that is already present replaces the entry and hands
 * the old handle back. The old connection is left to close through its own
 * lifecycle; `release` (used by the lifecycle manager) only removes an entry
 * if it is still that exact connection, so a stale connection can never evict
 * its replacement.
 */

use crate::backend::realtime::connection::{ConnectionHandle, ConnectionId};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Depth of the registry's command queue
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// The registry task is not running
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection registry is closed")]
    Closed,
}

enum Command {
    Register {
        connection: ConnectionHandle,
        reply: oneshot::Sender<Option<ConnectionHandle>>,
    },
    Unregister {
        id: ConnectionId,
        reply: oneshot::Sender<Option<ConnectionHandle>>,
    },
    Release {
        connection: ConnectionHandle,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<ConnectionHandle>>,
    },
    Drain {
        reply: oneshot::Sender<Vec<ConnectionHandle>>,
    },
}

/// Handle to the registry task
///
/// Must be created inside a tokio runtime. The task stops once every clone
/// of the handle has been dropped.
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    commands: mpsc::Sender<Command>,
}

impl ConnectionRegistry {
    /// Start the registry task and return a handle to it
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        tokio::spawn(run_registry(rx));
        Self { commands }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RegistryError> {
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| RegistryError::Closed)?;
        answer.await.map_err(|_| RegistryError::Closed)
    }

    /// Insert a connection, returning the entry it replaced, if any
    pub async fn register(
        &self,
        connection: ConnectionHandle,
    ) -> Result<Option<ConnectionHandle>, RegistryError> {
        self.request(|reply| Command::Register { connection, reply })
            .await
    }

    /// Remove the entry for `id`; false if there was none
    ///
    /// Idempotent: removing an absent id is a no-op.
    pub async fn unregister(&self, id: ConnectionId) -> Result<bool, RegistryError> {
        let removed = self
            .request(|reply| Command::Unregister { id, reply })
            .await?;
        Ok(removed.is_some())
    }

    /// Remove `connection` only if the entry under its id is that very connection
    pub async fn release(&self, connection: &ConnectionHandle) -> Result<bool, RegistryError> {
        let connection = connection.clone();
        self.request(|reply| Command::Release { connection, reply })
            .await
    }

    /// Every registered connection at this instant, in no particular order
    pub async fn snapshot(&self) -> Result<Vec<ConnectionHandle>, RegistryError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Visit every open, writable connection; returns the number visited
    pub async fn for_each_open<F>(&self, mut visitor: F) -> Result<usize, RegistryError>
    where
        F: FnMut(&ConnectionHandle),
    {
        let snapshot = self.snapshot().await?;
        let mut visited = 0;
        for connection in snapshot.iter().filter(|c| c.is_writable()) {
            visitor(connection);
            visited += 1;
        }
        Ok(visited)
    }

    /// Open connections bound to `name` (display name or user id)
    pub async fn find_by_identity(
        &self,
        name: &str,
    ) -> Result<Vec<ConnectionHandle>, RegistryError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .into_iter()
            .filter(|c| c.is_writable() && c.identity().answers_to(name))
            .collect())
    }

    pub async fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.snapshot().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.len().await? == 0)
    }

    /// Remove and return every entry (server shutdown)
    pub async fn drain(&self) -> Result<Vec<ConnectionHandle>, RegistryError> {
        self.request(|reply| Command::Drain { reply }).await
    }
}

async fn run_registry(mut commands: mpsc::Receiver<Command>) {
    let mut connections: HashMap<ConnectionId, ConnectionHandle> = HashMap::new();
    tracing::debug!("[Registry] Started");

    // replies are best-effort: a caller that gave up waiting is not an error
    while let Some(command) = commands.recv().await {
        match command {
            Command::Register { connection, reply } => {
                let id = connection.id();
                let previous = connections.insert(id, connection);
                if previous.is_some() {
                    tracing::warn!(connection_id = %id, "[Registry] Replaced stale entry");
                }
                tracing::debug!(
                    connection_id = %id,
                    connections = connections.len(),
                    "[Registry] Connection registered"
                );
                let _ = reply.send(previous);
            }
            Command::Unregister { id, reply } => {
                let removed = connections.remove(&id);
                if removed.is_some() {
                    tracing::debug!(
                        connection_id = %id,
                        connections = connections.len(),
                        "[Registry] Connection unregistered"
                    );
                }
                let _ = reply.send(removed);
            }
            Command::Release { connection, reply } => {
                let id = connection.id();
                let owned = connections
                    .get(&id)
                    .map(|entry| entry.same_connection(&connection))
                    .unwrap_or(false);
                if owned {
                    connections.remove(&id);
                    tracing::debug!(
                        connection_id = %id,
                        connections = connections.len(),
                        "[Registry] Connection released"
                    );
                }
                let _ = reply.send(owned);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(connections.values().cloned().collect());
            }
            Command::Drain { reply } => {
                let drained: Vec<_> = connections.drain().map(|(_, c)| c).collect();
                tracing::info!(connections = drained.len(), "[Registry] Drained");
                let _ = reply.send(drained);
            }
        }
    }

    tracing::debug!("[Registry] Stopped");
}
