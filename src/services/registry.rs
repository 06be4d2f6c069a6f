//! Registry service: the set of open participant channels, plus join/part.
//!
//! DESIGN
//! ======
//! The registry maps a server-assigned connection id to the sending half of
//! that session's outbound queue. It knows nothing about sockets: the
//! session task owns the socket and drains the queue.
//!
//! `join` takes the snapshot and registers the channel under the store
//! lock, so the `init` frame is always first in the queue and no mutation
//! falls between the snapshot and the first broadcast.

use std::collections::HashMap;
use std::sync::Arc;

use protocol::Event;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::AppState;

/// One serialized frame, shared by every channel it is queued on.
pub type Outbound = Arc<str>;

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Default)]
pub struct Registry {
    clients: HashMap<Uuid, mpsc::Sender<Outbound>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel. Re-registering an id replaces its sender.
    pub fn register(&mut self, conn_id: Uuid, tx: mpsc::Sender<Outbound>) {
        self.clients.insert(conn_id, tx);
    }

    /// Remove a channel. Returns `false` if it was not registered.
    pub fn unregister(&mut self, conn_id: Uuid) -> bool {
        self.clients.remove(&conn_id).is_some()
    }

    /// Currently registered channels.
    pub fn all(&self) -> impl Iterator<Item = (Uuid, &mpsc::Sender<Outbound>)> {
        self.clients.iter().map(|(id, tx)| (*id, tx))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

// =============================================================================
// JOIN / PART
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("failed to encode init frame: {0}")]
    Encode(#[from] protocol::CodecError),
    #[error("session queue closed before init was queued")]
    QueueClosed,
}

/// Queue an `init` snapshot on `tx` and register it.
///
/// Returns the number of boxes in the snapshot.
///
/// # Errors
///
/// Returns [`JoinError`] if the snapshot cannot be encoded or queued; the
/// channel is not registered in that case.
pub async fn join(state: &AppState, conn_id: Uuid, tx: mpsc::Sender<Outbound>) -> Result<usize, JoinError> {
    let workspace = state.workspace.lock().await;

    let boxes = workspace.snapshot();
    let count = boxes.len();
    let frame: Outbound = protocol::encode_event(&Event::Init { boxes })?.into();
    tx.try_send(frame).map_err(|_| JoinError::QueueClosed)?;

    let mut registry = state.registry.write().await;
    registry.register(conn_id, tx);
    info!(%conn_id, clients = registry.len(), boxes = count, "client joined");
    drop(registry);
    drop(workspace);

    Ok(count)
}

/// Unregister a channel. Idempotent: a session evicted by broadcast is
/// already gone when its handler parts.
pub async fn part(state: &AppState, conn_id: Uuid) {
    let mut registry = state.registry.write().await;
    if registry.unregister(conn_id) {
        info!(%conn_id, remaining = registry.len(), "client left");
    } else {
        debug!(%conn_id, "part for client no longer registered");
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
