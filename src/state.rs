//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the single workspace store and the connection registry. The
//! store mutex is the one serialization point for mutations; the registry
//! lock is only ever taken after it, never before.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::config::DEFAULT_CLIENT_QUEUE_CAPACITY;
use crate::services::registry::Registry;
use crate::services::workspace::Workspace;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<Mutex<Workspace>>,
    pub registry: Arc<RwLock<Registry>>,
    /// Bound of each session's outbound queue.
    pub client_queue_capacity: usize,
}

impl AppState {
    #[must_use]
    pub fn new(client_queue_capacity: usize) -> Self {
        Self {
            workspace: Arc::new(Mutex::new(Workspace::new())),
            registry: Arc::new(RwLock::new(Registry::new())),
            client_queue_capacity,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_QUEUE_CAPACITY)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::services::registry::Outbound;
    use protocol::{BoxItem, Position};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    /// Create an empty test `AppState`.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(32)
    }

    /// Register a raw channel without an `init` frame and return its receiver.
    pub async fn register_client(state: &AppState) -> (Uuid, mpsc::Receiver<Outbound>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(32);
        state.registry.write().await.register(conn_id, tx);
        (conn_id, rx)
    }

    /// Create a box directly in the store, bypassing broadcast.
    pub async fn seed_box(state: &AppState, text: &str, x: f64, y: f64) -> BoxItem {
        state
            .workspace
            .lock()
            .await
            .create("#4ECDC4", text, Position::new(x, y), "seed")
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
