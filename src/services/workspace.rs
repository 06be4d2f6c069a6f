//! Workspace service: the authoritative box store.
//!
//! DESIGN
//! ======
//! `Workspace` is a plain single-owner struct. It lives behind one mutex in
//! `AppState`, so every create/move/delete is applied one at a time.
//! `apply_command` publishes the resulting event before releasing that mutex,
//! which makes broadcast order identical to application order.
//!
//! Move and delete of an unknown id are silent no-ops: no error, no event.
//! Concurrent moves of the same box resolve by application order (LWW).

use protocol::{BOX_ID_PREFIX, BoxItem, BoxMap, Command, Event, Position};
use tracing::debug;

use crate::services::broadcast;
use crate::state::AppState;

// =============================================================================
// STORE
// =============================================================================

/// In-memory box store. Process-lifetime only.
#[derive(Debug)]
pub struct Workspace {
    boxes: BoxMap,
    /// Next counter value handed to `create`. Never decremented, so ids are
    /// not reused after a delete.
    next_id: u64,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        Self { boxes: BoxMap::new(), next_id: 1 }
    }

    /// Create a box with a fresh id. Never fails.
    pub fn create(
        &mut self,
        color: impl Into<String>,
        text: impl Into<String>,
        position: Position,
        creator: impl Into<String>,
    ) -> BoxItem {
        let id = format!("{BOX_ID_PREFIX}{}", self.next_id);
        self.next_id += 1;

        let item = BoxItem { id, color: color.into(), text: text.into(), position, created_by: creator.into() };
        self.boxes.insert(item.id.clone(), item.clone());
        item
    }

    /// Overwrite a box position. Returns `false` if the id is unknown.
    pub fn move_box(&mut self, id: &str, position: Position) -> bool {
        let Some(item) = self.boxes.get_mut(id) else {
            return false;
        };
        item.position = position;
        true
    }

    /// Remove a box. Returns the removed box, or `None` if the id is unknown.
    pub fn delete(&mut self, id: &str) -> Option<BoxItem> {
        self.boxes.remove(id)
    }

    /// Copy of the full current state.
    #[must_use]
    pub fn snapshot(&self) -> BoxMap {
        self.boxes.clone()
    }

    /// Apply one decoded command and return the event to publish, if any.
    ///
    /// `None` means the workspace did not change: an unknown id or an
    /// unrecognized command.
    pub fn apply(&mut self, command: Command) -> Option<Event> {
        match command {
            Command::AddBox { user_id, text, color, position } => {
                let item = self.create(color, text, position, user_id);
                Some(Event::BoxAdded { item })
            }
            Command::MoveBox { box_id, position } => {
                self.move_box(&box_id, position)
                    .then_some(Event::BoxMoved { box_id, position })
            }
            Command::DeleteBox { box_id } => self
                .delete(&box_id)
                .map(|_| Event::BoxDeleted { box_id }),
            Command::Unrecognized { .. } => None,
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// What happened to one applied command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The workspace changed and the event was queued for `delivered` channels.
    Published { kind: String, delivered: usize },
    /// The command referenced an unknown id or was unrecognized.
    Unchanged,
}

/// Apply a command under the store lock and publish its event.
pub async fn apply_command(state: &AppState, command: Command) -> Applied {
    let mut workspace = state.workspace.lock().await;

    let command_kind = command.kind().to_owned();
    let Some(event) = workspace.apply(command) else {
        debug!(command = %command_kind, "workspace: no-op command");
        return Applied::Unchanged;
    };

    let kind = event.kind().to_owned();
    // Publish while still holding the store lock to keep a single total order.
    let delivered = broadcast::publish(&state.registry, &event).await;
    drop(workspace);

    Applied::Published { kind, delivered }
}

/// Full current state for the read-only query surface.
pub async fn snapshot(state: &AppState) -> BoxMap {
    state.workspace.lock().await.snapshot()
}

#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;
