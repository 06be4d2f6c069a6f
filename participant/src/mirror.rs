//! Local mirror of the shared workspace.
//!
//! SYSTEM CONTEXT
//! ==============
//! A participant keeps its own copy of every box and folds server events
//! into it. The mirror converges on the server's state once all broadcasts
//! have been applied; it may lead the server while a drag is in progress.
//!
//! DRAG LIFECYCLE
//! ==============
//! `begin_drag` → `drag_to`* → `end_drag`. Drag positions are written into
//! the mirror immediately. `end_drag` returns the `move_box` command to send;
//! the server's `box_moved` echo is the confirmation. Broadcasts that arrive
//! mid-drag are applied as they come, so whichever event is processed last
//! decides the final position.

use protocol::{BoxItem, BoxMap, Command, Event, Position};
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mirror {
    boxes: BoxMap,
    /// Id of the box being dragged locally, if any.
    dragging: Option<String>,
}

impl Mirror {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one server event into the mirror. Returns whether anything changed.
    pub fn apply(&mut self, event: Event) -> bool {
        match event {
            Event::Init { boxes } => {
                self.boxes = boxes;
                if self
                    .dragging
                    .as_ref()
                    .is_some_and(|id| !self.boxes.contains_key(id))
                {
                    self.dragging = None;
                }
                true
            }
            Event::BoxAdded { item } => {
                let changed = self.boxes.get(&item.id) != Some(&item);
                self.boxes.insert(item.id.clone(), item);
                changed
            }
            Event::BoxMoved { box_id, position } => self.set_position(&box_id, position),
            Event::BoxDeleted { box_id } => {
                if self.dragging.as_deref() == Some(box_id.as_str()) {
                    self.dragging = None;
                }
                self.boxes.remove(&box_id).is_some()
            }
            Event::Unrecognized { kind } => {
                debug!(kind = %kind, "mirror: ignoring unknown event");
                false
            }
        }
    }

    // =========================================================================
    // DRAG
    // =========================================================================

    /// Start dragging a box. Returns `false` if the box is unknown.
    pub fn begin_drag(&mut self, box_id: &str) -> bool {
        if !self.boxes.contains_key(box_id) {
            return false;
        }
        self.dragging = Some(box_id.to_owned());
        true
    }

    /// Optimistically move the dragged box. Returns `false` if no drag is active.
    pub fn drag_to(&mut self, position: Position) -> bool {
        let Some(box_id) = self.dragging.clone() else {
            return false;
        };
        self.set_position(&box_id, position);
        true
    }

    /// Finish the drag and build the command that makes it authoritative.
    ///
    /// Returns `None` if no drag is active or the box vanished meanwhile.
    pub fn end_drag(&mut self) -> Option<Command> {
        let box_id = self.dragging.take()?;
        let position = self.boxes.get(&box_id)?.position;
        Some(Command::MoveBox { box_id, position })
    }

    /// Drop the drag without producing a command. The local position stays
    /// until the next server event for the box.
    pub fn cancel_drag(&mut self) {
        self.dragging = None;
    }

    #[must_use]
    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    // =========================================================================
    // READ
    // =========================================================================

    #[must_use]
    pub fn boxes(&self) -> &BoxMap {
        &self.boxes
    }

    #[must_use]
    pub fn get(&self, box_id: &str) -> Option<&BoxItem> {
        self.boxes.get(box_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Overwrite a known box position. Unknown ids are ignored.
    fn set_position(&mut self, box_id: &str, position: Position) -> bool {
        let Some(item) = self.boxes.get_mut(box_id) else {
            debug!(box_id, "mirror: position for unknown box");
            return false;
        };
        let changed = item.position != position;
        item.position = position;
        changed
    }
}

#[cfg(test)]
#[path = "mirror_test.rs"]
mod tests;
