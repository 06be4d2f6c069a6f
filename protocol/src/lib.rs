//! Shared box model and JSON codec for the realtime workspace protocol.
//!
//! This crate owns the wire representation used by both the server and the
//! `participant` client. Every frame is a JSON object with a `type`
//! discriminator; commands flow client → server, events flow server → clients.
//!
//! DESIGN
//! ======
//! Decoding inspects `type` before the typed parse. Known types must match
//! their schema exactly or the frame is malformed; unknown types decode to an
//! `Unrecognized` variant so callers can log and drop them without treating
//! the frame as an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// FIELD CONSTANTS
// =============================================================================

/// Frame key carrying the message discriminator.
pub const FRAME_TYPE: &str = "type";

/// Prefix of every server-assigned box identifier.
pub const BOX_ID_PREFIX: &str = "box-";

const COMMAND_TYPES: [&str; 3] = ["add_box", "move_box", "delete_box"];
const EVENT_TYPES: [&str; 4] = ["init", "box_added", "box_moved", "box_deleted"];

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned when a frame cannot be decoded or encoded.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON.
    #[error("invalid json: {0}")]
    Json(#[source] serde_json::Error),
    /// The frame is valid JSON but not an object.
    #[error("frame is not a json object")]
    NotAnObject,
    /// The frame has no string `type` field.
    #[error("frame has no string `type` field")]
    MissingType,
    /// The `type` is known but the remaining fields do not match its schema.
    #[error("invalid `{kind}` frame: {source}")]
    Schema {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    /// The value has no wire form (e.g. an `Unrecognized` placeholder).
    #[error("cannot encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

// =============================================================================
// MODEL
// =============================================================================

/// A pair of canvas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A positioned, colored, labeled box on the shared workspace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxItem {
    /// Server-assigned id, `box-<n>`.
    pub id: String,
    /// Color token chosen by the creator. Immutable.
    pub color: String,
    /// Label chosen by the creator. Immutable.
    pub text: String,
    pub position: Position,
    /// Opaque label of the creating participant. Informational only.
    #[serde(rename = "createdBy")]
    pub created_by: String,
}

/// Full workspace contents keyed by box id.
pub type BoxMap = HashMap<String, BoxItem>;

// =============================================================================
// MESSAGES
// =============================================================================

/// Client → server message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    AddBox {
        #[serde(rename = "userId")]
        user_id: String,
        text: String,
        color: String,
        position: Position,
    },
    MoveBox {
        #[serde(rename = "boxId")]
        box_id: String,
        position: Position,
    },
    DeleteBox {
        #[serde(rename = "boxId")]
        box_id: String,
    },
    /// A well-formed frame whose `type` is not part of the vocabulary.
    #[serde(skip)]
    Unrecognized { kind: String },
}

/// Server → client message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Init {
        boxes: BoxMap,
    },
    BoxAdded {
        #[serde(rename = "box")]
        item: BoxItem,
    },
    BoxMoved {
        #[serde(rename = "boxId")]
        box_id: String,
        position: Position,
    },
    BoxDeleted {
        #[serde(rename = "boxId")]
        box_id: String,
    },
    /// A well-formed frame whose `type` is not part of the vocabulary.
    #[serde(skip)]
    Unrecognized { kind: String },
}

impl Command {
    /// Wire name of this command, e.g. `"move_box"`.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::AddBox { .. } => "add_box",
            Self::MoveBox { .. } => "move_box",
            Self::DeleteBox { .. } => "delete_box",
            Self::Unrecognized { kind } => kind,
        }
    }
}

impl Event {
    /// Wire name of this event, e.g. `"box_moved"`.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Init { .. } => "init",
            Self::BoxAdded { .. } => "box_added",
            Self::BoxMoved { .. } => "box_moved",
            Self::BoxDeleted { .. } => "box_deleted",
            Self::Unrecognized { kind } => kind,
        }
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Decode an inbound client frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`], [`CodecError::NotAnObject`] or
/// [`CodecError::MissingType`] for frames without a usable discriminator and
/// [`CodecError::Schema`] for known types with invalid fields.
pub fn decode_command(text: &str) -> Result<Command, CodecError> {
    let (kind, value) = split_frame(text)?;
    if !COMMAND_TYPES.contains(&kind.as_str()) {
        return Ok(Command::Unrecognized { kind });
    }
    serde_json::from_value(value).map_err(|source| CodecError::Schema { kind, source })
}

/// Decode an inbound server frame.
///
/// # Errors
///
/// Same classification as [`decode_command`].
pub fn decode_event(text: &str) -> Result<Event, CodecError> {
    let (kind, value) = split_frame(text)?;
    if !EVENT_TYPES.contains(&kind.as_str()) {
        return Ok(Event::Unrecognized { kind });
    }
    serde_json::from_value(value).map_err(|source| CodecError::Schema { kind, source })
}

/// Encode a server event into a text frame.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] for `Event::Unrecognized`, which has no wire form.
pub fn encode_event(event: &Event) -> Result<String, CodecError> {
    serde_json::to_string(event).map_err(CodecError::Encode)
}

/// Encode a client command into a text frame.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] for `Command::Unrecognized`, which has no wire form.
pub fn encode_command(command: &Command) -> Result<String, CodecError> {
    serde_json::to_string(command).map_err(CodecError::Encode)
}

/// Parse the raw JSON and pull out its `type` discriminator.
fn split_frame(text: &str) -> Result<(String, Value), CodecError> {
    let value: Value = serde_json::from_str(text).map_err(CodecError::Json)?;
    let Some(object) = value.as_object() else {
        return Err(CodecError::NotAnObject);
    };
    let Some(kind) = object.get(FRAME_TYPE).and_then(Value::as_str) else {
        return Err(CodecError::MissingType);
    };
    Ok((kind.to_owned(), value))
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
