//! WebSocket handler: one participant session.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection ID, joins the registry (which queues
//! the `init` snapshot first) and enters a `select!` loop:
//! - Incoming client frames → decode + apply to the workspace store
//! - Queued frames (init + broadcasts) → forward to the client
//!
//! The handler never sends to peers itself. The workspace service publishes
//! every state change to all registered channels, this one included, so the
//! sender sees its own change in the same order as everyone else.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → join (snapshot + register) → session is open
//! 2. Text frame → decode → apply → publish on change
//! 3. Close, socket error or a closed outbound queue → part → session is
//!    closed for good
//!
//! A malformed or unrecognized frame is logged and dropped; it never ends
//! the session.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use protocol::{CodecError, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::registry::Outbound;
use crate::services::workspace::Applied;
use crate::services::{registry, workspace};
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// What processing one inbound frame did. Returned for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    /// The store changed and the event was queued for `delivered` channels.
    Published { kind: String, delivered: usize },
    /// Valid command for an unknown id. Nothing published.
    Unchanged,
    /// Well-formed frame with a `type` outside the vocabulary.
    Unrecognized(String),
    /// Frame could not be decoded.
    Malformed,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();

    // Per-connection queue for the init frame and every broadcast.
    let (client_tx, mut client_rx) = mpsc::channel::<Outbound>(state.client_queue_capacity);

    if let Err(e) = registry::join(&state, conn_id, client_tx).await {
        warn!(%conn_id, error = %e, "ws: join failed");
        return;
    }
    info!(%conn_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let outcome = process_inbound_text(&state, conn_id, text.as_str()).await;
                        log_outcome(conn_id, &outcome);
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            frame = client_rx.recv() => {
                let Some(frame) = frame else {
                    // Dropped from the registry for falling behind.
                    warn!(%conn_id, "ws: outbound queue closed, ending session");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    registry::part(&state, conn_id).await;
    info!(%conn_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode and apply one inbound text frame.
///
/// Kept apart from the socket loop so tests can drive dispatch directly.
async fn process_inbound_text(state: &AppState, conn_id: Uuid, text: &str) -> Outcome {
    let command = match protocol::decode_command(text) {
        Ok(command) => command,
        Err(e) => {
            log_malformed(conn_id, &e);
            return Outcome::Malformed;
        }
    };

    if let Command::Unrecognized { kind } = command {
        return Outcome::Unrecognized(kind);
    }

    debug!(%conn_id, kind = command.kind(), "ws: recv frame");
    match workspace::apply_command(state, command).await {
        Applied::Published { kind, delivered } => Outcome::Published { kind, delivered },
        Applied::Unchanged => Outcome::Unchanged,
    }
}

fn log_malformed(conn_id: Uuid, err: &CodecError) {
    warn!(%conn_id, error = %err, "ws: invalid inbound frame");
}

fn log_outcome(conn_id: Uuid, outcome: &Outcome) {
    match outcome {
        Outcome::Published { kind, delivered } => {
            info!(%conn_id, kind = %kind, delivered, "ws: published");
        }
        Outcome::Unchanged => debug!(%conn_id, "ws: command referenced unknown box"),
        Outcome::Unrecognized(kind) => warn!(%conn_id, kind = %kind, "ws: unrecognized frame type"),
        // Already logged with the codec error.
        Outcome::Malformed => {}
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
