//! Read-only box query.

use axum::Json;
use axum::extract::State;
use protocol::BoxMap;

use crate::services::workspace;
use crate::state::AppState;

/// `GET /api/boxes` returns the full current workspace keyed by box id. No side effects.
pub async fn list_boxes(State(state): State<AppState>) -> Json<BoxMap> {
    Json(workspace::snapshot(&state).await)
}

#[cfg(test)]
#[path = "boxes_test.rs"]
mod tests;
