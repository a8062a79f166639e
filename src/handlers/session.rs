use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::AppState;
use crate::metrics;
use crate::session::SearchState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Uuid,
    #[serde(flatten)]
    pub state: SearchState,
}

/// Handle GET /api/session/:id
///
/// Returns the committed search state for a session: the current sequence
/// number and phase (idle/loading/loaded/empty/failed).
pub async fn session_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let started = Instant::now();
    metrics::record_request("/api/session");

    let search_state = state.sessions.get(&id).ok_or_else(|| {
        metrics::record_error("/api/session", "session_not_found");
        AppError::SessionNotFound(format!("No search session with id {}", id))
    })?;

    metrics::record_duration("/api/session", started.elapsed());
    Ok(Json(SessionResponse {
        session: id,
        state: search_state,
    }))
}
