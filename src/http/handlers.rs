use super::state::AppState;
use crate::session::{ConnectionId, SessionStats};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub active_sessions: usize,
    pub connections: Vec<ConnectionId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /translator/sessions
/// List connections with a live translation session
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let mut connections = state.sessions.ids().await;
    connections.sort_by(|a, b| a.0.cmp(&b.0));

    Json(SessionListResponse {
        active_sessions: connections.len(),
        connections,
    })
}

/// GET /translator/sessions/:connection_id
/// Get status of a translation session
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(connection_id): Path<String>,
) -> impl IntoResponse {
    let connection_id = ConnectionId(connection_id);

    match state.sessions.stats(&connection_id).await {
        Some(stats) => (StatusCode::OK, Json::<SessionStats>(stats)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", connection_id),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
