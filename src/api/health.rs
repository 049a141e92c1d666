//! Health and status endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use uuid::Uuid;

use super::ApiState;
use crate::controller::TurnState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness check
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Session status
#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub session_id: Uuid,
    pub model: String,
    /// A turn is in progress
    pub busy: bool,
    /// Current turn state, when no turn holds the controller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TurnState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    pub voice_available: bool,
    pub emotion_enabled: bool,
}

async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    // Never wait behind a running turn
    let (busy, turn_state, entries) = match state.controller.try_lock() {
        Ok(controller) => (false, Some(controller.state()), Some(controller.store().len())),
        Err(_) => (true, None, None),
    };

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        session_id: state.session_id,
        model: state.model.clone(),
        busy,
        state: turn_state,
        entries,
        voice_available: state.voice_available,
        emotion_enabled: state.emotion_enabled,
    })
}

/// Build status router (needs state)
pub fn status_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .with_state(state)
}
