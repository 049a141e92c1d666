//! Chat endpoints: history, typed turns, spoken turns

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::controller::TurnOutcome;
use crate::conversation::{Speaker, Utterance};

/// Longest accepted typed message, in characters
pub const MAX_INPUT_CHARS: usize = 4000;

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/history", get(history))
        .route("/chat", post(chat))
        .route("/speak", post(speak))
        .with_state(state)
}

/// One transcript line as rendered by the page
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub label: &'static str,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl From<&Utterance> for HistoryEntry {
    fn from(u: &Utterance) -> Self {
        Self {
            speaker: u.speaker(),
            label: u.speaker().label(),
            text: u.text().to_string(),
            at: u.at(),
        }
    }
}

/// Transcript response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Present only while the transcript is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<&'static str>,
    pub entries: Vec<HistoryEntry>,
}

async fn history(State(state): State<Arc<ApiState>>) -> Json<HistoryResponse> {
    let controller = state.controller.lock().await;
    Json(HistoryResponse {
        greeting: controller.greeting(),
        entries: controller.history().iter().map(HistoryEntry::from).collect(),
    })
}

/// Typed message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TurnOutcome>, ChatError> {
    if request.text.chars().count() > MAX_INPUT_CHARS {
        return Err(ChatError::BadRequest("message too long"));
    }

    let mut controller = state.controller.lock().await;
    Ok(Json(controller.submit_text(&request.text).await))
}

async fn speak(State(state): State<Arc<ApiState>>) -> Result<Json<TurnOutcome>, ChatError> {
    if !state.voice_available {
        return Err(ChatError::NotConfigured("voice input is not configured"));
    }

    let mut controller = state.controller.lock().await;
    Ok(Json(controller.speak().await))
}

/// Chat API errors
#[derive(Debug)]
pub enum ChatError {
    NotConfigured(&'static str),
    BadRequest(&'static str),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    code,
                    message: message.to_string(),
                },
            }),
        )
            .into_response()
    }
}
