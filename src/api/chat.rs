//! Conversation endpoints: transcript, status, and the two turn entry points

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::Error;
use crate::config::ModelChoice;
use crate::session::{RETRY_PROMPT, Status, Turn, TurnOutcome};

/// Build conversation router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/transcript", get(transcript))
        .route("/status", get(status))
        .route("/chat", post(chat))
        .route("/listen", post(listen))
        .with_state(state)
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: Status,
    /// Whether the last assistant reply is currently being spoken; the UI
    /// polls this to drive its speaking indicator
    pub speaking: bool,
}

/// Text-mode turn request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
    /// UI model selector; unknown values fall back to the standard profile
    #[serde(default)]
    pub model: Option<String>,
}

/// Voice-mode turn request
#[derive(Debug, Default, Deserialize)]
pub struct ListenRequest {
    /// UI model selector; unknown values fall back to the standard profile
    #[serde(default)]
    pub model: Option<String>,
}

/// Turn result rendered back to the UI
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnResponse {
    Replied { user: String, assistant: String },
    NothingHeard { message: &'static str },
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        match outcome {
            TurnOutcome::Replied { user, assistant } => Self::Replied { user, assistant },
            TurnOutcome::NothingHeard => Self::NothingHeard {
                message: RETRY_PROMPT,
            },
        }
    }
}

/// Full transcript, oldest turn first
async fn transcript(State(state): State<Arc<ApiState>>) -> Json<Vec<Turn>> {
    Json(state.session.transcript())
}

/// Current pipeline stage and speaking flag
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.session.status(),
        speaking: state.session.is_speaking(),
    })
}

/// Run a text-mode turn
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TurnResponse>, TurnError> {
    let model = model_choice(request.model.as_deref());
    let outcome = state.session.text_turn(&request.text, model).await?;
    Ok(Json(outcome.into()))
}

/// Record from the microphone and run a voice turn
async fn listen(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ListenRequest>,
) -> Result<Json<TurnResponse>, TurnError> {
    let model = model_choice(request.model.as_deref());
    let outcome = state.session.voice_turn(model).await?;
    Ok(Json(outcome.into()))
}

fn model_choice(selector: Option<&str>) -> ModelChoice {
    selector.map(ModelChoice::from_selector).unwrap_or_default()
}

/// Turn entry errors surfaced to the UI
#[derive(Debug)]
pub enum TurnError {
    Busy,
    Internal(String),
}

impl From<Error> for TurnError {
    fn from(e: Error) -> Self {
        match e {
            Error::TurnInProgress => Self::Busy,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for TurnError {
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
            Self::Busy => (
                StatusCode::CONFLICT,
                "turn_in_progress",
                "a turn is already in progress".to_string(),
            ),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, "turn_failed", message),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}
