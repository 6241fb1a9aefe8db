use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::screening::pipeline::Stage;

/// Error returned by a screening capability call that could not be completed.
///
/// Item-level failures (one resume, one candidate) never surface as a
/// `BackendError`; backends fold them into the batch output.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network failure, timeout, or a non-success status.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The call completed but the body is not the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<LlmError> for BackendError {
    fn from(e: LlmError) -> Self {
        if e.is_transport() {
            BackendError::Transport(e.to_string())
        } else {
            BackendError::MalformedResponse(e.to_string())
        }
    }
}

/// Run-level failure of the screening pipeline. Any of these leaves the run
/// terminal with an empty ranked list.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Stage {} ({}) failed: {message}", .stage.number(), .stage.label())]
    Transport { stage: Stage, message: String },

    #[error("Stage {} ({}) returned an unusable response: {message}", .stage.number(), .stage.label())]
    MalformedResponse { stage: Stage, message: String },

    #[error("Run cancelled before stage {} ({})", .stage.number(), .stage.label())]
    Cancelled { stage: Stage },
}

impl PipelineError {
    pub fn at_stage(stage: Stage, error: BackendError) -> Self {
        match error {
            BackendError::Transport(message) => PipelineError::Transport { stage, message },
            BackendError::MalformedResponse(message) => {
                PipelineError::MalformedResponse { stage, message }
            }
        }
    }

    /// The stage the run stopped at, if it got past validation.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Validation(_) => None,
            PipelineError::Transport { stage, .. }
            | PipelineError::MalformedResponse { stage, .. }
            | PipelineError::Cancelled { stage } => Some(*stage),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Pipeline(e) => match e {
                PipelineError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                PipelineError::Transport { .. } => {
                    tracing::error!("Screening run failed: {e}");
                    (StatusCode::BAD_GATEWAY, "TRANSPORT_ERROR", e.to_string())
                }
                PipelineError::MalformedResponse { .. } => {
                    tracing::error!("Screening run failed: {e}");
                    (StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE", e.to_string())
                }
                PipelineError::Cancelled { .. } => {
                    (StatusCode::CONFLICT, "RUN_CANCELLED", e.to_string())
                }
            },
            AppError::Backend(e) => {
                tracing::error!("Backend error: {e}");
                let code = match e {
                    BackendError::Transport(_) => "TRANSPORT_ERROR",
                    BackendError::MalformedResponse(_) => "MALFORMED_RESPONSE",
                };
                (StatusCode::BAD_GATEWAY, code, e.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
