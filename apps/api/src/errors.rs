use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::dialogue::DialogueError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DialogueError> for AppError {
    fn from(err: DialogueError) -> Self {
        match err {
            DialogueError::Validation { .. } => AppError::Validation(err.to_string()),
            DialogueError::InvalidState { .. } | DialogueError::AwaitingFinish => {
                AppError::InvalidState(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidState(msg) => {
                tracing::warn!("Rejected out-of-order request: {msg}");
                (StatusCode::CONFLICT, "INVALID_STATE", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::Phase;

    #[test]
    fn test_dialogue_errors_map_to_status_codes() {
        let validation: AppError = DialogueError::Validation {
            missing: vec!["email"],
        }
        .into();
        assert_eq!(validation.into_response().status(), StatusCode::BAD_REQUEST);

        let invalid: AppError = DialogueError::InvalidState {
            operation: "finish",
            phase: Phase::Completed,
        }
        .into();
        assert_eq!(invalid.into_response().status(), StatusCode::CONFLICT);

        let awaiting: AppError = DialogueError::AwaitingFinish.into();
        assert_eq!(awaiting.into_response().status(), StatusCode::CONFLICT);
    }
}
