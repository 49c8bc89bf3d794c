use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::transport::TransportError;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Recommendation service error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Transport(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::Transport(_) | AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
        };

        let message = match self {
            AppError::InvalidInput(msg) | AppError::ExternalApi(msg) => msg,
            AppError::Transport(_) => self.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
