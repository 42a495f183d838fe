//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message returned for every generation failure, whatever the cause
pub const UPSTREAM_FAILURE_DETAIL: &str = "Failed to get a response from the AI model.";

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable message
    #[schema(example = "Failed to get a response from the AI model.")]
    pub detail: String,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body could not be decoded or failed validation
    #[error("{0}")]
    Validation(String),

    /// Generation service failed; details stay in the logs
    #[error("upstream failure")]
    Upstream,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, ApiError::new(msg)),
            AppError::Upstream => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new(UPSTREAM_FAILURE_DETAIL),
            ),
        };

        (status, Json(error)).into_response()
    }
}
