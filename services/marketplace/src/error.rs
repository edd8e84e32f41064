//! Error types for the marketplace service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Marketplace operation failure
///
/// Credential problems never reach this type; the identity gate answers them
/// before a handler runs.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller is authenticated but may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Target does not exist, or is not visible to the caller
    #[error("{0}")]
    NotFound(String),

    /// Target is in a state that forbids the transition
    #[error("{0}")]
    Conflict(String),

    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Storage(err) => {
                error!("Storage failure: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
