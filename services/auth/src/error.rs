//! Identity gate errors and their HTTP mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::jwt::TokenError;

/// Failure to resolve a bearer credential into a principal in good standing
#[derive(Debug, Error)]
pub enum GateError {
    /// No credential was presented
    #[error("Unauthorized")]
    Unauthenticated,

    /// The credential failed verification, for whatever reason
    #[error("Unauthorized")]
    Unauthorized,

    /// Principal exists but its standing forbids the operation
    #[error("{0}")]
    Forbidden(&'static str),

    /// Token subject no longer exists
    #[error("{0}")]
    NotFound(&'static str),

    /// Malformed request, e.g. a refresh call without a token
    #[error("{0}")]
    BadRequest(&'static str),

    /// Signing secret misconfiguration
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// Principal lookup failed
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<TokenError> for GateError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::Expired => GateError::Unauthorized,
            TokenError::Signing(reason) => GateError::Signing(reason),
        }
    }
}

impl GateError {
    /// Stable status and caller-facing message
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            GateError::Unauthenticated | GateError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            GateError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            GateError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            GateError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            GateError::Signing(_) | GateError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        if matches!(self, GateError::Signing(_) | GateError::Storage(_)) {
            error!("Identity gate failure: {}", self);
        }

        let (status, message) = self.status_and_message();
        let body = Json(json!({
            "status": status.as_u16(),
            "message": message,
        }));

        (status, body).into_response()
    }
}
