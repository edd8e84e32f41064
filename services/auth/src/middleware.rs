//! Bearer extraction and identity-gate middleware

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    error::GateError,
    gate::{IdentityGate, Standing},
};

/// Legacy header still sent by older clients
pub const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

/// Read the bearer credential from `Authorization: Bearer` or `x-auth-token`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    headers
        .get(LEGACY_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

async fn gate_user(
    gate: &IdentityGate,
    mut req: Request<Body>,
    next: Next,
    standing: Standing,
) -> Result<Response, GateError> {
    let token = bearer_token(req.headers());
    let user = gate.authenticate_user(token.as_deref(), standing).await?;

    // Handlers pick the caller up with `Extension<User>`
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Require a user access token from an account that is not blocked
pub async fn require_user(
    State(gate): State<IdentityGate>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GateError> {
    gate_user(&gate, req, next, Standing::Active).await
}

/// Require a user access token from a verified, unblocked account
pub async fn require_verified_user(
    State(gate): State<IdentityGate>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GateError> {
    gate_user(&gate, req, next, Standing::Verified).await
}

/// Require an admin access token
pub async fn require_admin(
    State(gate): State<IdentityGate>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, GateError> {
    let token = bearer_token(req.headers());
    let admin = gate.authenticate_admin(token.as_deref()).await?;

    req.extensions_mut().insert(admin);
    Ok(next.run(req).await)
}
