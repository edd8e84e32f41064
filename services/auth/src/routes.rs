//! Token refresh, logout and self-lookup routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::info;

use crate::{
    error::GateError,
    gate::IdentityGate,
    jwt::{Domain, TokenPair},
    middleware::{bearer_token, require_admin, require_user},
    models::{Admin, User},
};

/// Create the router for the authentication service
pub fn create_router(gate: IdentityGate) -> Router {
    let user_routes = Router::new()
        .route("/auth/users/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(gate.clone(), require_user));

    let admin_routes = Router::new()
        .route("/auth/admin/me", get(current_admin))
        .route_layer(middleware::from_fn_with_state(gate.clone(), require_admin));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/users/refresh-token", post(refresh_user_token))
        .route("/auth/admin/refresh-token", post(refresh_admin_token))
        .route("/auth/users/logout", post(logout_user))
        .route("/auth/admin/logout", post(logout_admin))
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(gate)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

async fn refresh(
    gate: &IdentityGate,
    domain: Domain,
    headers: &HeaderMap,
) -> Result<(StatusCode, Json<TokenPair>), GateError> {
    info!("Token refresh request ({})", domain);

    let token = bearer_token(headers);
    let pair = gate.refresh(domain, token.as_deref())?;

    Ok((StatusCode::OK, Json(pair)))
}

/// Rotate a user refresh token
pub async fn refresh_user_token(
    State(gate): State<IdentityGate>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GateError> {
    refresh(&gate, Domain::User, &headers).await
}

/// Rotate an admin refresh token
pub async fn refresh_admin_token(
    State(gate): State<IdentityGate>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GateError> {
    refresh(&gate, Domain::Admin, &headers).await
}

/// Logout endpoint
///
/// Tokens are stateless, so logging out only confirms the refresh token is
/// genuine; the client discards its credentials.
async fn logout(
    gate: &IdentityGate,
    domain: Domain,
    headers: &HeaderMap,
) -> Result<(StatusCode, Json<Value>), GateError> {
    let token = bearer_token(headers);
    let claims = gate.check_refresh(domain, token.as_deref())?;
    info!("Logout for {} principal {}", domain, claims.payload.id);

    Ok((
        StatusCode::OK,
        Json(json!({"result": "logout success"})),
    ))
}

pub async fn logout_user(
    State(gate): State<IdentityGate>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GateError> {
    logout(&gate, Domain::User, &headers).await
}

pub async fn logout_admin(
    State(gate): State<IdentityGate>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GateError> {
    logout(&gate, Domain::Admin, &headers).await
}

/// Current user record, standing re-read on every call
pub async fn current_user(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(json!({ "user": user }))
}

/// Current admin record
pub async fn current_admin(Extension(admin): Extension<Admin>) -> impl IntoResponse {
    Json(json!({
        "admin": {
            "id": admin.id,
            "name": admin.name,
            "email": admin.email,
        }
    }))
}
