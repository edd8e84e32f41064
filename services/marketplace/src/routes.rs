//! Marketplace service routes

use std::convert::Infallible;

use auth::{
    middleware::{require_admin, require_user, require_verified_user},
    models::{Admin, User},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{delete, get, post},
};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{BidInput, Resolution},
    state::AppState,
};

/// Body of a resolve call
#[derive(Debug, Deserialize)]
pub struct ResolveBody {
    pub status: Resolution,
}

/// Body of a mark-read call
#[derive(Debug, Deserialize)]
pub struct MarkReadBody {
    pub ids: Vec<Uuid>,
}

/// Create the router for the marketplace service
pub fn create_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/api/bids", post(submit_bid))
        .route("/api/bids/:id/resolve", post(resolve_bid))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/mark-read", post(mark_notifications_read))
        .route("/api/notifications/stream", get(notification_stream))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_user,
        ));

    let verified_routes = Router::new()
        .route("/api/bids/:id", delete(withdraw_bid))
        .route("/api/requests/:id/stop", post(stop_request))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_verified_user,
        ));

    let admin_routes = Router::new()
        .route("/api/workers/:id/verify", post(verify_worker))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_admin,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/requests/:id/bids", get(list_request_bids))
        .merge(user_routes)
        .merge(verified_routes)
        .merge(admin_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "marketplace-service"
    }))
}

/// Place a bid on a request
pub async fn submit_bid(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(input): Json<BidInput>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.ledger.submit(&user, input).await?;

    Ok((StatusCode::CREATED, Json(json!({ "user_request": request }))))
}

/// Withdraw one of the caller's bids
pub async fn withdraw_bid(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.ledger.withdraw(id, &user).await?;

    Ok(Json(json!({ "message": "Bid withdrawn" })))
}

/// Accept or reject a bid on one of the caller's requests
pub async fn resolve_bid(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(body): Json<ResolveBody>,
) -> Result<impl IntoResponse, ApiError> {
    let bid = state.ledger.resolve(id, body.status, &user).await?;

    Ok(Json(json!({ "bid": bid })))
}

pub async fn list_request_bids(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bids = state.ledger.bids_for_request(id).await?;

    Ok(Json(bids))
}

pub async fn stop_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.ledger.stop_request(id, &user).await?;

    Ok(Json(json!({ "user_request": request })))
}

/// Caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state.notifications.list(user.id).await?;

    Ok(Json(notifications))
}

pub async fn mark_notifications_read(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<MarkReadBody>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.notifications.mark_read(user.id, &body.ids).await?;

    Ok(Json(json!({ "updated": updated })))
}

/// Live feed of the caller's notifications
pub async fn notification_stream(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let feed = state.hub.subscribe(user.id).filter_map(|event| async move {
        match Event::default()
            .event(&event.event)
            .json_data(&event.notification)
        {
            Ok(sse_event) => Some(Ok::<_, Infallible>(sse_event)),
            Err(e) => {
                warn!("Dropping unencodable event {}: {}", event.notification.id, e);
                None
            }
        }
    });

    Sse::new(feed).keep_alive(KeepAlive::default())
}

/// Verify a worker profile
pub async fn verify_worker(
    State(state): State<AppState>,
    Extension(admin): Extension<Admin>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let worker = state.workers.verify(&admin, id).await?;

    Ok(Json(json!({ "worker": worker })))
}
