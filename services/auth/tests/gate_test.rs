//! Identity gate tests against the in-memory principal store

use std::sync::Arc;

use auth::{
    Domain, GateError, IdentityGate, JwtConfig, JwtService, Principal, Standing, TokenKind,
    models::{Admin, User},
    repositories::MemoryPrincipalStore,
    routes::create_router,
};
use axum::{
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn jwt_service() -> JwtService {
    JwtService::new(JwtConfig {
        user_access_secret: "user-access-secret".to_string(),
        user_refresh_secret: "user-refresh-secret".to_string(),
        admin_access_secret: "admin-access-secret".to_string(),
        admin_refresh_secret: "admin-refresh-secret".to_string(),
        user_issuer: "smurf-app.com".to_string(),
        admin_issuer: "smurfApp.com".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 31_536_000,
    })
    .expect("valid test config")
}

fn user(verified: bool) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: "Bilal".to_string(),
        email: "bilal@example.com".to_string(),
        image_url: Some("https://cdn.example.com/bilal.png".to_string()),
        is_verified: verified,
        is_blocked: false,
        forgot_password: false,
        is_worker: false,
        roles: vec!["BASIC".to_string()],
        created_at: now,
        updated_at: now,
    }
}

fn admin() -> Admin {
    Admin {
        id: Uuid::new_v4(),
        name: "Root".to_string(),
        email: "root@example.com".to_string(),
        role: Some(1),
        is_blocked: false,
        created_at: Utc::now(),
    }
}

fn setup() -> (IdentityGate, MemoryPrincipalStore) {
    let store = MemoryPrincipalStore::new();
    let gate = IdentityGate::new(jwt_service(), Arc::new(store.clone()));
    (gate, store)
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    let (gate, _) = setup();

    let result = gate.authenticate(Domain::User, None, Standing::Active).await;
    assert!(matches!(result, Err(GateError::Unauthenticated)));
}

#[tokio::test]
async fn test_valid_user_token_resolves_principal() {
    let (gate, store) = setup();
    let user = user(true);
    store.put_user(user.clone());

    let token = gate.jwt().issue_access(Domain::User, &user.token_payload()).unwrap();
    let principal = gate
        .authenticate(Domain::User, Some(&token), Standing::Verified)
        .await
        .unwrap();

    assert!(matches!(principal, Principal::User(ref u) if u.id == user.id));
    assert_eq!(principal.domain(), Domain::User);
}

#[tokio::test]
async fn test_user_token_rejected_in_admin_domain() {
    let (gate, store) = setup();
    let user = user(true);
    store.put_user(user.clone());

    let token = gate.jwt().issue_access(Domain::User, &user.token_payload()).unwrap();
    let result = gate.authenticate_admin(Some(&token)).await;

    assert!(matches!(result, Err(GateError::Unauthorized)));
}

#[tokio::test]
async fn test_unknown_principal_is_not_found() {
    let (gate, _) = setup();
    let user = user(true);

    let token = gate.jwt().issue_access(Domain::User, &user.token_payload()).unwrap();
    let result = gate.authenticate_user(Some(&token), Standing::Active).await;

    assert!(matches!(result, Err(GateError::NotFound(_))));
}

#[tokio::test]
async fn test_block_applies_to_live_token() {
    let (gate, store) = setup();
    let user = user(true);
    store.put_user(user.clone());

    let token = gate.jwt().issue_access(Domain::User, &user.token_payload()).unwrap();
    assert!(gate.authenticate_user(Some(&token), Standing::Active).await.is_ok());

    store.update_user(user.id, |u| u.is_blocked = true);

    let result = gate.authenticate_user(Some(&token), Standing::Active).await;
    assert!(matches!(result, Err(GateError::Forbidden(_))));
}

#[tokio::test]
async fn test_blocked_admin_is_forbidden() {
    let (gate, store) = setup();
    let mut admin = admin();
    admin.is_blocked = true;
    store.put_admin(admin.clone());

    let token = gate.jwt().issue_access(Domain::Admin, &admin.token_payload()).unwrap();
    let result = gate.authenticate_admin(Some(&token)).await;

    assert!(matches!(result, Err(GateError::Forbidden(_))));
}

#[tokio::test]
async fn test_unverified_user_only_passes_active_operations() {
    let (gate, store) = setup();
    let user = user(false);
    store.put_user(user.clone());

    let token = gate.jwt().issue_access(Domain::User, &user.token_payload()).unwrap();

    assert!(gate.authenticate_user(Some(&token), Standing::Active).await.is_ok());
    assert!(matches!(
        gate.authenticate_user(Some(&token), Standing::Verified).await,
        Err(GateError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_refresh_is_pure_rotation() {
    let (gate, store) = setup();
    let user = user(true);
    store.put_user(user.clone());

    let pair = gate.jwt().issue_pair(Domain::User, &user.token_payload()).unwrap();
    store.update_user(user.id, |u| u.is_blocked = true);

    // Rotation still succeeds and carries the stale claims...
    let rotated = gate.refresh(Domain::User, Some(&pair.refresh_token)).unwrap();
    let claims = gate
        .jwt()
        .verify(Domain::User, TokenKind::Access, &rotated.access_token)
        .unwrap();
    assert_eq!(claims.payload.is_blocked, Some(false));

    // ...but the gate re-reads standing on use.
    let result = gate
        .authenticate_user(Some(&rotated.access_token), Standing::Active)
        .await;
    assert!(matches!(result, Err(GateError::Forbidden(_))));
}

#[tokio::test]
async fn test_refresh_requires_refresh_token() {
    let (gate, _) = setup();
    let admin = admin();

    let pair = gate.jwt().issue_pair(Domain::Admin, &admin.token_payload()).unwrap();

    assert!(matches!(
        gate.refresh(Domain::Admin, None),
        Err(GateError::BadRequest(_))
    ));
    assert!(matches!(
        gate.refresh(Domain::Admin, Some(&pair.access_token)),
        Err(GateError::Unauthorized)
    ));
    assert!(matches!(
        gate.refresh(Domain::User, Some(&pair.refresh_token)),
        Err(GateError::Unauthorized)
    ));
    assert!(gate.refresh(Domain::Admin, Some(&pair.refresh_token)).is_ok());
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_refresh_route_returns_new_pair() {
    let (gate, store) = setup();
    let user = user(true);
    store.put_user(user.clone());
    let pair = gate.jwt().issue_pair(Domain::User, &user.token_payload()).unwrap();

    let app = create_router(gate.clone());
    let response = app
        .oneshot(
            Request::post("/auth/users/refresh-token")
                .header("x-auth-token", &pair.refresh_token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let access = body["token"].as_str().unwrap();
    assert!(gate.jwt().verify(Domain::User, TokenKind::Access, access).is_ok());
    assert!(body["refreshToken"].is_string());
}

#[tokio::test]
async fn test_me_route_hides_failure_reason() {
    let (gate, store) = setup();
    let user = user(true);
    store.put_user(user.clone());
    let app = create_router(gate.clone());

    let response = app
        .clone()
        .oneshot(
            Request::get("/auth/users/me")
                .header(AUTHORIZATION, "Bearer garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Unauthorized");

    let token = gate.jwt().issue_access(Domain::User, &user.token_payload()).unwrap();
    let response = app
        .oneshot(
            Request::get("/auth/users/me")
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["id"], user.id.to_string());
}

#[tokio::test]
async fn test_logout_routes_check_refresh_token() {
    let (gate, store) = setup();
    let admin = admin();
    store.put_admin(admin.clone());
    let pair = gate.jwt().issue_pair(Domain::Admin, &admin.token_payload()).unwrap();
    let app = create_router(gate.clone());

    let response = app
        .clone()
        .oneshot(
            Request::post("/auth/admin/logout")
                .header(AUTHORIZATION, format!("Bearer {}", pair.refresh_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["result"], "logout success");

    let response = app
        .clone()
        .oneshot(
            Request::post("/auth/users/logout")
                .header(AUTHORIZATION, format!("Bearer {}", pair.refresh_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::post("/auth/admin/refresh-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
