//! HTTP surface of the marketplace service

use std::sync::Arc;

use auth::{
    Domain, IdentityGate, JwtConfig, JwtService,
    models::{Admin, User},
    repositories::MemoryPrincipalStore,
};
use axum::{
    Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::Response,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use marketplace::{
    AppState, BidLedger, NotificationHub, WorkerDesk,
    models::{NotificationKind, UserRequest, Worker},
    realtime::LocalHub,
    repositories::MemoryMarketStore,
    routes::create_router,
};

struct TestApp {
    router: Router,
    gate: IdentityGate,
    store: MemoryMarketStore,
    principals: MemoryPrincipalStore,
}

fn test_app() -> TestApp {
    let jwt = JwtService::new(JwtConfig {
        user_access_secret: "user-access-secret".to_string(),
        user_refresh_secret: "user-refresh-secret".to_string(),
        admin_access_secret: "admin-access-secret".to_string(),
        admin_refresh_secret: "admin-refresh-secret".to_string(),
        user_issuer: "smurf-app.com".to_string(),
        admin_issuer: "smurfApp.com".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 31_536_000,
    })
    .expect("valid test config");

    let principals = MemoryPrincipalStore::new();
    let gate = IdentityGate::new(jwt, Arc::new(principals.clone()));

    let store = MemoryMarketStore::new();
    let hub = LocalHub::new(16);
    let notifications = NotificationHub::new(Arc::new(store.clone()), Arc::new(hub.clone()));
    let ledger = BidLedger::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        notifications.clone(),
    );
    let workers = WorkerDesk::new(Arc::new(store.clone()), notifications.clone());

    let router = create_router(AppState {
        gate: gate.clone(),
        ledger,
        notifications,
        workers,
        hub,
    });

    TestApp {
        router,
        gate,
        store,
        principals,
    }
}

impl TestApp {
    fn user(&self, name: &str, verified: bool) -> (User, String) {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            image_url: None,
            is_verified: verified,
            is_blocked: false,
            forgot_password: false,
            is_worker: true,
            roles: vec!["BASIC".to_string()],
            created_at: now,
            updated_at: now,
        };
        self.principals.put_user(user.clone());

        let token = self
            .gate
            .jwt()
            .issue_access(Domain::User, &user.token_payload())
            .unwrap();
        (user, token)
    }

    fn admin(&self) -> (Admin, String) {
        let admin = Admin {
            id: Uuid::new_v4(),
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            role: Some(1),
            is_blocked: false,
            created_at: Utc::now(),
        };
        self.principals.put_admin(admin.clone());

        let token = self
            .gate
            .jwt()
            .issue_access(Domain::Admin, &admin.token_payload())
            .unwrap();
        (admin, token)
    }

    fn request_for(&self, owner: &User) -> UserRequest {
        let request = UserRequest {
            id: Uuid::new_v4(),
            user_id: owner.id,
            info: "Assemble a wardrobe".to_string(),
            budget: Some("80".to_string()),
            proposed_time_length: None,
            is_stopped: false,
            bids: Vec::new(),
            created_at: Utc::now(),
        };
        self.store.put_request(request.clone());
        request
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn bid_body(request_id: Uuid) -> Value {
    json!({
        "request_id": request_id,
        "info": "Flat-pack is my specialty",
        "proposed_budget": "75",
        "proposed_time": "2 hours"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let response = app.send(empty_request("GET", "/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_submit_requires_credential() {
    let app = test_app();
    let (owner, _) = app.user("Uma", true);
    let request = app.request_for(&owner);

    let response = app
        .send(json_request("POST", "/api/bids", None, bid_body(request.id)))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["status"], 401);
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn test_submit_and_list_bids() {
    let app = test_app();
    let (owner, _) = app.user("Uma", true);
    let (_, worker_token) = app.user("Wes", false);
    let request = app.request_for(&owner);

    let response = app
        .send(json_request(
            "POST",
            "/api/bids",
            Some(&worker_token),
            bid_body(request.id),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user_request"]["bids"].as_array().unwrap().len(), 1);

    let uri = format!("/api/requests/{}/bids", request.id);
    let response = app.send(empty_request("GET", &uri, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bids = body_json(response).await;
    assert_eq!(bids[0]["status"], "Pending");
    assert_eq!(bids[0]["proposed_budget"], "75");
}

#[tokio::test]
async fn test_self_bid_is_conflict() {
    let app = test_app();
    let (owner, owner_token) = app.user("Uma", true);
    let request = app.request_for(&owner);

    let response = app
        .send(json_request(
            "POST",
            "/api/bids",
            Some(&owner_token),
            bid_body(request.id),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["status"], 409);
}

#[tokio::test]
async fn test_withdraw_requires_verified_account() {
    let app = test_app();
    let (owner, _) = app.user("Uma", true);
    let (_, unverified_token) = app.user("Wes", false);
    let request = app.request_for(&owner);

    let response = app
        .send(json_request(
            "POST",
            "/api/bids",
            Some(&unverified_token),
            bid_body(request.id),
        ))
        .await;
    let bid_id = body_json(response).await["user_request"]["bids"][0]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/api/bids/{}", bid_id);
    let response = app
        .send(empty_request("DELETE", &uri, Some(&unverified_token)))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["message"],
        "Unauthorized, not verified account"
    );
}

#[tokio::test]
async fn test_resolve_then_late_resolve_conflicts() {
    let app = test_app();
    let (owner, owner_token) = app.user("Uma", true);
    let (_, worker_token) = app.user("Wes", true);
    let request = app.request_for(&owner);

    for _ in 0..2 {
        app.send(json_request(
            "POST",
            "/api/bids",
            Some(&worker_token),
            bid_body(request.id),
        ))
        .await;
    }
    let bids = app.store.request(request.id).unwrap().bids;

    let uri = format!("/api/bids/{}/resolve", bids[0]);
    let response = app
        .send(json_request(
            "POST",
            &uri,
            Some(&owner_token),
            json!({ "status": "Accepted" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["bid"]["status"], "Accepted");

    let uri = format!("/api/bids/{}/resolve", bids[1]);
    let response = app
        .send(json_request(
            "POST",
            &uri,
            Some(&owner_token),
            json!({ "status": "Accepted" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_notifications_list_and_mark_read() {
    let app = test_app();
    let (owner, owner_token) = app.user("Uma", true);
    let (_, worker_token) = app.user("Wes", true);
    let request = app.request_for(&owner);

    app.send(json_request(
        "POST",
        "/api/bids",
        Some(&worker_token),
        bid_body(request.id),
    ))
    .await;

    let response = app
        .send(empty_request("GET", "/api/notifications", Some(&owner_token)))
        .await;
    let inbox = body_json(response).await;
    assert_eq!(inbox[0]["type"], "new_bid");
    let id = inbox[0]["id"].clone();

    for expected in [1, 0] {
        let response = app
            .send(json_request(
                "POST",
                "/api/notifications/mark-read",
                Some(&owner_token),
                json!({ "ids": [id, Uuid::new_v4()] }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["updated"], expected);
    }
}

#[tokio::test]
async fn test_worker_verification_is_admin_only() {
    let app = test_app();
    let (worker_user, user_token) = app.user("Wes", true);
    let (_, admin_token) = app.admin();
    let worker = Worker {
        id: Uuid::new_v4(),
        user_id: worker_user.id,
        image_url: None,
        is_verified: false,
    };
    app.store.put_worker(worker.clone());
    let uri = format!("/api/workers/{}/verify", worker.id);

    let response = app.send(empty_request("POST", &uri, Some(&user_token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send(empty_request("POST", &uri, Some(&admin_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["worker"]["is_verified"], true);

    // A repeat verification is a no-op
    let response = app.send(empty_request("POST", &uri, Some(&admin_token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let notices = app.store.notifications();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].recipient_id, worker_user.id);
    assert_eq!(notices[0].kind, NotificationKind::WorkerVerified);

    let unknown = format!("/api/workers/{}/verify", Uuid::new_v4());
    let response = app.send(empty_request("POST", &unknown, Some(&admin_token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
