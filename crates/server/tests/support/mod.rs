#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use configs::AppConfig;
use serde_json::{json, Value};
use server::routes::{self, auth::ServerState};
use service::{auth::domain::RegisterInput, images::DiskImageStore, repository::memory::MemoryStore};
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub state: ServerState,
    pub upload_dir: String,
}

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg.server.max_upload_bytes = 1024 * 1024;
    cfg
}

/// The full router over an in-memory store; uploads go to a fresh temp dir.
pub fn build_app() -> TestApp {
    let upload_dir = std::env::temp_dir()
        .join(format!("marketplace-test-uploads-{}", Uuid::new_v4()))
        .to_string_lossy()
        .to_string();
    std::fs::create_dir_all(&upload_dir).unwrap();
    let store = Arc::new(MemoryStore::new());
    let state = ServerState::new(store, Arc::new(DiskImageStore::new(&upload_dir)), &test_config());
    let router = routes::build_router(state.clone(), cors(), &upload_dir);
    TestApp { router, state, upload_dir }
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&b).unwrap()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        self.call(req).await
    }

    pub async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, value)
    }

    /// Register through the API and return `(token, user id)`.
    pub async fn register(&self, email: &str, role: &str) -> (String, Uuid) {
        let (status, body) = self
            .send("POST", "/auth/register", None, Some(registration(email, role)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {email}: {body}");
        session(&body)
    }

    /// Admins cannot self-register; provision one and log in.
    pub async fn admin(&self, email: &str) -> (String, Uuid) {
        self.state
            .auth
            .provision(RegisterInput {
                name: "Admin".into(),
                email: email.into(),
                password: "secret1".into(),
                phone: "1234567890".into(),
                role: Some("admin".into()),
                location: "HQ".into(),
                specialization: None,
            })
            .await
            .unwrap();
        let (status, body) = self
            .send("POST", "/auth/login", None, Some(json!({"email": email, "password": "secret1"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        session(&body)
    }

    /// Create a service type as an admin and return its id.
    pub async fn service_type(&self, admin_token: &str, name: &str) -> Uuid {
        let (status, body) = self
            .send("POST", "/service-types", Some(admin_token), Some(json!({"name": name, "description": format!("{name} work")})))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }
}

pub fn registration(email: &str, role: &str) -> Value {
    json!({
        "name": "Test User",
        "email": email,
        "password": "secret1",
        "phone": "1234567890",
        "role": role,
        "location": "New York",
        "specialization": "Plumbing",
    })
}

pub fn session(body: &Value) -> (String, Uuid) {
    let token = body["token"].as_str().expect("token in session").to_string();
    (token, id_of(&body["user"]))
}

pub fn id_of(body: &Value) -> Uuid {
    body["id"].as_str().and_then(|s| s.parse().ok()).expect("id in body")
}
