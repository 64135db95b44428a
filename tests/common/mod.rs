//! Shared helpers for router-level tests.
//!
//! Every test app runs on its own temporary JSON store, upload directory and
//! static directory, with a mailer that records messages instead of sending.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vetmission::api::create_router;
use vetmission::config::Config;
use vetmission::db::{JsonStore, Store};
use vetmission::notifications::{Mailer, OutgoingEmail};
use vetmission::AppState;

pub const ADMIN_PASSWORD: &str = "correct-horse-battery-staple";
pub const CONTACT_INBOX: &str = "inbox@vetmission.example";

/// Mailer that keeps every message in memory
#[derive(Default)]
pub struct RecordingMailer {
    pub enabled: bool,
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<RecordingMailer>,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.auth.admin_password = Some(ADMIN_PASSWORD.to_string());
    config.auth.jwt_secret = "integration-test-secret-at-least-32-chars".to_string();
    config.email.contact_recipient = Some(CONTACT_INBOX.to_string());
    config.server.upload_dir = dir.path().join("uploads");
    config.server.static_dir = dir.path().join("static");
    config.storage.json_path = dir.path().join("content.json");
    config
}

/// Build the full application on a fresh JSON store
pub async fn build_test_app(mail_enabled: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    std::fs::create_dir_all(&config.server.static_dir).unwrap();
    std::fs::write(
        config.server.static_dir.join("index.html"),
        "<!doctype html><title>Vet Mission</title>",
    )
    .unwrap();

    let store = Store::Json(JsonStore::open(&config.storage.json_path).await.unwrap());
    let mailer = Arc::new(RecordingMailer {
        enabled: mail_enabled,
        ..Default::default()
    });
    let upload_dir = config.server.upload_dir.clone();

    let state = Arc::new(AppState::with_mailer(config, store, mailer.clone()));

    TestApp {
        router: create_router(state),
        mailer,
        upload_dir,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Method::GET, uri, None, None).await
    }

    /// Send a request with an optional bearer token and JSON body
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Log in with the admin password and return the token
    pub async fn login(&self) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "password": ADMIN_PASSWORD })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}
