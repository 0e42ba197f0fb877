#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Tests run against the REAL router and services, backed by the in-memory
//! store. Every [`TestApp`] is independent, so tests never share content or
//! rate-limit state.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vetrina_kernel::app::build_router;
use vetrina_kernel::config::Config;
use vetrina_kernel::file::LocalBlobStorage;
use vetrina_kernel::services::notify::Notifier;
use vetrina_kernel::state::AppState;
use vetrina_kernel::storage::Persistence;

pub const ADMIN_EMAIL: &str = "owner@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Notifier that records every message.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, Vec<String>)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> anyhow::Result<()> {
        self.sent
            .lock()
            .push((subject.to_string(), body.to_string(), recipients.to_vec()));
        Ok(())
    }
}

/// Notifier whose relay is always down.
pub struct UnreachableNotifier;

#[async_trait]
impl Notifier for UnreachableNotifier {
    async fn send(&self, _: &str, _: &str, _: &[String]) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
}

/// Base configuration for tests.
pub fn test_config(uploads: &TempDir) -> Config {
    Config {
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        jwt_secret: "integration-test-secret-with-enough-bytes".to_string(),
        uploads_dir: uploads.path().to_path_buf(),
        leads_to_email: vec!["office@example.com".to_string()],
        store_timeout: Duration::from_secs(2),
        notify_timeout: Duration::from_millis(200),
        ..Config::default()
    }
}

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    pub uploads: TempDir,
}

impl TestApp {
    /// Create a test application with default settings.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application, adjusting the configuration first.
    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        Self::build(adjust, notifier.clone(), notifier)
    }

    /// Create a test application whose notification relay always fails.
    pub async fn with_unreachable_notifier() -> Self {
        Self::build(
            |_| {},
            Arc::new(UnreachableNotifier),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn build(
        adjust: impl FnOnce(&mut Config),
        notifier: Arc<dyn Notifier>,
        recording: Arc<RecordingNotifier>,
    ) -> Self {
        let uploads = tempfile::tempdir().expect("failed to create uploads dir");
        let mut config = test_config(&uploads);
        adjust(&mut config);

        let blobs = Arc::new(LocalBlobStorage::new(
            config.uploads_dir.clone(),
            config.files_url.clone(),
        ));
        let state = AppState::from_parts(&config, Persistence::in_memory(), blobs, notifier);
        let router = build_router(state.clone(), &config);

        Self {
            router,
            state,
            notifier: recording,
            uploads,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Log in as the admin and return the bearer token.
    pub async fn login(&self) -> String {
        let response = self
            .request(json_request(
                "POST",
                "/auth/login",
                &serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "admin login failed");
        let body = body_json(response).await;
        body["access_token"]
            .as_str()
            .expect("login response without token")
            .to_string()
    }

    /// GET a path and decode the JSON body.
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .request(Request::get(path).body(Body::empty()).unwrap())
            .await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// Send a JSON body and decode the JSON response.
    pub async fn send_json(
        &self,
        method: &str,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(json_request(method, path, body, token)).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

/// Build a JSON request, optionally with a bearer token.
pub fn json_request(method: &str, path: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Collect a response body as JSON (Null when empty).
pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}
