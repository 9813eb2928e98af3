#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use snippet_api_rust::config::{AppConfig, StorageBackend, DEFAULT_KEY_ID};
use snippet_api_rust::database::{MemoryStore, Storage};
use snippet_api_rust::{router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Development defaults with an in-memory backend and a fixed signing key.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.backend = StorageBackend::Memory;
    config.api.enable_request_logging = false;
    config.security.jwt_keys =
        BTreeMap::from([(DEFAULT_KEY_ID.to_string(), TEST_SECRET.to_string())]);
    config.security.jwt_active_key = DEFAULT_KEY_ID.to_string();
    config
}

/// The full router driven in-process through `tower::ServiceExt::oneshot`.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn in_memory() -> (Self, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let app = Self::with_store(memory.clone(), test_config());
        (app, memory)
    }

    pub fn with_store(store: Arc<dyn Storage>, config: AppConfig) -> Self {
        let state = AppState::new(store, config).expect("test keys are valid");
        Self {
            router: router(state.clone()),
            state,
        }
    }

    /// Sends one request; the body is parsed as JSON, `Value::Null` when empty.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/register",
                None,
                Some(json!({"username": username, "email": email, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["data"].clone()
    }

    /// Returns the whole `data` object of a successful login.
    pub async fn login(&self, username: &str, password: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/login",
                None,
                Some(json!({"username": username, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"].clone()
    }

    /// Registers and logs in; returns the user id and a bearer token.
    pub async fn signup(&self, username: &str) -> (Uuid, String) {
        self.register(username, &format!("{}@example.com", username), "pw123").await;
        let login = self.login(username, "pw123").await;
        (id_of(&login["user"]), login["token"].as_str().unwrap().to_string())
    }

    pub async fn create_snippet(&self, token: &str, body: Value) -> Value {
        let (status, body) = self.post("/snippets", token, body).await;
        assert_eq!(status, StatusCode::CREATED, "create snippet failed: {}", body);
        body["data"].clone()
    }

    pub async fn create_folder(&self, token: &str, body: Value) -> Value {
        let (status, body) = self.post("/folders", token, body).await;
        assert_eq!(status, StatusCode::CREATED, "create folder failed: {}", body);
        body["data"].clone()
    }
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"].as_str().unwrap().parse().unwrap()
}

pub fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}
