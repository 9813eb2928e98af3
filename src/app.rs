use axum::{
    extract::{DefaultBodyLimit, State},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{JwtError, KeyRing};
use crate::config::AppConfig;
use crate::database::Storage;
use crate::error::ApiError;
use crate::handlers::{method_not_allowed, protected, public};
use crate::middleware::{jwt_auth_middleware, AuthGate};
use crate::services::CredentialService;

/// Shared request state. Everything the handlers need is injected here at
/// startup; nothing is read from globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub credentials: CredentialService,
    pub keys: Arc<KeyRing>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, config: AppConfig) -> Result<Self, JwtError> {
        let keys = KeyRing::from_config(&config.security)?;
        Ok(Self {
            credentials: CredentialService::new(store.clone()),
            store,
            keys: Arc::new(keys),
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;
    let enable_cors = state.config.security.enable_cors;
    let enable_request_logging = state.config.api.enable_request_logging;

    let mut app = Router::new()
        .route("/", get(root).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .merge(auth_public_routes())
        .merge(protected_routes(AuthGate::new(state.keys.clone())))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(max_body));

    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }
    if enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/register", post(auth::register_post).fallback(method_not_allowed))
        .route("/login", post(auth::login_post).fallback(method_not_allowed))
}

fn protected_routes(gate: AuthGate) -> Router<AppState> {
    use protected::{auth, folders, snippets, tags};

    Router::new()
        .route("/whoami", get(auth::whoami_get).fallback(method_not_allowed))
        .route(
            "/snippets",
            get(snippets::snippets_get)
                .post(snippets::snippets_post)
                .fallback(method_not_allowed),
        )
        .route(
            "/snippets/:id",
            get(snippets::snippet_get)
                .put(snippets::snippet_put)
                .delete(snippets::snippet_delete)
                .fallback(method_not_allowed),
        )
        .route("/tags/:snippet_id", get(tags::tags_get).fallback(method_not_allowed))
        .route(
            "/tags/:snippet_id/:tag_name",
            post(tags::tag_post)
                .delete(tags::tag_delete)
                .fallback(method_not_allowed),
        )
        .route(
            "/folders",
            get(folders::folders_get)
                .post(folders::folders_post)
                .fallback(method_not_allowed),
        )
        .route(
            "/folders/user/:user_id",
            get(folders::user_folders_get).fallback(method_not_allowed),
        )
        .route("/folders/:id", delete(folders::folder_delete).fallback(method_not_allowed))
        // Runs before method dispatch, so every protected path answers 401 first
        .route_layer(from_fn_with_state(gate, jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Snippet API (Rust)",
            "version": version,
            "description": "Multi-user code snippet manager built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/register, /login (public - account and token acquisition)",
                "whoami": "/whoami (protected)",
                "snippets": "/snippets[/:id] (protected)",
                "tags": "/tags/:snippet_id[/:tag_name] (protected)",
                "folders": "/folders, /folders?id=:id, /folders/user/:user_id, /folders/:id (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> Response {
    match state.store.health_check().await {
        Ok(_) => Json(json!({
            "success": true,
            "data": {
                "status": "ok",
                "timestamp": chrono::Utc::now(),
                "database": "ok"
            }
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiError::service_unavailable("Database unavailable").into_response()
        }
    }
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
