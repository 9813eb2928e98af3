// handlers/public/auth/login.rs - POST /login handler

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::auth::IssuedToken;
use crate::database::models::User;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub token: IssuedToken,
}

/// POST /login - Authenticate user and receive JWT token
///
/// Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user": { "id": "...", "username": "alice", "email": "..." },
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "token_type": "Bearer",
///     "expires_in": 86400
///   }
/// }
/// ```
///
/// Unknown users and wrong passwords both yield the same 401.
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let user = state
        .credentials
        .authenticate(payload.username.trim(), &payload.password)
        .await?;
    let token = state.keys.issue(user.id, &user.username)?;

    info!("User '{}' logged in", user.username);
    Ok(ApiResponse::success(LoginResponse { user, token }))
}
