// handlers/public/auth/register.rs - POST /register handler

use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::User;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::Registration;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /register - Create a user account
///
/// Input: `{"username": "...", "email": "...", "password": "..."}`.
/// Returns 201 with the stored user; the password hash is never serialized.
/// A taken username or email yields 409.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<User> {
    let user = state
        .credentials
        .register(Registration {
            username: payload.username,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(ApiResponse::created(user))
}
