use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, KeyRing};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        ApiError::unauthorized(failure.to_string())
    }
}

/// Bearer-token gate in front of the protected routes. Verification is pure
/// computation over the key ring; the gate never touches storage.
#[derive(Clone, Debug)]
pub struct AuthGate {
    keys: Arc<KeyRing>,
}

impl AuthGate {
    pub fn new(keys: Arc<KeyRing>) -> Self {
        Self { keys }
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AuthFailure> {
        let token = extract_bearer(headers)?;
        self.keys
            .verify(token)
            .map(AuthUser::from)
            .map_err(|e| {
                tracing::debug!("Rejected bearer token: {}", e);
                AuthFailure::InvalidToken
            })
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.authenticate(request.headers()) {
        Ok(user) => {
            tracing::debug!(user_id = %user.user_id, "Authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(failure) => {
            tracing::warn!(path = %request.uri().path(), "Unauthorized: {}", failure);
            ApiError::from(failure).into_response()
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthFailure> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthFailure::MissingHeader)?
        .to_str()
        .map_err(|_| AuthFailure::MissingToken)?;

    let token = value.strip_prefix("Bearer ").ok_or(AuthFailure::MissingToken)?.trim();
    if token.is_empty() {
        return Err(AuthFailure::MissingToken);
    }
    Ok(token)
}
