use axum::extract::{Extension, State};
use tracing::info;

use crate::app::AppState;
use crate::database::models::Snippet;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

use super::SnippetRequest;

/// GET /snippets - every snippet with its tag names
pub async fn get(State(state): State<AppState>) -> ApiResult<Vec<Snippet>> {
    let snippets = state.store.list_snippets().await?;
    Ok(ApiResponse::success(snippets))
}

/// POST /snippets - create a snippet and attach its tags in one unit
pub async fn post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<SnippetRequest>,
) -> ApiResult<Snippet> {
    payload.validate()?;
    let snippet = state.store.create_snippet(payload.into_new(auth.user_id)).await?;

    info!(user_id = %auth.user_id, "Created snippet {}", snippet.id);
    Ok(ApiResponse::created(snippet))
}
