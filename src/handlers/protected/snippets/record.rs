use axum::extract::{Extension, Path, State};
use tracing::info;

use crate::app::AppState;
use crate::database::models::Snippet;
use crate::handlers::parse_id;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

use super::SnippetRequest;

/// GET /snippets/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Snippet> {
    let id = parse_id(&id, "snippet")?;
    let snippet = state.store.get_snippet(id).await?;
    Ok(ApiResponse::success(snippet))
}

/// PUT /snippets/:id - full replacement, including the tag set
pub async fn put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<SnippetRequest>,
) -> ApiResult<Snippet> {
    let id = parse_id(&id, "snippet")?;
    payload.validate()?;
    let snippet = state.store.update_snippet(id, payload.into_changes()).await?;

    info!(user_id = %auth.user_id, "Updated snippet {}", id);
    Ok(ApiResponse::success(snippet))
}

/// DELETE /snippets/:id - tag links go with it, tags stay
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, "snippet")?;
    state.store.delete_snippet(id).await?;

    info!(user_id = %auth.user_id, "Deleted snippet {}", id);
    Ok(ApiResponse::no_content())
}
