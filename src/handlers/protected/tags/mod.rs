// Tag links on a snippet. Tags are shared by name across all users and are
// never deleted, only detached.

use axum::extract::{Path, State};
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::{parse_id, reject_nul};
use crate::middleware::{ApiResponse, ApiResult};

fn tag_name(raw: &str) -> Result<&str, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Tag name cannot be empty"));
    }
    reject_nul("tag name", name)?;
    Ok(name)
}

/// GET /tags/:snippet_id - sorted tag names
pub async fn tags_get(
    State(state): State<AppState>,
    Path(snippet_id): Path<String>,
) -> ApiResult<Vec<String>> {
    let snippet_id = parse_id(&snippet_id, "snippet")?;
    let tags = state.store.snippet_tags(snippet_id).await?;
    Ok(ApiResponse::success(tags))
}

/// POST /tags/:snippet_id/:tag_name - attach, creating the tag if needed
pub async fn tag_post(
    State(state): State<AppState>,
    Path((snippet_id, tag)): Path<(String, String)>,
) -> ApiResult<Vec<String>> {
    let snippet_id = parse_id(&snippet_id, "snippet")?;
    let name = tag_name(&tag)?;
    state.store.add_tag(snippet_id, name).await?;

    debug!("Attached tag '{}' to snippet {}", name, snippet_id);
    let tags = state.store.snippet_tags(snippet_id).await?;
    Ok(ApiResponse::created(tags))
}

/// DELETE /tags/:snippet_id/:tag_name - detach; detaching an absent tag succeeds
pub async fn tag_delete(
    State(state): State<AppState>,
    Path((snippet_id, tag)): Path<(String, String)>,
) -> ApiResult<()> {
    let snippet_id = parse_id(&snippet_id, "snippet")?;
    let name = tag_name(&tag)?;
    state.store.remove_tag(snippet_id, name).await?;

    debug!("Detached tag '{}' from snippet {}", name, snippet_id);
    Ok(ApiResponse::no_content())
}
