use axum::extract::{Extension, Path, State};
use tracing::info;

use crate::app::AppState;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// DELETE /folders/:id - removes the folder and its descendants; snippets
/// filed anywhere in that subtree are kept and moved to the root level
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, "folder")?;
    state.store.delete_folder(id).await?;

    info!(user_id = %auth.user_id, "Deleted folder {}", id);
    Ok(ApiResponse::no_content())
}
