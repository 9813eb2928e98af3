use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::models::Folder;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /folders/user/:user_id - every folder owned by the user, all depths
pub async fn get(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Vec<Folder>> {
    let user_id = parse_id(&user_id, "user")?;
    let folders = state.store.folders_by_user(user_id).await?;
    Ok(ApiResponse::success(folders))
}
