use axum::extract::{Extension, Query, State};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Folder, FolderContents, NewFolder};
use crate::error::ApiError;
use crate::handlers::{parse_id, reject_nul};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct FolderRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Defaults to the caller.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    pub id: Option<String>,
}

/// POST /folders - a root folder when `parent_id` is null
pub async fn post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<FolderRequest>,
) -> ApiResult<Folder> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::required_field("name"));
    }
    reject_nul("name", name)?;

    let folder = state
        .store
        .create_folder(NewFolder {
            name: name.to_string(),
            parent_id: payload.parent_id,
            user_id: payload.user_id.unwrap_or(auth.user_id),
        })
        .await?;

    info!(user_id = %auth.user_id, "Created folder {} ('{}')", folder.id, folder.name);
    Ok(ApiResponse::created(folder))
}

/// GET /folders?id=:folder_id - direct child snippets and folders
pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> ApiResult<FolderContents> {
    let id = parse_id(query.id.as_deref().unwrap_or_default(), "folder")?;
    let contents = state.store.folder_contents(id).await?;
    Ok(ApiResponse::success(contents))
}
