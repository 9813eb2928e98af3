use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::snippet::Snippet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    /// `None` for root folders.
    pub parent_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFolder {
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub user_id: Uuid,
}

/// Direct children of one folder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FolderContents {
    pub snippets: Vec<Snippet>,
    pub folders: Vec<Folder>,
}
