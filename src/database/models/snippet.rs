use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Snippet {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub language: String,
    pub code: String,
    pub user_id: Uuid,
    /// `None` means unfiled.
    pub folder_id: Option<Uuid>,
    /// Tag names, sorted. Rows that do not aggregate a `tags` column leave it empty.
    #[sqlx(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-controlled snippet fields for a create.
#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub title: String,
    pub description: String,
    pub language: String,
    pub code: String,
    pub user_id: Uuid,
    pub folder_id: Option<Uuid>,
    pub tags: Vec<String>,
}

/// Full replacement of a snippet's mutable fields, tags included.
#[derive(Debug, Clone)]
pub struct SnippetChanges {
    pub title: String,
    pub description: String,
    pub language: String,
    pub code: String,
    pub folder_id: Option<Uuid>,
    pub tags: Vec<String>,
}

