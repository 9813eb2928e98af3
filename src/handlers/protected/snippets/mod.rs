pub mod collection;
pub mod record;

use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{NewSnippet, SnippetChanges};
use crate::error::ApiError;
use crate::handlers::reject_nul;

// Re-export handler functions for use in routing
pub use collection::{get as snippets_get, post as snippets_post};
pub use record::{delete as snippet_delete, get as snippet_get, put as snippet_put};

/// Body accepted by POST /snippets and PUT /snippets/:id.
///
/// `id`, `created_at` and `updated_at` are server-assigned and ignored if
/// present. `user_id` only matters on create.
#[derive(Debug, Deserialize)]
pub struct SnippetRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SnippetRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.code.trim().is_empty() {
            return Err(ApiError::required_field("code"));
        }
        reject_nul("title", &self.title)?;
        reject_nul("description", &self.description)?;
        reject_nul("language", &self.language)?;
        reject_nul("code", &self.code)?;
        for tag in &self.tags {
            reject_nul("tags", tag)?;
        }
        Ok(())
    }

    /// Falls back to `owner` when the body names no user.
    pub fn into_new(self, owner: Uuid) -> NewSnippet {
        NewSnippet {
            title: self.title,
            description: self.description,
            language: self.language,
            code: self.code,
            user_id: self.user_id.unwrap_or(owner),
            folder_id: self.folder_id,
            tags: self.tags,
        }
    }

    pub fn into_changes(self) -> SnippetChanges {
        SnippetChanges {
            title: self.title,
            description: self.description,
            language: self.language,
            code: self.code,
            folder_id: self.folder_id,
            tags: self.tags,
        }
    }
}
