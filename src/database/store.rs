//! Storage capability set.
//!
//! Handlers only see these traits, so any backend that honours the same
//! contracts (atomic composite writes, NotFound signals, tag upsert) can be
//! swapped in without touching the HTTP layer.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    Folder, FolderContents, NewFolder, NewSnippet, NewUser, Snippet, SnippetChanges, User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Internal storage error: {0}")]
    Internal(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. A taken username or email yields `Duplicate`.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Includes the password hash; callers must not pass it outward.
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    /// Get-or-create by name. Always returns the single id owning `name`.
    async fn ensure_tag(&self, name: &str) -> StoreResult<Uuid>;

    /// Attaches `name` to the snippet, creating the tag if needed.
    /// Re-attaching is a no-op. Unknown snippets yield `NotFound`.
    async fn add_tag(&self, snippet_id: Uuid, name: &str) -> StoreResult<()>;

    /// Detaches `name` from one snippet. Detaching something that was never
    /// attached succeeds.
    async fn remove_tag(&self, snippet_id: Uuid, name: &str) -> StoreResult<()>;

    /// Tag names attached to the snippet, sorted.
    async fn snippet_tags(&self, snippet_id: Uuid) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Writes the snippet row and all tag links as one unit.
    async fn create_snippet(&self, snippet: NewSnippet) -> StoreResult<Snippet>;

    /// Replaces the snippet fields and its whole tag set as one unit.
    async fn update_snippet(&self, id: Uuid, changes: SnippetChanges) -> StoreResult<Snippet>;

    async fn get_snippet(&self, id: Uuid) -> StoreResult<Snippet>;

    async fn list_snippets(&self) -> StoreResult<Vec<Snippet>>;

    /// Removes the snippet and its tag links. Tags themselves are kept.
    async fn delete_snippet(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait FolderStore: Send + Sync {
    /// A parent, when given, must exist and belong to the same user.
    async fn create_folder(&self, folder: NewFolder) -> StoreResult<Folder>;

    async fn folders_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Folder>>;

    /// Direct child snippets and folders only.
    async fn folder_contents(&self, folder_id: Uuid) -> StoreResult<FolderContents>;

    /// Removes the folder with its descendants and unfiles their snippets.
    async fn delete_folder(&self, folder_id: Uuid) -> StoreResult<()>;
}

/// Combined store used by the HTTP layer.
#[async_trait]
pub trait Storage: UserStore + TagStore + SnippetStore + FolderStore + Send + Sync {
    /// Idempotent table creation.
    async fn init_schema(&self) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
}
