//! In-process backend with the same observable contracts as [`PgStore`].
//!
//! Every operation holds the single write lock for its whole duration and
//! validates before mutating, so composite writes are all-or-nothing and
//! conflicting writes are serialized.
//!
//! [`PgStore`]: crate::database::PgStore

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    normalize_tags, Folder, FolderContents, NewFolder, NewSnippet, NewUser, Snippet,
    SnippetChanges, User,
};
use crate::database::store::{
    FolderStore, SnippetStore, Storage, StoreError, StoreResult, TagStore, UserStore,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Rows without tags; tag names are joined in on read.
    snippets: HashMap<Uuid, Snippet>,
    tag_ids: HashMap<String, Uuid>,
    tag_names: HashMap<Uuid, String>,
    /// (snippet_id, tag_id)
    snippet_tags: BTreeSet<(Uuid, Uuid)>,
    folders: HashMap<Uuid, Folder>,
}

impl Tables {
    fn ensure_tag(&mut self, name: &str) -> Uuid {
        if let Some(id) = self.tag_ids.get(name) {
            return *id;
        }
        let id = Uuid::new_v4();
        self.tag_ids.insert(name.to_string(), id);
        self.tag_names.insert(id, name.to_string());
        id
    }

    fn attach_all(&mut self, snippet_id: Uuid, tags: &[String]) {
        for name in tags {
            let tag_id = self.ensure_tag(name);
            self.snippet_tags.insert((snippet_id, tag_id));
        }
    }

    fn tags_of(&self, snippet_id: Uuid) -> Vec<String> {
        let mut names: Vec<String> = self
            .snippet_tags
            .iter()
            .filter(|(sid, _)| *sid == snippet_id)
            .filter_map(|(_, tid)| self.tag_names.get(tid).cloned())
            .collect();
        names.sort();
        names
    }

    fn with_tags(&self, snippet: &Snippet) -> Snippet {
        let mut out = snippet.clone();
        out.tags = self.tags_of(snippet.id);
        out
    }

    fn sorted_snippets<'a>(&self, rows: impl Iterator<Item = &'a Snippet>) -> Vec<Snippet> {
        let mut out: Vec<Snippet> = rows.map(|s| self.with_tags(s)).collect();
        out.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        out
    }

    fn sorted_folders<'a>(rows: impl Iterator<Item = &'a Folder>) -> Vec<Folder> {
        let mut out: Vec<Folder> = rows.cloned().collect();
        out.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        out
    }

    fn subtree(&self, root: Uuid) -> Vec<Uuid> {
        let mut found = vec![root];
        let mut cursor = 0;
        while cursor < found.len() {
            let parent = found[cursor];
            found.extend(
                self.folders
                    .values()
                    .filter(|f| f.parent_id == Some(parent))
                    .map(|f| f.id),
            );
            cursor += 1;
        }
        found
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct tag rows. Tags are never reclaimed.
    pub async fn tag_count(&self) -> usize {
        self.tables.read().await.tag_ids.len()
    }

    /// Number of snippet/tag association rows.
    pub async fn link_count(&self) -> usize {
        self.tables.read().await.snippet_tags.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username is already taken".to_string()));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email is already registered".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn ensure_tag(&self, name: &str) -> StoreResult<Uuid> {
        Ok(self.tables.write().await.ensure_tag(name))
    }

    async fn add_tag(&self, snippet_id: Uuid, name: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let snippet = tables
            .snippets
            .get_mut(&snippet_id)
            .ok_or_else(|| StoreError::NotFound(format!("snippet {}", snippet_id)))?;
        snippet.updated_at = Utc::now();

        let tag_id = tables.ensure_tag(name);
        tables.snippet_tags.insert((snippet_id, tag_id));
        Ok(())
    }

    async fn remove_tag(&self, snippet_id: Uuid, name: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let Some(tag_id) = tables.tag_ids.get(name).copied() else {
            return Ok(());
        };
        if tables.snippet_tags.remove(&(snippet_id, tag_id)) {
            if let Some(snippet) = tables.snippets.get_mut(&snippet_id) {
                snippet.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn snippet_tags(&self, snippet_id: Uuid) -> StoreResult<Vec<String>> {
        Ok(self.tables.read().await.tags_of(snippet_id))
    }
}

#[async_trait]
impl SnippetStore for MemoryStore {
    async fn create_snippet(&self, snippet: NewSnippet) -> StoreResult<Snippet> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&snippet.user_id) {
            return Err(StoreError::InvalidReference(
                "snippet owner: referenced record does not exist".to_string(),
            ));
        }

        let now = Utc::now();
        let tags = normalize_tags(&snippet.tags);
        let row = Snippet {
            id: Uuid::new_v4(),
            title: snippet.title,
            description: snippet.description,
            language: snippet.language,
            code: snippet.code,
            user_id: snippet.user_id,
            folder_id: snippet.folder_id,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.snippets.insert(row.id, row.clone());
        tables.attach_all(row.id, &tags);
        Ok(tables.with_tags(&row))
    }

    async fn update_snippet(&self, id: Uuid, changes: SnippetChanges) -> StoreResult<Snippet> {
        let mut tables = self.tables.write().await;
        let tags = normalize_tags(&changes.tags);

        let row = tables
            .snippets
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("snippet {}", id)))?;
        row.title = changes.title;
        row.description = changes.description;
        row.language = changes.language;
        row.code = changes.code;
        row.folder_id = changes.folder_id;
        row.updated_at = Utc::now();
        let row = row.clone();

        tables.snippet_tags.retain(|(sid, _)| *sid != id);
        tables.attach_all(id, &tags);
        Ok(tables.with_tags(&row))
    }

    async fn get_snippet(&self, id: Uuid) -> StoreResult<Snippet> {
        let tables = self.tables.read().await;
        tables
            .snippets
            .get(&id)
            .map(|s| tables.with_tags(s))
            .ok_or_else(|| StoreError::NotFound(format!("snippet {}", id)))
    }

    async fn list_snippets(&self) -> StoreResult<Vec<Snippet>> {
        let tables = self.tables.read().await;
        Ok(tables.sorted_snippets(tables.snippets.values()))
    }

    async fn delete_snippet(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.snippets.remove(&id).is_none() {
            return Err(StoreError::NotFound(format!("snippet {}", id)));
        }
        tables.snippet_tags.retain(|(sid, _)| *sid != id);
        Ok(())
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn create_folder(&self, folder: NewFolder) -> StoreResult<Folder> {
        let mut tables = self.tables.write().await;
        if let Some(parent_id) = folder.parent_id {
            match tables.folders.get(&parent_id) {
                None => {
                    return Err(StoreError::InvalidReference(format!(
                        "parent folder {} does not exist",
                        parent_id
                    )))
                }
                Some(parent) if parent.user_id != folder.user_id => {
                    return Err(StoreError::InvalidReference(format!(
                        "parent folder {} belongs to another user",
                        parent_id
                    )))
                }
                Some(_) => {}
            }
        }
        if !tables.users.contains_key(&folder.user_id) {
            return Err(StoreError::InvalidReference(
                "folder owner: referenced record does not exist".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Folder {
            id: Uuid::new_v4(),
            name: folder.name,
            parent_id: folder.parent_id,
            user_id: folder.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.folders.insert(created.id, created.clone());
        Ok(created)
    }

    async fn folders_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Folder>> {
        let tables = self.tables.read().await;
        Ok(Tables::sorted_folders(
            tables.folders.values().filter(|f| f.user_id == user_id),
        ))
    }

    async fn folder_contents(&self, folder_id: Uuid) -> StoreResult<FolderContents> {
        let tables = self.tables.read().await;
        let snippets = tables.sorted_snippets(
            tables
                .snippets
                .values()
                .filter(|s| s.folder_id == Some(folder_id)),
        );
        let folders = Tables::sorted_folders(
            tables
                .folders
                .values()
                .filter(|f| f.parent_id == Some(folder_id)),
        );
        Ok(FolderContents { snippets, folders })
    }

    async fn delete_folder(&self, folder_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.folders.contains_key(&folder_id) {
            return Err(StoreError::NotFound(format!("folder {}", folder_id)));
        }

        let subtree = tables.subtree(folder_id);
        let now = Utc::now();
        for snippet in tables.snippets.values_mut() {
            if snippet.folder_id.is_some_and(|f| subtree.contains(&f)) {
                snippet.folder_id = None;
                snippet.updated_at = now;
            }
        }
        for id in &subtree {
            tables.folders.remove(id);
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn init_schema(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        (store, user.id)
    }

    fn new_snippet(user_id: Uuid, tags: &[&str]) -> NewSnippet {
        NewSnippet {
            title: "t".to_string(),
            description: String::new(),
            language: "py".to_string(),
            code: "print(1)".to_string(),
            user_id,
            folder_id: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn ensure_tag_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.ensure_tag("rust").await.unwrap();
        let second = store.ensure_tag("rust").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.tag_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let (store, _) = store_with_user().await;
        let err = store
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn create_with_unknown_owner_leaves_no_rows() {
        let store = MemoryStore::new();
        let err = store
            .create_snippet(new_snippet(Uuid::new_v4(), &["demo"]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(_)));
        assert!(store.list_snippets().await.unwrap().is_empty());
        assert_eq!(store.tag_count().await, 0);
    }

    #[tokio::test]
    async fn delete_folder_removes_subtree_and_unfiles_snippets() {
        let (store, user_id) = store_with_user().await;
        let root = store
            .create_folder(NewFolder { name: "root".into(), parent_id: None, user_id })
            .await
            .unwrap();
        let child = store
            .create_folder(NewFolder { name: "child".into(), parent_id: Some(root.id), user_id })
            .await
            .unwrap();
        let mut filed = new_snippet(user_id, &[]);
        filed.folder_id = Some(child.id);
        let filed = store.create_snippet(filed).await.unwrap();

        store.delete_folder(root.id).await.unwrap();

        assert!(store.folders_by_user(user_id).await.unwrap().is_empty());
        assert_eq!(store.get_snippet(filed.id).await.unwrap().folder_id, None);
        assert!(matches!(
            store.delete_folder(root.id).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
