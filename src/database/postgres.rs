use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgExecutor, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{
    normalize_tags, Folder, FolderContents, NewFolder, NewSnippet, NewUser, Snippet,
    SnippetChanges, User,
};
use crate::database::schema;
use crate::database::store::{
    FolderStore, SnippetStore, Storage, StoreError, StoreResult, TagStore, UserStore,
};

const SNIPPET_COLUMNS: &str = "id, title, COALESCE(description, '') AS description, language, code, \
     user_id, folder_id, created_at, updated_at";

/// Snippet rows with their tag names aggregated in the same statement, so a
/// reader sees the row and its tags from one snapshot.
const SNIPPET_WITH_TAGS: &str = "SELECT s.id, s.title, COALESCE(s.description, '') AS description, \
     s.language, s.code, s.user_id, s.folder_id, s.created_at, s.updated_at, \
     COALESCE(array_agg(t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL), '{}')::text[] AS tags \
     FROM snippets s \
     LEFT JOIN snippet_tags st ON st.snippet_id = s.id \
     LEFT JOIN tags t ON t.id = st.tag_id";

const FOLDER_COLUMNS: &str = "id, name, parent_id, user_id, created_at, updated_at";

const USER_COLUMNS: &str = "id, username, email, password AS password_hash, created_at, updated_at";

/// Postgres-backed store. Composite writes run inside one transaction each;
/// an early return drops the transaction, which rolls it back.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Get-or-create a tag inside the caller's transaction. The no-op update on
/// conflict makes `RETURNING` yield the existing id.
async fn ensure_tag_in(conn: &mut PgConnection, name: &str) -> StoreResult<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO tags (id, name) VALUES ($1, $2) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

async fn attach_in(conn: &mut PgConnection, snippet_id: Uuid, tag_id: Uuid) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO snippet_tags (snippet_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(snippet_id)
    .bind(tag_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn attach_all(conn: &mut PgConnection, snippet_id: Uuid, tags: &[String]) -> StoreResult<()> {
    for name in tags {
        let tag_id = ensure_tag_in(&mut *conn, name).await?;
        attach_in(&mut *conn, snippet_id, tag_id).await?;
    }
    Ok(())
}

async fn load_tags<'e, E: PgExecutor<'e>>(executor: E, snippet_id: Uuid) -> StoreResult<Vec<String>> {
    let tags = sqlx::query_scalar::<_, String>(
        "SELECT t.name FROM tags t \
         JOIN snippet_tags st ON t.id = st.tag_id \
         WHERE st.snippet_id = $1 \
         ORDER BY t.name",
    )
    .bind(snippet_id)
    .fetch_all(executor)
    .await?;
    Ok(tags)
}

/// Maps constraint violations onto store error kinds; everything else stays opaque.
fn classify(err: sqlx::Error, context: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            let what = match db_err.constraint() {
                Some("users_username_key") => "username is already taken",
                Some("users_email_key") => "email is already registered",
                _ => "record already exists",
            };
            return StoreError::Duplicate(what.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::InvalidReference(format!("{}: referenced record does not exist", context));
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (id, username, email, password, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "user"))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl TagStore for PgStore {
    async fn ensure_tag(&self, name: &str) -> StoreResult<Uuid> {
        let mut conn = self.pool.acquire().await?;
        ensure_tag_in(&mut conn, name).await
    }

    async fn add_tag(&self, snippet_id: Uuid, name: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        // Also locks the snippet row against a concurrent delete
        let touched = sqlx::query("UPDATE snippets SET updated_at = $2 WHERE id = $1")
            .bind(snippet_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if touched == 0 {
            return Err(StoreError::NotFound(format!("snippet {}", snippet_id)));
        }

        let tag_id = ensure_tag_in(&mut tx, name).await?;
        attach_in(&mut tx, snippet_id, tag_id).await?;
        tx.commit().await?;

        debug!("Tag '{}' attached to snippet {}", name, snippet_id);
        Ok(())
    }

    async fn remove_tag(&self, snippet_id: Uuid, name: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM snippet_tags \
             WHERE snippet_id = $1 AND tag_id = (SELECT id FROM tags WHERE name = $2)",
        )
        .bind(snippet_id)
        .bind(name)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed > 0 {
            sqlx::query("UPDATE snippets SET updated_at = $2 WHERE id = $1")
                .bind(snippet_id)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn snippet_tags(&self, snippet_id: Uuid) -> StoreResult<Vec<String>> {
        load_tags(&self.pool, snippet_id).await
    }
}

#[async_trait]
impl SnippetStore for PgStore {
    async fn create_snippet(&self, snippet: NewSnippet) -> StoreResult<Snippet> {
        let now = Utc::now();
        let tags = normalize_tags(&snippet.tags);
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO snippets \
             (id, title, description, language, code, user_id, folder_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {}",
            SNIPPET_COLUMNS
        );
        let mut created = sqlx::query_as::<_, Snippet>(&sql)
            .bind(Uuid::new_v4())
            .bind(&snippet.title)
            .bind(&snippet.description)
            .bind(&snippet.language)
            .bind(&snippet.code)
            .bind(snippet.user_id)
            .bind(snippet.folder_id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify(e, "snippet owner"))?;

        attach_all(&mut tx, created.id, &tags).await?;
        tx.commit().await?;

        debug!("Snippet {} created with {} tags", created.id, tags.len());
        created.tags = tags;
        Ok(created)
    }

    async fn update_snippet(&self, id: Uuid, changes: SnippetChanges) -> StoreResult<Snippet> {
        let tags = normalize_tags(&changes.tags);
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE snippets SET title = $2, description = $3, language = $4, code = $5, \
             folder_id = $6, updated_at = $7 WHERE id = $1 RETURNING {}",
            SNIPPET_COLUMNS
        );
        let mut updated = sqlx::query_as::<_, Snippet>(&sql)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.language)
            .bind(&changes.code)
            .bind(changes.folder_id)
            .bind(Utc::now())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("snippet {}", id)))?;

        // Replace-all: drop every existing link, then re-materialise the incoming set
        sqlx::query("DELETE FROM snippet_tags WHERE snippet_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        attach_all(&mut tx, id, &tags).await?;
        tx.commit().await?;

        debug!("Snippet {} updated, tags replaced with {} entries", id, tags.len());
        updated.tags = tags;
        Ok(updated)
    }

    async fn get_snippet(&self, id: Uuid) -> StoreResult<Snippet> {
        let sql = format!("{} WHERE s.id = $1 GROUP BY s.id", SNIPPET_WITH_TAGS);
        sqlx::query_as::<_, Snippet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("snippet {}", id)))
    }

    async fn list_snippets(&self) -> StoreResult<Vec<Snippet>> {
        let sql = format!("{} GROUP BY s.id ORDER BY s.created_at, s.id", SNIPPET_WITH_TAGS);
        let snippets = sqlx::query_as::<_, Snippet>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(snippets)
    }

    async fn delete_snippet(&self, id: Uuid) -> StoreResult<()> {
        let deleted = sqlx::query("DELETE FROM snippets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("snippet {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl FolderStore for PgStore {
    async fn create_folder(&self, folder: NewFolder) -> StoreResult<Folder> {
        let mut tx = self.pool.begin().await?;

        if let Some(parent_id) = folder.parent_id {
            let owner = sqlx::query_scalar::<_, Uuid>(
                "SELECT user_id FROM folders WHERE id = $1 FOR SHARE",
            )
            .bind(parent_id)
            .fetch_optional(&mut *tx)
            .await?;
            match owner {
                None => {
                    return Err(StoreError::InvalidReference(format!(
                        "parent folder {} does not exist",
                        parent_id
                    )))
                }
                Some(owner) if owner != folder.user_id => {
                    return Err(StoreError::InvalidReference(format!(
                        "parent folder {} belongs to another user",
                        parent_id
                    )))
                }
                Some(_) => {}
            }
        }

        let sql = format!(
            "INSERT INTO folders (id, name, parent_id, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {}",
            FOLDER_COLUMNS
        );
        let created = sqlx::query_as::<_, Folder>(&sql)
            .bind(Uuid::new_v4())
            .bind(&folder.name)
            .bind(folder.parent_id)
            .bind(folder.user_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify(e, "folder owner"))?;
        tx.commit().await?;
        Ok(created)
    }

    async fn folders_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Folder>> {
        let sql = format!(
            "SELECT {} FROM folders WHERE user_id = $1 ORDER BY created_at, id",
            FOLDER_COLUMNS
        );
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(folders)
    }

    async fn folder_contents(&self, folder_id: Uuid) -> StoreResult<FolderContents> {
        let sql = format!(
            "{} WHERE s.folder_id = $1 GROUP BY s.id ORDER BY s.created_at, s.id",
            SNIPPET_WITH_TAGS
        );
        let snippets = sqlx::query_as::<_, Snippet>(&sql)
            .bind(folder_id)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM folders WHERE parent_id = $1 ORDER BY created_at, id",
            FOLDER_COLUMNS
        );
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .bind(folder_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(FolderContents { snippets, folders })
    }

    async fn delete_folder(&self, folder_id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let subtree = sqlx::query_scalar::<_, Uuid>(
            "WITH RECURSIVE tree AS ( \
                SELECT id FROM folders WHERE id = $1 \
                UNION ALL \
                SELECT f.id FROM folders f INNER JOIN tree t ON f.parent_id = t.id \
             ) SELECT id FROM tree",
        )
        .bind(folder_id)
        .fetch_all(&mut *tx)
        .await?;
        if subtree.is_empty() {
            return Err(StoreError::NotFound(format!("folder {}", folder_id)));
        }

        let unfiled = sqlx::query(
            "UPDATE snippets SET folder_id = NULL, updated_at = $2 WHERE folder_id = ANY($1)",
        )
        .bind(&subtree)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Child folders go with the parent through ON DELETE CASCADE
        sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(folder_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(
            "Folder {} deleted ({} folders, {} snippets unfiled)",
            folder_id,
            subtree.len(),
            unfiled
        );
        Ok(())
    }
}

#[async_trait]
impl Storage for PgStore {
    async fn init_schema(&self) -> StoreResult<()> {
        schema::init_schema(&self.pool).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        DatabaseManager::health_check(&self.pool).await
    }
}
