//! PostgreSQL folder store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use tracing::debug;
use uuid::Uuid;

use folderhub_core::error::{AppError, ErrorKind};
use folderhub_core::result::AppResult;
use folderhub_core::types::{FolderId, OwnerId};
use folderhub_entity::folder::path;
use folderhub_entity::folder::{CreateFolder, Folder, SubtreeRewrite};

use crate::store::FolderStore;

/// Unique index on `(owner_id, parent_id, name)` for non-root rows.
const SIBLING_NAME_KEY: &str = "folders_owner_parent_name_key";
/// Partial unique index allowing one root per owner.
const OWNER_ROOT_KEY: &str = "folders_owner_root_key";

/// Folder store backed by the `folders` table.
#[derive(Debug, Clone)]
pub struct PgFolderStore {
    pool: PgPool,
}

impl PgFolderStore {
    /// Create a new folder store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

/// Map a write failure, translating the folder uniqueness indexes.
fn write_error(e: sqlx::Error, name: &str, message: &'static str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(SIBLING_NAME_KEY) => {
            AppError::name_taken(format!("A folder named '{name}' already exists here"))
        }
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(OWNER_ROOT_KEY) => {
            AppError::conflict("Root folder already exists")
        }
        _ => AppError::with_source(ErrorKind::Database, message, e),
    }
}

/// Escape `%`, `_` and `\` for use inside a `LIKE` pattern.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn uuids(ids: &[FolderId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

async fn update_path_with<'e, E>(
    executor: E,
    id: FolderId,
    path: &str,
    depth: i32,
    at: DateTime<Utc>,
) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    let result =
        sqlx::query("UPDATE folders SET path = $2, depth = $3, updated_at = $4 WHERE id = $1")
            .bind(id)
            .bind(path)
            .bind(depth)
            .bind(at)
            .execute(executor)
            .await
            .map_err(db_error("Failed to update folder path"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("Folder {id} not found")));
    }
    Ok(())
}

async fn update_parent_with<'e, E>(
    executor: E,
    id: FolderId,
    parent_id: FolderId,
    name: &str,
    path: &str,
    depth: i32,
    at: DateTime<Utc>,
) -> AppResult<Folder>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Folder>(
        "UPDATE folders SET parent_id = $2, name = $3, path = $4, depth = $5, updated_at = $6 \
         WHERE id = $1 AND is_root = FALSE RETURNING *",
    )
    .bind(id)
    .bind(parent_id)
    .bind(name)
    .bind(path)
    .bind(depth)
    .bind(at)
    .fetch_optional(executor)
    .await
    .map_err(|e| write_error(e, name, "Failed to move folder"))?
    .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
}

/// Serialize structural writes for one owner until the transaction ends.
async fn lock_owner<'e, E>(executor: E, owner_id: OwnerId) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(owner_id.to_string())
        .execute(executor)
        .await
        .map_err(db_error("Failed to lock folder tree"))?;
    Ok(())
}

#[async_trait]
impl FolderStore for PgFolderStore {
    async fn get_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find folder"))
    }

    async fn get_root(&self, owner_id: OwnerId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE owner_id = $1 AND is_root")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find root folder"))
    }

    async fn get_by_owner_parent_name(
        &self,
        owner_id: OwnerId,
        parent_id: FolderId,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND parent_id = $2 AND name = $3",
        )
        .bind(owner_id)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find folder by name"))
    }

    async fn list_by_parent(
        &self,
        owner_id: OwnerId,
        parent_id: FolderId,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND parent_id = $2 ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list child folders"))
    }

    async fn list_descendants(&self, owner_id: OwnerId, path: &str) -> AppResult<Vec<Folder>> {
        let pattern = format!("{}%", escape_like(&path::descendant_prefix(path)));
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND path LIKE $2 ESCAPE '\\' AND path <> $3 \
             ORDER BY depth ASC, path ASC",
        )
        .bind(owner_id)
        .bind(pattern)
        .bind(path)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list descendants"))
    }

    async fn list_starred(&self, owner_id: OwnerId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND starred AND NOT trashed \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list starred folders"))
    }

    async fn list_trashed(&self, owner_id: OwnerId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND trashed ORDER BY trashed_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list trashed folders"))
    }

    async fn search(&self, owner_id: OwnerId, query: &str) -> AppResult<Vec<Folder>> {
        let pattern = format!("%{}%", escape_like(query));
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND NOT trashed AND NOT is_root AND name ILIKE $2 ESCAPE '\\' \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to search folders"))
    }

    async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders \
             (id, owner_id, parent_id, name, path, depth, color, description, is_root) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(data.id)
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(&data.path)
        .bind(data.depth)
        .bind(&data.color)
        .bind(&data.description)
        .bind(data.is_root)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, &data.name, "Failed to create folder"))
    }

    async fn update(&self, folder: &Folder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET color = $2, description = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(folder.id)
        .bind(&folder.color)
        .bind(&folder.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update folder"))?
        .ok_or_else(|| AppError::not_found(format!("Folder {} not found", folder.id)))
    }

    async fn update_path(&self, id: FolderId, path: &str, depth: i32) -> AppResult<()> {
        update_path_with(&self.pool, id, path, depth, Utc::now()).await
    }

    async fn update_parent(
        &self,
        id: FolderId,
        parent_id: FolderId,
        name: &str,
        path: &str,
        depth: i32,
    ) -> AppResult<()> {
        update_parent_with(&self.pool, id, parent_id, name, path, depth, Utc::now()).await?;
        Ok(())
    }

    async fn update_trashed(&self, id: FolderId, trashed: bool) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE folders SET trashed = $2, \
             trashed_at = CASE WHEN $2 THEN NOW() ELSE NULL END, updated_at = NOW() \
             WHERE id = $1 AND is_root = FALSE",
        )
        .bind(id)
        .bind(trashed)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update trashed flag"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }
        Ok(())
    }

    async fn update_trashed_many(
        &self,
        owner_id: OwnerId,
        ids: &[FolderId],
        trashed: bool,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE folders SET trashed = $3, \
             trashed_at = CASE WHEN $3 THEN NOW() ELSE NULL END, updated_at = NOW() \
             WHERE owner_id = $1 AND id = ANY($2) AND is_root = FALSE",
        )
        .bind(owner_id)
        .bind(uuids(ids))
        .bind(trashed)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update trashed flags"))?;
        Ok(result.rows_affected())
    }

    async fn update_starred(&self, id: FolderId, starred: bool) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE folders SET starred = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(starred)
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to update starred flag"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }
        Ok(())
    }

    async fn apply_rewrite(&self, rewrite: &SubtreeRewrite) -> AppResult<Folder> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        lock_owner(&mut *tx, rewrite.owner_id).await?;

        let folder = update_parent_with(
            &mut *tx,
            rewrite.folder_id,
            rewrite.parent_id,
            &rewrite.name,
            &rewrite.path,
            rewrite.depth,
            rewrite.updated_at,
        )
        .await?;

        for update in &rewrite.descendants {
            update_path_with(
                &mut *tx,
                update.id,
                &update.path,
                update.depth,
                rewrite.updated_at,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit folder rewrite"))?;

        debug!(
            folder_id = %rewrite.folder_id,
            descendants = rewrite.descendants.len(),
            "Applied subtree rewrite"
        );
        Ok(folder)
    }

    async fn delete_many(&self, owner_id: OwnerId, ids: &[FolderId]) -> AppResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        lock_owner(&mut *tx, owner_id).await?;

        let result =
            sqlx::query("DELETE FROM folders WHERE owner_id = $1 AND id = ANY($2) AND NOT is_root")
                .bind(owner_id)
                .bind(uuids(ids))
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to delete folders"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit folder deletion"))?;
        Ok(result.rows_affected())
    }
}
