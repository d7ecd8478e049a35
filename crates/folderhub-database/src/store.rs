//! The folder store contract.

use async_trait::async_trait;

use folderhub_core::result::AppResult;
use folderhub_core::types::{FolderId, OwnerId};
use folderhub_entity::folder::{CreateFolder, Folder, SubtreeRewrite};

/// Persistence contract for folder rows.
///
/// Implementations must enforce, at the storage level, that no two
/// non-root folders share `(owner_id, parent_id, name)` and that an owner
/// has at most one root. Violations surface as `NameTaken` and `Conflict`
/// respectively so callers can react to races they lost.
#[async_trait]
pub trait FolderStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a folder by ID.
    async fn get_by_id(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Find the owner's root folder.
    async fn get_root(&self, owner_id: OwnerId) -> AppResult<Option<Folder>>;

    /// Find a child of `parent_id` by exact name.
    async fn get_by_owner_parent_name(
        &self,
        owner_id: OwnerId,
        parent_id: FolderId,
        name: &str,
    ) -> AppResult<Option<Folder>>;

    /// List direct children of a folder, trashed ones included, ordered by name.
    async fn list_by_parent(&self, owner_id: OwnerId, parent_id: FolderId)
    -> AppResult<Vec<Folder>>;

    /// List every folder strictly below `path`, ordered by depth then path.
    async fn list_descendants(&self, owner_id: OwnerId, path: &str) -> AppResult<Vec<Folder>>;

    /// List starred, non-trashed folders.
    async fn list_starred(&self, owner_id: OwnerId) -> AppResult<Vec<Folder>>;

    /// List trashed folders.
    async fn list_trashed(&self, owner_id: OwnerId) -> AppResult<Vec<Folder>>;

    /// Case-insensitive substring search over non-trashed folder names.
    async fn search(&self, owner_id: OwnerId, query: &str) -> AppResult<Vec<Folder>>;

    /// Insert a folder.
    async fn create(&self, data: &CreateFolder) -> AppResult<Folder>;

    /// Persist the non-structural attributes (color, description) of `folder`.
    async fn update(&self, folder: &Folder) -> AppResult<Folder>;

    /// Overwrite a folder's path and depth.
    async fn update_path(&self, id: FolderId, path: &str, depth: i32) -> AppResult<()>;

    /// Re-parent and/or rename a folder, setting its new path and depth.
    async fn update_parent(
        &self,
        id: FolderId,
        parent_id: FolderId,
        name: &str,
        path: &str,
        depth: i32,
    ) -> AppResult<()>;

    /// Set or clear the trashed flag on one folder.
    async fn update_trashed(&self, id: FolderId, trashed: bool) -> AppResult<()>;

    /// Set or clear the trashed flag on many folders at once.
    async fn update_trashed_many(
        &self,
        owner_id: OwnerId,
        ids: &[FolderId],
        trashed: bool,
    ) -> AppResult<u64>;

    /// Set or clear the starred flag.
    async fn update_starred(&self, id: FolderId, starred: bool) -> AppResult<()>;

    /// Apply a structural rewrite atomically: either the folder and every
    /// listed descendant change, or nothing does.
    async fn apply_rewrite(&self, rewrite: &SubtreeRewrite) -> AppResult<Folder>;

    /// Permanently delete the given rows atomically. Returns the number removed.
    async fn delete_many(&self, owner_id: OwnerId, ids: &[FolderId]) -> AppResult<u64>;
}
