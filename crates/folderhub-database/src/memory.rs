//! In-process folder store.
//!
//! Holds every row in a single map behind an async `RwLock`. Multi-row
//! operations run under one write guard, which gives them the same
//! all-or-nothing behaviour the PostgreSQL store gets from a transaction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use folderhub_core::error::AppError;
use folderhub_core::result::AppResult;
use folderhub_core::types::{FolderId, OwnerId};
use folderhub_entity::folder::path;
use folderhub_entity::folder::{CreateFolder, Folder, SubtreeRewrite};

use crate::store::FolderStore;

#[derive(Debug, Default)]
struct MemoryState {
    folders: HashMap<FolderId, Folder>,
}

impl MemoryState {
    fn get_mut(&mut self, id: FolderId) -> AppResult<&mut Folder> {
        self.folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    fn sibling_exists(
        &self,
        owner_id: OwnerId,
        parent_id: FolderId,
        name: &str,
        except: Option<FolderId>,
    ) -> bool {
        self.folders.values().any(|f| {
            f.owner_id == owner_id
                && f.parent_id == Some(parent_id)
                && f.name == name
                && Some(f.id) != except
        })
    }

    fn collect(&self, mut keep: impl FnMut(&Folder) -> bool) -> Vec<Folder> {
        self.folders.values().filter(|f| keep(f)).cloned().collect()
    }

    fn set_path(&mut self, id: FolderId, path: &str, depth: i32, at: DateTime<Utc>) -> AppResult<()> {
        let folder = self.get_mut(id)?;
        folder.path = path.to_string();
        folder.depth = depth;
        folder.updated_at = at;
        Ok(())
    }

    fn set_parent(
        &mut self,
        id: FolderId,
        parent_id: FolderId,
        name: &str,
        path: &str,
        depth: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Folder> {
        let owner_id = match self.folders.get(&id) {
            Some(f) if !f.is_root => f.owner_id,
            _ => return Err(AppError::not_found(format!("Folder {id} not found"))),
        };
        if self.sibling_exists(owner_id, parent_id, name, Some(id)) {
            return Err(AppError::name_taken(format!(
                "A folder named '{name}' already exists here"
            )));
        }

        let folder = self.get_mut(id)?;
        folder.parent_id = Some(parent_id);
        folder.name = name.to_string();
        folder.path = path.to_string();
        folder.depth = depth;
        folder.updated_at = at;
        Ok(folder.clone())
    }
}

/// Folder store kept entirely in memory.
///
/// Cloning shares the underlying rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryFolderStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryFolderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows across all owners.
    pub async fn len(&self) -> usize {
        self.state.read().await.folders.len()
    }

    /// Returns `true` if the store holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Every row belonging to `owner_id`, ordered by path.
    pub async fn snapshot(&self, owner_id: OwnerId) -> Vec<Folder> {
        let state = self.state.read().await;
        let mut rows = state.collect(|f| f.owner_id == owner_id);
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        rows
    }

    async fn update_trashed_many_inner(
        &self,
        owner_id: Option<OwnerId>,
        ids: &[FolderId],
        trashed: bool,
    ) -> u64 {
        let now = Utc::now();
        let mut state = self.state.write().await;
        let mut affected = 0;
        for id in ids {
            if let Some(folder) = state.folders.get_mut(id) {
                if folder.is_root || owner_id.is_some_and(|o| o != folder.owner_id) {
                    continue;
                }
                folder.trashed = trashed;
                folder.trashed_at = trashed.then_some(now);
                folder.updated_at = now;
                affected += 1;
            }
        }
        affected
    }
}

fn by_name(rows: &mut [Folder]) {
    rows.sort_by(|a, b| a.name.cmp(&b.name));
}

#[async_trait]
impl FolderStore for MemoryFolderStore {
    async fn get_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self.state.read().await.folders.get(&id).cloned())
    }

    async fn get_root(&self, owner_id: OwnerId) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .find(|f| f.owner_id == owner_id && f.is_root)
            .cloned())
    }

    async fn get_by_owner_parent_name(
        &self,
        owner_id: OwnerId,
        parent_id: FolderId,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .find(|f| f.owner_id == owner_id && f.parent_id == Some(parent_id) && f.name == name)
            .cloned())
    }

    async fn list_by_parent(
        &self,
        owner_id: OwnerId,
        parent_id: FolderId,
    ) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut rows = state.collect(|f| f.owner_id == owner_id && f.parent_id == Some(parent_id));
        by_name(&mut rows);
        Ok(rows)
    }

    async fn list_descendants(&self, owner_id: OwnerId, path: &str) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut rows =
            state.collect(|f| f.owner_id == owner_id && path::is_descendant_path(&f.path, path));
        rows.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.path.cmp(&b.path)));
        Ok(rows)
    }

    async fn list_starred(&self, owner_id: OwnerId) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut rows = state.collect(|f| f.owner_id == owner_id && f.starred && !f.trashed);
        by_name(&mut rows);
        Ok(rows)
    }

    async fn list_trashed(&self, owner_id: OwnerId) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut rows = state.collect(|f| f.owner_id == owner_id && f.trashed);
        rows.sort_by(|a, b| b.trashed_at.cmp(&a.trashed_at));
        Ok(rows)
    }

    async fn search(&self, owner_id: OwnerId, query: &str) -> AppResult<Vec<Folder>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        let mut rows = state.collect(|f| {
            f.owner_id == owner_id
                && !f.trashed
                && !f.is_root
                && f.name.to_lowercase().contains(&needle)
        });
        by_name(&mut rows);
        Ok(rows)
    }

    async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        let mut state = self.state.write().await;

        if state.folders.contains_key(&data.id) {
            return Err(AppError::conflict(format!("Folder {} already exists", data.id)));
        }
        if data.is_root
            && state
                .folders
                .values()
                .any(|f| f.owner_id == data.owner_id && f.is_root)
        {
            return Err(AppError::conflict("Root folder already exists"));
        }
        if let Some(parent_id) = data.parent_id {
            if state.sibling_exists(data.owner_id, parent_id, &data.name, None) {
                return Err(AppError::name_taken(format!(
                    "A folder named '{}' already exists here",
                    data.name
                )));
            }
        }

        let folder = data.clone().into_folder(Utc::now());
        state.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn update(&self, folder: &Folder) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        let stored = state.get_mut(folder.id)?;
        stored.color = folder.color.clone();
        stored.description = folder.description.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn update_path(&self, id: FolderId, path: &str, depth: i32) -> AppResult<()> {
        self.state
            .write()
            .await
            .set_path(id, path, depth, Utc::now())
    }

    async fn update_parent(
        &self,
        id: FolderId,
        parent_id: FolderId,
        name: &str,
        path: &str,
        depth: i32,
    ) -> AppResult<()> {
        self.state
            .write()
            .await
            .set_parent(id, parent_id, name, path, depth, Utc::now())?;
        Ok(())
    }

    async fn update_trashed(&self, id: FolderId, trashed: bool) -> AppResult<()> {
        let affected = self
            .update_trashed_many_inner(None, &[id], trashed)
            .await;
        if affected == 0 {
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
        Ok(self
            .update_trashed_many_inner(Some(owner_id), ids, trashed)
            .await)
    }

    async fn update_starred(&self, id: FolderId, starred: bool) -> AppResult<()> {
        let mut state = self.state.write().await;
        let folder = state.get_mut(id)?;
        folder.starred = starred;
        folder.updated_at = Utc::now();
        Ok(())
    }

    async fn apply_rewrite(&self, rewrite: &SubtreeRewrite) -> AppResult<Folder> {
        let mut state = self.state.write().await;

        match state.folders.get(&rewrite.folder_id) {
            Some(f) if f.owner_id == rewrite.owner_id => {}
            _ => {
                return Err(AppError::not_found(format!(
                    "Folder {} not found",
                    rewrite.folder_id
                )));
            }
        }
        if let Some(missing) = rewrite
            .descendants
            .iter()
            .find(|d| !state.folders.contains_key(&d.id))
        {
            return Err(AppError::not_found(format!("Folder {} not found", missing.id)));
        }

        // Only the sibling check can fail past this point, before any write.
        let folder = state.set_parent(
            rewrite.folder_id,
            rewrite.parent_id,
            &rewrite.name,
            &rewrite.path,
            rewrite.depth,
            rewrite.updated_at,
        )?;
        for update in &rewrite.descendants {
            state.set_path(update.id, &update.path, update.depth, rewrite.updated_at)?;
        }

        debug!(
            folder_id = %rewrite.folder_id,
            descendants = rewrite.descendants.len(),
            "Applied subtree rewrite"
        );
        Ok(folder)
    }

    async fn delete_many(&self, owner_id: OwnerId, ids: &[FolderId]) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut removed = 0;
        for id in ids {
            let matches = state
                .folders
                .get(id)
                .is_some_and(|f| f.owner_id == owner_id && !f.is_root);
            if matches {
                state.folders.remove(id);
                removed += 1;
            }
        }
        Ok(removed)
    }
}
