//! Folder hierarchy operations with tree invariant enforcement.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use folderhub_core::config::FolderConfig;
use folderhub_core::error::{AppError, ErrorKind};
use folderhub_core::events::FolderEvent;
use folderhub_core::result::AppResult;
use folderhub_core::types::{FolderId, OwnerId};
use folderhub_database::FolderStore;
use folderhub_entity::folder::{CreateFolder, Folder, SubtreeRewrite};

use crate::activity::ActivityDispatcher;
use crate::context::RequestContext;
use crate::locks::OwnerLocks;

/// Request to create a new folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name (trimmed before use).
    pub name: String,
    /// Parent folder ID (`None` for the owner's root).
    pub parent_id: Option<FolderId>,
    /// Optional display color.
    pub color: Option<String>,
    /// Optional description.
    pub description: Option<String>,
}

/// Request to rename a folder and/or change its attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFolderRequest {
    /// New name.
    pub name: Option<String>,
    /// New display color.
    pub color: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Request to move a folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveFolderRequest {
    /// New parent folder ID (`None` for the owner's root).
    pub parent_id: Option<FolderId>,
}

/// Request to copy a folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyFolderRequest {
    /// Destination parent (`None` keeps the source's parent).
    pub parent_id: Option<FolderId>,
    /// Name for the copy (defaults to the source name plus the copy suffix).
    pub name: Option<String>,
}

/// Manages the per-owner folder tree.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Folder store.
    store: Arc<dyn FolderStore>,
    /// Activity sink.
    activity: ActivityDispatcher,
    /// Structural mutation locks.
    locks: OwnerLocks,
    /// Naming and depth limits.
    config: FolderConfig,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        store: Arc<dyn FolderStore>,
        activity: ActivityDispatcher,
        config: FolderConfig,
    ) -> Self {
        Self {
            store,
            activity,
            locks: OwnerLocks::new(),
            config,
        }
    }

    /// Waits for activity records dispatched by this service to finish.
    pub async fn shutdown(&self) {
        self.activity.shutdown().await;
    }

    /// Returns the owner's root folder, creating it on first use.
    ///
    /// Losing the insert race to a concurrent caller is not an error: the
    /// store rejects the second root and the winner's row is read back.
    pub async fn ensure_root(&self, ctx: &RequestContext) -> AppResult<Folder> {
        if let Some(root) = self.store.get_root(ctx.owner_id).await? {
            return Ok(root);
        }

        match self.store.create(&Folder::new_root(ctx.owner_id)).await {
            Ok(root) => {
                info!(owner_id = %ctx.owner_id, folder_id = %root.id, "Root folder created");
                Ok(root)
            }
            Err(e) if e.is(ErrorKind::Conflict) => {
                debug!(owner_id = %ctx.owner_id, "Root created concurrently, re-reading");
                self.store
                    .get_root(ctx.owner_id)
                    .await?
                    .ok_or_else(|| AppError::internal("Root folder missing after insert conflict"))
            }
            Err(e) => Err(e),
        }
    }

    /// Gets a folder owned by the caller.
    pub async fn get(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        let folder = self
            .store
            .get_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        if folder.owner_id != ctx.owner_id {
            return Err(AppError::not_owner("Folder belongs to another account"));
        }
        Ok(folder)
    }

    /// Lists the non-trashed children of a folder (default: the root).
    pub async fn list(
        &self,
        ctx: &RequestContext,
        parent_id: Option<FolderId>,
    ) -> AppResult<Vec<Folder>> {
        let parent = match parent_id {
            Some(id) => self.get(ctx, id).await?,
            None => self.ensure_root(ctx).await?,
        };
        let mut children = self.store.list_by_parent(ctx.owner_id, parent.id).await?;
        children.retain(|f| !f.trashed);
        Ok(children)
    }

    /// Lists starred folders.
    pub async fn list_starred(&self, ctx: &RequestContext) -> AppResult<Vec<Folder>> {
        self.store.list_starred(ctx.owner_id).await
    }

    /// Lists trashed folders, most recently trashed first.
    pub async fn list_trashed(&self, ctx: &RequestContext) -> AppResult<Vec<Folder>> {
        self.store.list_trashed(ctx.owner_id).await
    }

    /// Searches non-trashed folders by name.
    pub async fn search(&self, ctx: &RequestContext, query: &str) -> AppResult<Vec<Folder>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search(ctx.owner_id, query).await
    }

    /// Returns the chain of folders from the root down to `folder_id`.
    pub async fn get_path(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<Vec<Folder>> {
        let folder = self.get(ctx, folder_id).await?;
        let mut chain = Vec::with_capacity(folder.depth as usize + 1);
        let mut next = folder.parent_id;
        chain.push(folder);

        while let Some(id) = next {
            if chain.len() > self.config.max_depth as usize + 1 {
                return Err(AppError::internal(format!(
                    "Ancestor chain of folder {folder_id} exceeds the maximum depth"
                )));
            }
            let ancestor = self
                .store
                .get_by_id(id)
                .await?
                .ok_or_else(|| AppError::internal(format!("Ancestor folder {id} is missing")))?;
            next = ancestor.parent_id;
            chain.push(ancestor);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Creates a new folder.
    pub async fn create(&self, ctx: &RequestContext, req: CreateFolderRequest) -> AppResult<Folder> {
        let name = self.validate_name(&req.name)?;
        let _guard = self.locks.acquire(ctx.owner_id).await;

        let parent = self.resolve_parent(ctx, req.parent_id).await?;
        self.check_depth(parent.depth + 1)?;
        self.ensure_name_free(ctx.owner_id, parent.id, &name, None)
            .await?;

        let mut data = CreateFolder::child_of(&parent, name);
        data.color = req.color;
        data.description = req.description;

        let folder = self.store.create(&data).await?;

        info!(
            owner_id = %ctx.owner_id,
            folder_id = %folder.id,
            path = %folder.path,
            "Folder created"
        );
        self.activity.dispatch(
            ctx.owner_id,
            FolderEvent::Created {
                folder_id: folder.id,
                path: folder.path.clone(),
            },
        );

        Ok(folder)
    }

    /// Renames a folder and/or updates its attributes.
    ///
    /// A rename rewrites the path prefix of every descendant; depths are
    /// unchanged. Attribute-only updates touch a single row.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        req: UpdateFolderRequest,
    ) -> AppResult<Folder> {
        let new_name = req
            .name
            .as_deref()
            .map(|n| self.validate_name(n))
            .transpose()?;
        let _guard = self.locks.acquire(ctx.owner_id).await;

        let mut folder = self.get(ctx, folder_id).await?;
        if folder.is_root {
            return Err(AppError::cannot_move("The root folder cannot be modified"));
        }

        let mut changed_fields = Vec::new();
        let color = req
            .color
            .filter(|c| folder.color.as_deref() != Some(c.as_str()));
        if color.is_some() {
            changed_fields.push("color".to_string());
        }
        let description = req
            .description
            .filter(|d| folder.description.as_deref() != Some(d.as_str()));
        if description.is_some() {
            changed_fields.push("description".to_string());
        }

        // Attributes are written only after the rename has committed, so a
        // rejected rename leaves the row untouched.
        if let Some(name) = new_name.filter(|n| *n != folder.name) {
            let parent_id = folder
                .parent_id
                .ok_or_else(|| AppError::cannot_move("The root folder cannot be renamed"))?;
            self.ensure_name_free(ctx.owner_id, parent_id, &name, Some(folder.id))
                .await?;
            folder = self.rename(ctx, folder, &name).await?;
        }

        if !changed_fields.is_empty() {
            if let Some(color) = color {
                folder.color = Some(color);
            }
            if let Some(description) = description {
                folder.description = Some(description);
            }
            folder = self.store.update(&folder).await?;

            info!(
                owner_id = %ctx.owner_id,
                folder_id = %folder.id,
                fields = ?changed_fields,
                "Folder updated"
            );
            self.activity.dispatch(
                ctx.owner_id,
                FolderEvent::Updated {
                    folder_id: folder.id,
                    changed_fields,
                },
            );
        }

        Ok(folder)
    }

    /// Moves a folder under a new parent (default: the root).
    ///
    /// Every descendant's path is re-prefixed and its depth shifted by the
    /// same amount as the moved folder's.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        req: MoveFolderRequest,
    ) -> AppResult<Folder> {
        let _guard = self.locks.acquire(ctx.owner_id).await;

        let folder = self.get(ctx, folder_id).await?;
        if folder.is_root {
            return Err(AppError::cannot_move("The root folder cannot be moved"));
        }
        if req.parent_id == Some(folder.id) {
            return Err(AppError::cannot_move("Cannot move a folder into itself"));
        }

        let parent = self.resolve_parent(ctx, req.parent_id).await?;
        if folder.is_ancestor_of(&parent) {
            return Err(AppError::cannot_move(
                "Cannot move a folder into one of its descendants",
            ));
        }
        if folder.parent_id == Some(parent.id) {
            return Err(AppError::cannot_move(
                "Folder is already in the destination",
            ));
        }
        self.ensure_name_free(ctx.owner_id, parent.id, &folder.name, Some(folder.id))
            .await?;

        let descendants = self
            .store
            .list_descendants(ctx.owner_id, &folder.path)
            .await?;
        let delta = parent.depth + 1 - folder.depth;
        let deepest = descendants
            .iter()
            .map(|d| d.depth)
            .max()
            .unwrap_or(folder.depth);
        self.check_depth(deepest + delta)?;

        let rewrite = SubtreeRewrite::plan(&folder, &parent, &folder.name, &descendants);
        debug!(
            folder_id = %folder.id,
            descendants = rewrite.descendants.len(),
            delta,
            "Planned folder move"
        );
        let moved = self.store.apply_rewrite(&rewrite).await?;

        info!(
            owner_id = %ctx.owner_id,
            folder_id = %moved.id,
            from = %folder.path,
            to = %moved.path,
            "Folder moved"
        );
        if let Some(from_parent_id) = folder.parent_id {
            self.activity.dispatch(
                ctx.owner_id,
                FolderEvent::Moved {
                    folder_id: moved.id,
                    from_parent_id,
                    to_parent_id: parent.id,
                    descendants: rewrite.descendants.len(),
                },
            );
        }

        Ok(moved)
    }

    /// Creates a shallow copy of a folder: a new, empty folder with the
    /// source's color and description. Descendants are not copied.
    pub async fn copy(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        req: CopyFolderRequest,
    ) -> AppResult<Folder> {
        let requested_name = req
            .name
            .as_deref()
            .map(|n| self.validate_name(n))
            .transpose()?;
        let _guard = self.locks.acquire(ctx.owner_id).await;

        let source = self.get(ctx, folder_id).await?;
        if source.is_root {
            return Err(AppError::cannot_move("The root folder cannot be copied"));
        }

        let parent = self
            .resolve_parent(ctx, req.parent_id.or(source.parent_id))
            .await?;
        let name = match requested_name {
            Some(name) => name,
            None => self.validate_name(&format!("{}{}", source.name, self.config.copy_suffix))?,
        };
        self.check_depth(parent.depth + 1)?;
        self.ensure_name_free(ctx.owner_id, parent.id, &name, None)
            .await?;

        let mut data = CreateFolder::child_of(&parent, name);
        data.color = source.color.clone();
        data.description = source.description.clone();
        let copy = self.store.create(&data).await?;

        info!(
            owner_id = %ctx.owner_id,
            source_id = %source.id,
            folder_id = %copy.id,
            path = %copy.path,
            "Folder copied"
        );
        self.activity.dispatch(
            ctx.owner_id,
            FolderEvent::Copied {
                source_id: source.id,
                copy_id: copy.id,
            },
        );

        Ok(copy)
    }

    /// Moves a folder to the trash. With `cascade_trash` the whole subtree
    /// is flagged in one store call.
    pub async fn trash(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        self.set_trashed(ctx, folder_id, true).await
    }

    /// Restores a folder from the trash, mirroring [`trash`](Self::trash).
    pub async fn restore(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        self.set_trashed(ctx, folder_id, false).await
    }

    /// Permanently deletes a folder and its whole subtree.
    pub async fn delete(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<u64> {
        let _guard = self.locks.acquire(ctx.owner_id).await;

        let folder = self.get(ctx, folder_id).await?;
        if folder.is_root {
            return Err(AppError::cannot_move("The root folder cannot be deleted"));
        }

        let descendants = self
            .store
            .list_descendants(ctx.owner_id, &folder.path)
            .await?;
        let ids: Vec<FolderId> = std::iter::once(folder.id)
            .chain(descendants.iter().map(|d| d.id))
            .collect();
        let affected = self.store.delete_many(ctx.owner_id, &ids).await?;

        info!(
            owner_id = %ctx.owner_id,
            folder_id = %folder.id,
            path = %folder.path,
            affected,
            "Folder deleted"
        );
        self.activity.dispatch(
            ctx.owner_id,
            FolderEvent::Deleted {
                folder_id: folder.id,
                path: folder.path,
                affected,
            },
        );

        Ok(affected)
    }

    /// Stars a folder. Starring a starred folder is a no-op.
    pub async fn star(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        self.set_starred(ctx, folder_id, true).await
    }

    /// Unstars a folder. Unstarring an unstarred folder is a no-op.
    pub async fn unstar(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        self.set_starred(ctx, folder_id, false).await
    }

    async fn rename(&self, ctx: &RequestContext, folder: Folder, name: &str) -> AppResult<Folder> {
        let descendants = self
            .store
            .list_descendants(ctx.owner_id, &folder.path)
            .await?;
        let rewrite = SubtreeRewrite::rename(&folder, name, &descendants)
            .ok_or_else(|| AppError::cannot_move("The root folder cannot be renamed"))?;
        let renamed = self.store.apply_rewrite(&rewrite).await?;

        info!(
            owner_id = %ctx.owner_id,
            folder_id = %renamed.id,
            old_path = %folder.path,
            new_path = %renamed.path,
            descendants = rewrite.descendants.len(),
            "Folder renamed"
        );
        self.activity.dispatch(
            ctx.owner_id,
            FolderEvent::Renamed {
                folder_id: renamed.id,
                old_path: folder.path,
                new_path: renamed.path.clone(),
                descendants: rewrite.descendants.len(),
            },
        );

        Ok(renamed)
    }

    async fn set_trashed(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        trashed: bool,
    ) -> AppResult<Folder> {
        let _guard = self.locks.acquire(ctx.owner_id).await;

        let folder = self.get(ctx, folder_id).await?;
        if folder.is_root {
            return Err(AppError::cannot_move("The root folder cannot be trashed"));
        }

        let affected = if self.config.cascade_trash {
            let descendants = self
                .store
                .list_descendants(ctx.owner_id, &folder.path)
                .await?;
            let ids: Vec<FolderId> = std::iter::once(folder.id)
                .chain(descendants.iter().map(|d| d.id))
                .collect();
            self.store
                .update_trashed_many(ctx.owner_id, &ids, trashed)
                .await?
        } else {
            self.store.update_trashed(folder.id, trashed).await?;
            1
        };

        let updated = self.get(ctx, folder_id).await?;
        let event = if trashed {
            info!(owner_id = %ctx.owner_id, folder_id = %folder.id, affected, "Folder trashed");
            FolderEvent::Trashed {
                folder_id: folder.id,
                affected,
            }
        } else {
            info!(owner_id = %ctx.owner_id, folder_id = %folder.id, affected, "Folder restored");
            FolderEvent::Restored {
                folder_id: folder.id,
                affected,
            }
        };
        self.activity.dispatch(ctx.owner_id, event);

        Ok(updated)
    }

    async fn set_starred(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        starred: bool,
    ) -> AppResult<Folder> {
        let mut folder = self.get(ctx, folder_id).await?;
        if folder.starred == starred {
            return Ok(folder);
        }

        self.store.update_starred(folder.id, starred).await?;
        folder.starred = starred;

        let event = if starred {
            FolderEvent::Starred {
                folder_id: folder.id,
            }
        } else {
            FolderEvent::Unstarred {
                folder_id: folder.id,
            }
        };
        self.activity.dispatch(ctx.owner_id, event);

        Ok(folder)
    }

    /// Resolves the parent for a create, move or copy.
    async fn resolve_parent(
        &self,
        ctx: &RequestContext,
        parent_id: Option<FolderId>,
    ) -> AppResult<Folder> {
        let Some(parent_id) = parent_id else {
            return self.ensure_root(ctx).await;
        };

        let parent = self
            .store
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::invalid_parent(format!("Parent folder {parent_id} not found")))?;

        if parent.owner_id != ctx.owner_id {
            return Err(AppError::not_owner("Parent folder belongs to another account"));
        }
        if parent.trashed {
            return Err(AppError::invalid_parent("Parent folder is in the trash"));
        }
        Ok(parent)
    }

    async fn ensure_name_free(
        &self,
        owner_id: OwnerId,
        parent_id: FolderId,
        name: &str,
        except: Option<FolderId>,
    ) -> AppResult<()> {
        let existing = self
            .store
            .get_by_owner_parent_name(owner_id, parent_id, name)
            .await?;
        match existing {
            Some(f) if Some(f.id) != except => Err(AppError::name_taken(format!(
                "A folder named '{name}' already exists here"
            ))),
            _ => Ok(()),
        }
    }

    fn validate_name(&self, raw: &str) -> AppResult<String> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }
        if name.chars().count() > self.config.max_name_length {
            return Err(AppError::validation(format!(
                "Folder name exceeds {} characters",
                self.config.max_name_length
            )));
        }
        if name.contains('/') || name == "." || name == ".." {
            return Err(AppError::validation(format!("Invalid folder name '{name}'")));
        }
        Ok(name.to_string())
    }

    fn check_depth(&self, depth: i32) -> AppResult<()> {
        if depth > self.config.max_depth {
            return Err(AppError::validation(format!(
                "Folder tree cannot be deeper than {} levels",
                self.config.max_depth
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folderhub_database::MemoryFolderStore;

    fn service() -> FolderService {
        FolderService::new(
            Arc::new(MemoryFolderStore::new()),
            ActivityDispatcher::disabled(),
            FolderConfig::default(),
        )
    }

    #[test]
    fn test_validate_name() {
        let svc = service();
        assert_eq!(svc.validate_name("  Docs ").expect("valid"), "Docs");
        assert!(svc.validate_name("   ").is_err());
        assert!(svc.validate_name("a/b").is_err());
        assert!(svc.validate_name("..").is_err());
        assert!(svc.validate_name(&"x".repeat(256)).is_err());
        assert!(svc.validate_name(&"x".repeat(255)).is_ok());
    }

    #[tokio::test]
    async fn test_list_hides_trashed_children() {
        let svc = service();
        let ctx = RequestContext::new(OwnerId::new());
        let keep = svc
            .create(&ctx, CreateFolderRequest { name: "Keep".into(), ..Default::default() })
            .await
            .expect("create");
        let gone = svc
            .create(&ctx, CreateFolderRequest { name: "Drop".into(), ..Default::default() })
            .await
            .expect("create");
        svc.trash(&ctx, gone.id).await.expect("trash");

        let listed = svc.list(&ctx, None).await.expect("list");
        assert_eq!(listed.iter().map(|f| f.id).collect::<Vec<_>>(), vec![keep.id]);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let svc = FolderService::new(
            Arc::new(MemoryFolderStore::new()),
            ActivityDispatcher::disabled(),
            FolderConfig {
                max_depth: 2,
                ..FolderConfig::default()
            },
        );
        let ctx = RequestContext::new(OwnerId::new());
        let a = svc
            .create(&ctx, CreateFolderRequest { name: "a".into(), ..Default::default() })
            .await
            .expect("depth 1");
        let b = svc
            .create(
                &ctx,
                CreateFolderRequest { name: "b".into(), parent_id: Some(a.id), ..Default::default() },
            )
            .await
            .expect("depth 2");
        let err = svc
            .create(
                &ctx,
                CreateFolderRequest { name: "c".into(), parent_id: Some(b.id), ..Default::default() },
            )
            .await
            .expect_err("depth 3");
        assert_eq!(err.kind, ErrorKind::Validation);

        let other = svc
            .create(&ctx, CreateFolderRequest { name: "other".into(), ..Default::default() })
            .await
            .expect("depth 1");
        let err = svc
            .move_folder(&ctx, a.id, MoveFolderRequest { parent_id: Some(other.id) })
            .await
            .expect_err("subtree would reach depth 3");
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
