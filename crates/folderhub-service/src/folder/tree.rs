//! Folder tree assembly.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use folderhub_core::result::AppResult;
use folderhub_core::types::FolderId;
use folderhub_database::FolderStore;
use folderhub_entity::folder::{Folder, TreeNode, TreeView};

use super::service::FolderService;
use crate::context::RequestContext;

/// Builds read-only tree views of an owner's folders.
#[derive(Debug, Clone)]
pub struct TreeService {
    /// Folder store.
    store: Arc<dyn FolderStore>,
    /// Used for ownership checks and root resolution.
    folders: FolderService,
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(store: Arc<dyn FolderStore>, folders: FolderService) -> Self {
        Self { store, folders }
    }

    /// Builds the tree below `root_id` (default: the owner's root).
    ///
    /// Trashed folders and everything below them are left out. A failed
    /// child listing does not abort the build: the folder is kept as a leaf
    /// and its ID is reported in [`TreeView::failed`].
    pub async fn get_tree(
        &self,
        ctx: &RequestContext,
        root_id: Option<FolderId>,
    ) -> AppResult<TreeView> {
        let root = match root_id {
            Some(id) => self.folders.get(ctx, id).await?,
            None => self.folders.ensure_root(ctx).await?,
        };

        let mut failed = Vec::new();
        let node = self.assemble(ctx, &root, &mut failed).await;

        debug!(
            owner_id = %ctx.owner_id,
            root_id = %root.id,
            nodes = node.count(),
            failed = failed.len(),
            "Folder tree assembled"
        );

        Ok(TreeView { root: node, failed })
    }

    fn assemble<'a>(
        &'a self,
        ctx: &'a RequestContext,
        folder: &'a Folder,
        failed: &'a mut Vec<FolderId>,
    ) -> BoxFuture<'a, TreeNode> {
        Box::pin(async move {
            let mut node = TreeNode::leaf(folder);

            let children = match self.store.list_by_parent(ctx.owner_id, folder.id).await {
                Ok(children) => children,
                Err(e) => {
                    warn!(
                        folder_id = %folder.id,
                        error = %e,
                        "Failed to list folder children"
                    );
                    failed.push(folder.id);
                    return node;
                }
            };

            for child in children.iter().filter(|c| !c.trashed) {
                let child_node = self.assemble(ctx, child, failed).await;
                node.children.push(child_node);
            }

            node
        })
    }
}
