//! Folder tree structures for hierarchical display.

use serde::{Deserialize, Serialize};

use folderhub_core::types::FolderId;

use super::model::Folder;

/// A node in a folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Folder ID.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Full path.
    pub path: String,
    /// Depth level.
    pub depth: i32,
    /// Display color.
    pub color: Option<String>,
    /// Starred flag.
    pub starred: bool,
    /// Non-trashed child folders, ordered by name.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Build a leaf node from a stored folder.
    pub fn leaf(folder: &Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name.clone(),
            path: folder.path.clone(),
            depth: folder.depth,
            color: folder.color.clone(),
            starred: folder.starred,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }

    /// Find a node by ID anywhere in this subtree.
    pub fn find(&self, id: FolderId) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// A best-effort tree plus the folders whose children could not be read.
///
/// A folder listed in `failed` appears in the tree with no children; the
/// caller can tell that apart from a genuinely empty folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeView {
    /// The assembled tree.
    pub root: TreeNode,
    /// Folders whose child listing failed.
    pub failed: Vec<FolderId>,
}

impl TreeView {
    /// Returns `true` if every child listing succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
