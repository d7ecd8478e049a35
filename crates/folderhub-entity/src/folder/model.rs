//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use folderhub_core::types::{FolderId, OwnerId};

use super::path;

/// A folder in an owner's tree.
///
/// Rows reference their parent by id only; ancestry is answered by the
/// materialized `path`, never by following in-memory links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique, time-ordered folder identifier.
    pub id: FolderId,
    /// The account that owns this folder.
    pub owner_id: OwnerId,
    /// Parent folder ID (`None` only for the owner's root).
    pub parent_id: Option<FolderId>,
    /// Folder name, unique among its siblings.
    pub name: String,
    /// Full materialized path (e.g., `/Docs/2024`). The root is `/`.
    pub path: String,
    /// Distance from the root (0 for the root).
    pub depth: i32,
    /// Optional display color.
    pub color: Option<String>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Whether the owner starred this folder.
    pub starred: bool,
    /// Whether the folder sits in the trash.
    pub trashed: bool,
    /// When the folder was moved to the trash.
    pub trashed_at: Option<DateTime<Utc>>,
    /// Whether this is the owner's synthetic root.
    pub is_root: bool,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Build an unsaved root folder for `owner_id`.
    pub fn new_root(owner_id: OwnerId) -> CreateFolder {
        CreateFolder {
            id: FolderId::new(),
            owner_id,
            parent_id: None,
            name: String::new(),
            path: path::ROOT_PATH.to_string(),
            depth: 0,
            color: None,
            description: None,
            is_root: true,
        }
    }

    /// Returns `true` if `other` lies strictly below this folder.
    pub fn is_ancestor_of(&self, other: &Folder) -> bool {
        self.owner_id == other.owner_id && path::is_descendant_path(&other.path, &self.path)
    }
}

/// Data required to insert a folder row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Pre-generated identifier.
    pub id: FolderId,
    /// The folder owner.
    pub owner_id: OwnerId,
    /// Parent folder (`None` for the root).
    pub parent_id: Option<FolderId>,
    /// Folder name.
    pub name: String,
    /// Full materialized path.
    pub path: String,
    /// Depth in the tree.
    pub depth: i32,
    /// Optional display color.
    pub color: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Whether this row is the owner's root.
    pub is_root: bool,
}

impl CreateFolder {
    /// Build an unsaved child of `parent`.
    pub fn child_of(parent: &Folder, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: FolderId::new(),
            owner_id: parent.owner_id,
            parent_id: Some(parent.id),
            path: path::join(&parent.path, &name),
            depth: parent.depth + 1,
            name,
            color: None,
            description: None,
            is_root: false,
        }
    }

    /// Materialize the row as stored at `now`.
    pub fn into_folder(self, now: DateTime<Utc>) -> Folder {
        Folder {
            id: self.id,
            owner_id: self.owner_id,
            parent_id: self.parent_id,
            name: self.name,
            path: self.path,
            depth: self.depth,
            color: self.color,
            description: self.description,
            starred: false,
            trashed: false,
            trashed_at: None,
            is_root: self.is_root,
            created_at: now,
            updated_at: now,
        }
    }
}
