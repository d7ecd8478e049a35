//! Folder-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::FolderId;

/// Events related to folder operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FolderEvent {
    /// A folder was created.
    Created {
        /// The folder ID.
        folder_id: FolderId,
        /// The folder's materialized path.
        path: String,
    },
    /// A folder was renamed; descendants were re-prefixed.
    Renamed {
        /// The folder ID.
        folder_id: FolderId,
        /// Path before the rename.
        old_path: String,
        /// Path after the rename.
        new_path: String,
        /// Number of descendants whose path was rewritten.
        descendants: usize,
    },
    /// A folder's non-structural attributes changed.
    Updated {
        /// The folder ID.
        folder_id: FolderId,
        /// Fields that changed.
        changed_fields: Vec<String>,
    },
    /// A folder was moved under a new parent.
    Moved {
        /// The folder ID.
        folder_id: FolderId,
        /// The previous parent.
        from_parent_id: FolderId,
        /// The new parent.
        to_parent_id: FolderId,
        /// Number of descendants whose path and depth were rewritten.
        descendants: usize,
    },
    /// A folder was copied (shallow).
    Copied {
        /// The source folder.
        source_id: FolderId,
        /// The newly created folder.
        copy_id: FolderId,
    },
    /// A folder (and possibly its subtree) was moved to the trash.
    Trashed {
        /// The folder ID.
        folder_id: FolderId,
        /// Number of folders flagged, including the folder itself.
        affected: u64,
    },
    /// A folder (and possibly its subtree) was restored from the trash.
    Restored {
        /// The folder ID.
        folder_id: FolderId,
        /// Number of folders cleared, including the folder itself.
        affected: u64,
    },
    /// A folder subtree was permanently deleted.
    Deleted {
        /// The folder ID.
        folder_id: FolderId,
        /// The folder path (for display after deletion).
        path: String,
        /// Number of rows removed, including the folder itself.
        affected: u64,
    },
    /// A folder was starred.
    Starred {
        /// The folder ID.
        folder_id: FolderId,
    },
    /// A folder was unstarred.
    Unstarred {
        /// The folder ID.
        folder_id: FolderId,
    },
}

impl FolderEvent {
    /// Short action name used when persisting the event (e.g. `"folder.renamed"`).
    pub fn action(&self) -> &'static str {
        match self {
            Self::Created { .. } => "folder.created",
            Self::Renamed { .. } => "folder.renamed",
            Self::Updated { .. } => "folder.updated",
            Self::Moved { .. } => "folder.moved",
            Self::Copied { .. } => "folder.copied",
            Self::Trashed { .. } => "folder.trashed",
            Self::Restored { .. } => "folder.restored",
            Self::Deleted { .. } => "folder.deleted",
            Self::Starred { .. } => "folder.starred",
            Self::Unstarred { .. } => "folder.unstarred",
        }
    }

    /// The folder the event is about.
    pub fn folder_id(&self) -> FolderId {
        match self {
            Self::Created { folder_id, .. }
            | Self::Renamed { folder_id, .. }
            | Self::Updated { folder_id, .. }
            | Self::Moved { folder_id, .. }
            | Self::Trashed { folder_id, .. }
            | Self::Restored { folder_id, .. }
            | Self::Deleted { folder_id, .. }
            | Self::Starred { folder_id }
            | Self::Unstarred { folder_id } => *folder_id,
            Self::Copied { copy_id, .. } => *copy_id,
        }
    }
}
