//! Structural rewrite plans.
//!
//! A rename or move touches the target folder and every descendant. The
//! service computes the whole change up front as a [`SubtreeRewrite`] and
//! the store applies it atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folderhub_core::types::{FolderId, OwnerId};

use super::model::Folder;
use super::path;

/// New path and depth for one descendant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathUpdate {
    /// The descendant folder.
    pub id: FolderId,
    /// Its rewritten materialized path.
    pub path: String,
    /// Its shifted depth.
    pub depth: i32,
}

/// A rename and/or re-parent of one folder plus the cascade to its subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtreeRewrite {
    /// Owner of every row touched.
    pub owner_id: OwnerId,
    /// The folder being renamed or moved.
    pub folder_id: FolderId,
    /// Its parent after the change.
    pub parent_id: FolderId,
    /// Its name after the change.
    pub name: String,
    /// Its path after the change.
    pub path: String,
    /// Its depth after the change.
    pub depth: i32,
    /// One entry per descendant.
    pub descendants: Vec<PathUpdate>,
    /// Timestamp applied to every touched row.
    pub updated_at: DateTime<Utc>,
}

impl SubtreeRewrite {
    /// Plan moving `folder` under `parent` with `name`, re-prefixing and
    /// shifting the depth of every row in `descendants`.
    ///
    /// Rows in `descendants` that are not below `folder.path` are skipped.
    pub fn plan(folder: &Folder, parent: &Folder, name: &str, descendants: &[Folder]) -> Self {
        let new_path = path::join(&parent.path, name);
        let new_depth = parent.depth + 1;
        let delta = new_depth - folder.depth;

        let descendants = descendants
            .iter()
            .filter_map(|d| {
                path::rebase(&d.path, &folder.path, &new_path).map(|p| PathUpdate {
                    id: d.id,
                    path: p,
                    depth: d.depth + delta,
                })
            })
            .collect();

        Self {
            owner_id: folder.owner_id,
            folder_id: folder.id,
            parent_id: parent.id,
            name: name.to_string(),
            path: new_path,
            depth: new_depth,
            descendants,
            updated_at: Utc::now(),
        }
    }

    /// Plan renaming `folder` in place. Depths are unchanged.
    ///
    /// Returns `None` for a folder without a parent (the root).
    pub fn rename(folder: &Folder, name: &str, descendants: &[Folder]) -> Option<Self> {
        let parent_id = folder.parent_id?;
        let new_path = path::join(path::dirname(&folder.path), name);

        let descendants = descendants
            .iter()
            .filter_map(|d| {
                path::rebase(&d.path, &folder.path, &new_path).map(|p| PathUpdate {
                    id: d.id,
                    path: p,
                    depth: d.depth,
                })
            })
            .collect();

        Some(Self {
            owner_id: folder.owner_id,
            folder_id: folder.id,
            parent_id,
            name: name.to_string(),
            path: new_path,
            depth: folder.depth,
            descendants,
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folder::model::CreateFolder;

    fn tree() -> (Folder, Folder, Folder, Folder) {
        let now = Utc::now();
        let root = Folder::new_root(OwnerId::new()).into_folder(now);
        let docs = CreateFolder::child_of(&root, "Docs").into_folder(now);
        let year = CreateFolder::child_of(&docs, "2024").into_folder(now);
        let work = CreateFolder::child_of(&root, "Work").into_folder(now);
        (root, docs, year, work)
    }

    #[test]
    fn test_rename_keeps_depths() {
        let (root, docs, year, _) = tree();
        let plan = SubtreeRewrite::rename(&docs, "Archive", &[year.clone()]).expect("has parent");

        assert_eq!(plan.parent_id, root.id);
        assert_eq!(plan.name, "Archive");
        assert_eq!(plan.path, "/Archive");
        assert_eq!(plan.depth, 1);
        assert_eq!(
            plan.descendants,
            vec![PathUpdate {
                id: year.id,
                path: "/Archive/2024".to_string(),
                depth: 2,
            }]
        );
    }

    #[test]
    fn test_move_shifts_depths() {
        let (_, docs, year, work) = tree();
        let plan = SubtreeRewrite::plan(&docs, &work, "Docs", &[year.clone()]);

        assert_eq!(plan.parent_id, work.id);
        assert_eq!(plan.path, "/Work/Docs");
        assert_eq!(plan.depth, 2);
        assert_eq!(plan.descendants[0].path, "/Work/Docs/2024");
        assert_eq!(plan.descendants[0].depth, 3);
    }

    #[test]
    fn test_rename_in_place_uses_dirname() {
        let (_, docs, year, _) = tree();
        let plan = SubtreeRewrite::rename(&year, "FY2024", &[]).expect("has parent");
        assert_eq!(plan.parent_id, docs.id);
        assert_eq!(plan.path, "/Docs/FY2024");
        assert_eq!(plan.depth, 2);
    }

    #[test]
    fn test_rename_root_is_refused() {
        let (root, _, _, _) = tree();
        assert!(SubtreeRewrite::rename(&root, "x", &[]).is_none());
    }

    #[test]
    fn test_skips_rows_outside_subtree() {
        let (root, docs, _, work) = tree();
        let plan = SubtreeRewrite::plan(&docs, &root, "Archive", &[work]);
        assert!(plan.descendants.is_empty());
    }
}
