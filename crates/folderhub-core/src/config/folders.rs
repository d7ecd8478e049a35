//! Folder hierarchy configuration.

use serde::{Deserialize, Serialize};

/// Limits and policies applied by the folder service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Maximum folder name length in characters.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Maximum folder depth below the root.
    #[serde(default = "default_max_depth")]
    pub max_depth: i32,
    /// Suffix appended to the name of a copied folder.
    #[serde(default = "default_copy_suffix")]
    pub copy_suffix: String,
    /// Whether trash and restore apply to the whole subtree.
    #[serde(default = "default_true")]
    pub cascade_trash: bool,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            max_name_length: default_max_name_length(),
            max_depth: default_max_depth(),
            copy_suffix: default_copy_suffix(),
            cascade_trash: default_true(),
        }
    }
}

fn default_max_name_length() -> usize {
    255
}

fn default_max_depth() -> i32 {
    64
}

fn default_copy_suffix() -> String {
    " (copy)".to_string()
}

fn default_true() -> bool {
    true
}
