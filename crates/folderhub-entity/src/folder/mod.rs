//! Folder domain entities.

pub mod model;
pub mod path;
pub mod rewrite;
pub mod tree;

pub use model::{CreateFolder, Folder};
pub use rewrite::{PathUpdate, SubtreeRewrite};
pub use tree::{TreeNode, TreeView};
