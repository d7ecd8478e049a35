//! Folder hierarchy and tree services.

pub mod service;
pub mod tree;

pub use service::{
    CopyFolderRequest, CreateFolderRequest, FolderService, MoveFolderRequest, UpdateFolderRequest,
};
pub use tree::TreeService;
