//! # folderhub-service
//!
//! Folder hierarchy services. [`FolderService`] owns every tree invariant:
//! one root per owner, unique sibling names, acyclic moves, and path/depth
//! consistency for every descendant after a rename or move.
//! [`TreeService`] composes read-only tree views from stored folders.
//!
//! Services follow constructor injection; the store and the activity
//! recorder are provided at construction time via `Arc` references.

pub mod activity;
pub mod context;
pub mod folder;
pub mod locks;

pub use activity::ActivityDispatcher;
pub use context::RequestContext;
pub use folder::{
    CopyFolderRequest, CreateFolderRequest, FolderService, MoveFolderRequest, TreeService,
    UpdateFolderRequest,
};
pub use locks::{OwnerGuard, OwnerLocks};
