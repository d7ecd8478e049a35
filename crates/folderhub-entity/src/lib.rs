//! # folderhub-entity
//!
//! Domain entity models for FolderHub. [`folder::Folder`] is the stored
//! row; the remaining types describe inserts, structural rewrites, and
//! the read-only tree view assembled from stored folders.

pub mod folder;
