//! # folderhub-core
//!
//! Core crate for FolderHub. Contains configuration schemas, typed
//! identifiers, folder activity events, the activity recorder trait,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other FolderHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
