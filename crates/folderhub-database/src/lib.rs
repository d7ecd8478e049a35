//! # folderhub-database
//!
//! The [`FolderStore`] contract consumed by the folder service, with a
//! PostgreSQL implementation, an in-process implementation that enforces
//! the same uniqueness rules, and the PostgreSQL activity log.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryFolderStore;
pub use repositories::{PgActivityLog, PgFolderStore};
pub use store::FolderStore;
