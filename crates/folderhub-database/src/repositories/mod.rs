//! PostgreSQL repository implementations.

pub mod activity;
pub mod folder;

pub use activity::PgActivityLog;
pub use folder::PgFolderStore;
