//! Core traits defined in `folderhub-core` and implemented by other crates.

pub mod activity;

pub use activity::ActivityRecorder;
