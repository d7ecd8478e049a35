//! Domain events emitted by folder operations.
//!
//! Events are handed to an [`ActivityRecorder`](crate::traits::ActivityRecorder)
//! after a mutation succeeds. Recording is fire-and-forget: a failed
//! recording never changes the outcome of the operation that produced it.

pub mod folder;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use folder::FolderEvent;

use crate::types::{ActivityId, OwnerId};

/// Wrapper for a folder event with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: ActivityId,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The account that caused the event.
    pub actor_id: OwnerId,
    /// The event payload.
    pub payload: FolderEvent,
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: OwnerId, payload: FolderEvent) -> Self {
        Self {
            id: ActivityId::new(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }
}
