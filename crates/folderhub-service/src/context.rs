//! Request context carrying the acting account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folderhub_core::types::OwnerId;

/// Context for the current request.
///
/// Built by the (external) transport layer once the caller is
/// authenticated. Every folder operation is scoped to `owner_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated account.
    pub owner_id: OwnerId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            request_time: Utc::now(),
        }
    }
}
