//! Activity recorder trait for pluggable activity-log backends.

use async_trait::async_trait;

use crate::events::DomainEvent;
use crate::result::AppResult;

/// Sink for folder activity.
///
/// Implementations persist or forward events. The folder service calls
/// [`record`](Self::record) off the request path and only logs failures.
#[async_trait]
pub trait ActivityRecorder: Send + Sync + std::fmt::Debug + 'static {
    /// Record a single event.
    async fn record(&self, event: &DomainEvent) -> AppResult<()>;
}
