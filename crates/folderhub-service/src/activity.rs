//! Background activity dispatch.

use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use folderhub_core::events::{DomainEvent, FolderEvent};
use folderhub_core::traits::ActivityRecorder;
use folderhub_core::types::OwnerId;

/// Hands folder events to an [`ActivityRecorder`] on a background task.
///
/// Recording failures are logged and otherwise ignored; they never reach
/// the caller of the folder operation. Every task is tracked so
/// [`shutdown`](Self::shutdown) can wait for pending records before the
/// runtime goes away.
#[derive(Debug, Clone, Default)]
pub struct ActivityDispatcher {
    recorder: Option<Arc<dyn ActivityRecorder>>,
    tasks: TaskTracker,
}

impl ActivityDispatcher {
    /// Dispatch to `recorder`.
    pub fn new(recorder: Arc<dyn ActivityRecorder>) -> Self {
        Self {
            recorder: Some(recorder),
            tasks: TaskTracker::new(),
        }
    }

    /// A dispatcher that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Record `payload` on behalf of `actor_id` without waiting.
    pub fn dispatch(&self, actor_id: OwnerId, payload: FolderEvent) {
        let Some(recorder) = self.recorder.clone() else {
            return;
        };
        let event = DomainEvent::new(actor_id, payload);
        self.tasks.spawn(async move {
            if let Err(e) = recorder.record(&event).await {
                warn!(
                    error = %e,
                    action = event.payload.action(),
                    folder_id = %event.payload.folder_id(),
                    "Failed to record folder activity"
                );
            }
        });
    }

    /// Number of records still in flight.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every dispatched record to finish.
    ///
    /// Events dispatched after this call are still recorded and tracked.
    pub async fn shutdown(&self) {
        debug!(pending = self.tasks.len(), "Flushing folder activity");
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use folderhub_core::result::AppResult;
    use folderhub_core::types::FolderId;

    #[derive(Debug, Default)]
    struct SlowCounter {
        count: AtomicUsize,
    }

    #[async_trait]
    impl ActivityRecorder for SlowCounter {
        async fn record(&self, _event: &DomainEvent) -> AppResult<()> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_pending_records() {
        let counter = Arc::new(SlowCounter::default());
        let dispatcher = ActivityDispatcher::new(counter.clone());

        for _ in 0..3 {
            dispatcher.dispatch(
                OwnerId::new(),
                FolderEvent::Starred {
                    folder_id: FolderId::new(),
                },
            );
        }
        assert_eq!(dispatcher.pending(), 3);

        dispatcher.shutdown().await;
        assert_eq!(counter.count.load(Ordering::SeqCst), 3);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_disabled_shutdown_returns_immediately() {
        let dispatcher = ActivityDispatcher::disabled();
        dispatcher.dispatch(
            OwnerId::new(),
            FolderEvent::Unstarred {
                folder_id: FolderId::new(),
            },
        );
        assert_eq!(dispatcher.pending(), 0);
        dispatcher.shutdown().await;
    }
}
