//! PostgreSQL activity log.

use async_trait::async_trait;
use sqlx::PgPool;

use folderhub_core::error::{AppError, ErrorKind};
use folderhub_core::events::DomainEvent;
use folderhub_core::result::AppResult;
use folderhub_core::traits::ActivityRecorder;

/// Appends folder events to the `folder_activity` table.
#[derive(Debug, Clone)]
pub struct PgActivityLog {
    pool: PgPool,
}

impl PgActivityLog {
    /// Create a new activity log.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRecorder for PgActivityLog {
    async fn record(&self, event: &DomainEvent) -> AppResult<()> {
        let details = serde_json::to_value(&event.payload)?;

        sqlx::query(
            "INSERT INTO folder_activity (id, actor_id, action, folder_id, details, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(event.id)
        .bind(event.actor_id)
        .bind(event.payload.action())
        .bind(event.payload.folder_id())
        .bind(details)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record activity", e))?;

        Ok(())
    }
}
