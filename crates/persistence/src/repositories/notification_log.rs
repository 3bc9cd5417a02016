//! Notification log repository for database operations.
//!
//! Every dispatch attempt lands here, including skips, so the gating
//! decisions stay auditable.

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::NotificationLogEntity;
use crate::metrics::QueryTimer;

/// Repository for notification log database operations.
#[derive(Clone)]
pub struct NotificationLogRepository {
    pool: PgPool,
}

impl NotificationLogRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one dispatch record.
    pub async fn insert(
        &self,
        owner_id: Uuid,
        notification_type: &str,
        status: &str,
        detail: Option<JsonValue>,
    ) -> Result<NotificationLogEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_notification_log");
        let result = sqlx::query_as::<_, NotificationLogEntity>(
            r#"
            INSERT INTO notification_logs (owner_id, notification_type, status, detail)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(notification_type)
        .bind(status)
        .bind(detail)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Most recent log rows for an owner, newest first.
    pub async fn list_recent(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<NotificationLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notification_logs");
        let result = sqlx::query_as::<_, NotificationLogEntity>(
            r#"
            SELECT * FROM notification_logs
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
