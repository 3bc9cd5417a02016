//! Notification log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::notification::NotificationLog;

/// Database row mapping for the notification_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationLogEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub notification_type: String,
    pub status: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationLogEntity> for NotificationLog {
    fn from(entity: NotificationLogEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            notification_type: entity.notification_type,
            status: entity.status,
            detail: entity.detail,
            created_at: entity.created_at,
        }
    }
}
