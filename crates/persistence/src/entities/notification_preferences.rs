//! Notification preferences entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::notification::{NotificationPreferences, ReminderFrequency};

/// Database row mapping for the notification_preferences table.
/// One row per owner (`owner_id` is unique).
#[derive(Debug, Clone, FromRow)]
pub struct NotificationPreferencesEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub email: String,
    pub new_testimonial_notifications: bool,
    pub weekly_summary: bool,
    pub pending_reminders: bool,
    pub pending_reminder_threshold: i32,
    pub reminder_frequency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NotificationPreferencesEntity> for NotificationPreferences {
    fn from(entity: NotificationPreferencesEntity) -> Self {
        let reminder_frequency = entity
            .reminder_frequency
            .parse::<ReminderFrequency>()
            .unwrap_or(ReminderFrequency::Daily);

        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            email: entity.email,
            new_testimonial_notifications: entity.new_testimonial_notifications,
            weekly_summary: entity.weekly_summary,
            pending_reminders: entity.pending_reminders,
            pending_reminder_threshold: entity.pending_reminder_threshold,
            reminder_frequency,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
