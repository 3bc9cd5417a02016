//! Notification preferences repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::notification::ReminderFrequency;

use crate::entities::NotificationPreferencesEntity;
use crate::metrics::QueryTimer;

/// Repository for notification preference database operations.
#[derive(Clone)]
pub struct NotificationPreferencesRepository {
    pool: PgPool,
}

impl NotificationPreferencesRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets preferences for an owner.
    /// Returns None if the owner never saved any.
    pub async fn find_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Option<NotificationPreferencesEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_notification_preferences");
        let result = sqlx::query_as::<_, NotificationPreferencesEntity>(
            r#"
            SELECT * FROM notification_preferences WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Saves preferences for an owner.
    /// Uses upsert pattern: creates if not exists, updates if exists.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        &self,
        owner_id: Uuid,
        email: &str,
        new_testimonial_notifications: bool,
        weekly_summary: bool,
        pending_reminders: bool,
        pending_reminder_threshold: i32,
        reminder_frequency: ReminderFrequency,
    ) -> Result<NotificationPreferencesEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_notification_preferences");
        let result = sqlx::query_as::<_, NotificationPreferencesEntity>(
            r#"
            INSERT INTO notification_preferences (
                owner_id, email, new_testimonial_notifications, weekly_summary,
                pending_reminders, pending_reminder_threshold, reminder_frequency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (owner_id) DO UPDATE SET
                email = EXCLUDED.email,
                new_testimonial_notifications = EXCLUDED.new_testimonial_notifications,
                weekly_summary = EXCLUDED.weekly_summary,
                pending_reminders = EXCLUDED.pending_reminders,
                pending_reminder_threshold = EXCLUDED.pending_reminder_threshold,
                reminder_frequency = EXCLUDED.reminder_frequency,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(email)
        .bind(new_testimonial_notifications)
        .bind(weekly_summary)
        .bind(pending_reminders)
        .bind(pending_reminder_threshold)
        .bind(reminder_frequency.to_string())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Turns every notification toggle off for all preference rows
    /// carrying this address. Returns the number of rows touched.
    pub async fn unsubscribe_by_email(&self, email: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("unsubscribe_notification_preferences");
        let result = sqlx::query(
            r#"
            UPDATE notification_preferences
            SET new_testimonial_notifications = false,
                weekly_summary = false,
                pending_reminders = false,
                updated_at = NOW()
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Owners subscribed to the weekly summary.
    pub async fn find_weekly_summary_enabled(
        &self,
    ) -> Result<Vec<NotificationPreferencesEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_weekly_summary_subscribers");
        let result = sqlx::query_as::<_, NotificationPreferencesEntity>(
            r#"
            SELECT * FROM notification_preferences
            WHERE weekly_summary = true AND email <> ''
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Owners subscribed to pending reminders.
    pub async fn find_pending_reminder_enabled(
        &self,
    ) -> Result<Vec<NotificationPreferencesEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_pending_reminder_subscribers");
        let result = sqlx::query_as::<_, NotificationPreferencesEntity>(
            r#"
            SELECT * FROM notification_preferences
            WHERE pending_reminders = true AND email <> ''
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
