//! Pending-review reminder background job.
//!
//! Walks every owner with reminders enabled and lets the dispatcher
//! decide whether their pending queue clears the threshold. Owners on a
//! weekly cadence are only considered on Mondays.

use chrono::{Datelike, Local, Weekday};
use sqlx::PgPool;
use tracing::{debug, info};

use super::scheduler::{Job, JobFrequency};
use crate::services::NotificationDispatcher;
use domain::models::notification::{
    DispatchOutcome, NotificationPreferences, ReminderFrequency,
};
use persistence::repositories::NotificationPreferencesRepository;

/// Reminds owners about testimonials waiting for review.
pub struct PendingReminderJob {
    pool: PgPool,
    dispatcher: NotificationDispatcher,
    interval_minutes: u64,
}

impl PendingReminderJob {
    pub fn new(pool: PgPool, dispatcher: NotificationDispatcher, interval_minutes: u64) -> Self {
        Self {
            pool,
            dispatcher,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for PendingReminderJob {
    fn name(&self) -> &'static str {
        "pending_reminder"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let repo = NotificationPreferencesRepository::new(self.pool.clone());
        let subscribers = repo
            .find_pending_reminder_enabled()
            .await
            .map_err(|e| format!("Failed to load reminder subscribers: {}", e))?;

        let monday = Local::now().weekday() == Weekday::Mon;
        let total = subscribers.len();
        let (mut sent, mut skipped, mut failed, mut deferred) = (0usize, 0usize, 0usize, 0usize);

        for entity in subscribers {
            let prefs = NotificationPreferences::from(entity);

            if prefs.reminder_frequency == ReminderFrequency::Weekly && !monday {
                debug!(owner_id = %prefs.owner_id, "Weekly cadence, deferring reminder to Monday");
                deferred += 1;
                continue;
            }

            match self.dispatcher.send_pending_reminder(prefs.owner_id).await {
                DispatchOutcome::Sent => sent += 1,
                DispatchOutcome::Skipped(_) => skipped += 1,
                DispatchOutcome::Failed(_) => failed += 1,
            }
        }

        info!(
            total,
            sent, skipped, failed, deferred, "Pending reminder run complete"
        );
        Ok(())
    }
}
