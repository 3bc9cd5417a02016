//! Weekly summary background job.
//!
//! Ticks on a configurable interval but only sends on Mondays, so the
//! summary goes out once at the start of each week regardless of how
//! often the tick fires.

use chrono::{Datelike, Local, Weekday};
use sqlx::PgPool;
use tracing::{debug, info};

use super::scheduler::{Job, JobFrequency};
use crate::services::NotificationDispatcher;
use domain::models::notification::DispatchOutcome;
use persistence::repositories::NotificationPreferencesRepository;

/// Sends the weekly activity summary to every subscribed owner.
pub struct WeeklySummaryJob {
    pool: PgPool,
    dispatcher: NotificationDispatcher,
    interval_minutes: u64,
}

impl WeeklySummaryJob {
    pub fn new(pool: PgPool, dispatcher: NotificationDispatcher, interval_minutes: u64) -> Self {
        Self {
            pool,
            dispatcher,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for WeeklySummaryJob {
    fn name(&self) -> &'static str {
        "weekly_summary"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        if Local::now().weekday() != Weekday::Mon {
            debug!("Not Monday, weekly summaries stay queued");
            return Ok(());
        }

        let repo = NotificationPreferencesRepository::new(self.pool.clone());
        let subscribers = repo
            .find_weekly_summary_enabled()
            .await
            .map_err(|e| format!("Failed to load weekly summary subscribers: {}", e))?;

        let total = subscribers.len();
        let (mut sent, mut skipped, mut failed) = (0usize, 0usize, 0usize);

        for prefs in subscribers {
            match self.dispatcher.send_weekly_summary(prefs.owner_id).await {
                DispatchOutcome::Sent => sent += 1,
                DispatchOutcome::Skipped(_) => skipped += 1,
                DispatchOutcome::Failed(_) => failed += 1,
            }
        }

        info!(total, sent, skipped, failed, "Weekly summary run complete");
        Ok(())
    }
}
