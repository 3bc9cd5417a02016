//! Dispatch policy for owner notifications.
//!
//! Decides whether a notification goes out at all. Each gate inspects the
//! owner's preferences (and for reminders, the pending count) and either
//! clears the send or names the reason it is skipped. Actually sending
//! and logging happen in the api layer.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone};

use crate::models::notification::NotificationPreferences;

/// Decision for a single dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Proceed,
    Skip(String),
}

impl Gate {
    fn skip(reason: impl Into<String>) -> Gate {
        Gate::Skip(reason.into())
    }

    pub fn proceeds(&self) -> bool {
        matches!(self, Gate::Proceed)
    }
}

fn configured(prefs: Option<&NotificationPreferences>) -> Result<&NotificationPreferences, Gate> {
    match prefs {
        Some(p) if !p.email.trim().is_empty() => Ok(p),
        _ => Err(Gate::skip("preferences not configured")),
    }
}

/// Gate for the email sent right after a testimonial submission.
pub fn gate_new_testimonial(prefs: Option<&NotificationPreferences>) -> Gate {
    let prefs = match configured(prefs) {
        Ok(p) => p,
        Err(gate) => return gate,
    };
    if !prefs.new_testimonial_notifications {
        return Gate::skip("new testimonial notifications disabled");
    }
    Gate::Proceed
}

/// Gate for rule-triggered notify actions. Follows the new-testimonial
/// toggle so an unsubscribe silences these too.
pub fn gate_rule_notification(prefs: Option<&NotificationPreferences>) -> Gate {
    gate_new_testimonial(prefs)
}

/// Gate for the weekly activity summary.
pub fn gate_weekly_summary(prefs: Option<&NotificationPreferences>) -> Gate {
    let prefs = match configured(prefs) {
        Ok(p) => p,
        Err(gate) => return gate,
    };
    if !prefs.weekly_summary {
        return Gate::skip("weekly summary disabled");
    }
    Gate::Proceed
}

/// Gate for the pending-review reminder. Skips quietly until the pending
/// queue reaches the owner's threshold.
pub fn gate_pending_reminder(prefs: Option<&NotificationPreferences>, pending: i64) -> Gate {
    let prefs = match configured(prefs) {
        Ok(p) => p,
        Err(gate) => return gate,
    };
    if !prefs.pending_reminders {
        return Gate::skip("pending reminders disabled");
    }
    if pending < prefs.pending_reminder_threshold as i64 {
        return Gate::skip(format!(
            "Only {} pending testimonials, below threshold of {}",
            pending, prefs.pending_reminder_threshold
        ));
    }
    Gate::Proceed
}

/// The reporting window for a weekly summary: most recent Monday 00:00 in
/// the zone of `now`, up to `now` itself.
pub fn week_window<Tz: TimeZone>(now: DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
    let days_from_monday = now.weekday().num_days_from_monday() as i64;
    let monday = now.date_naive() - Duration::days(days_from_monday);
    let start_naive = monday.and_time(NaiveTime::MIN);
    let start = now
        .timezone()
        .from_local_datetime(&start_naive)
        .earliest()
        // A zone transition can remove midnight itself; the window
        // degenerates to empty rather than shifting days.
        .unwrap_or_else(|| now.clone());
    (start, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use uuid::Uuid;

    fn prefs() -> NotificationPreferences {
        let mut p = NotificationPreferences::defaults_for(Uuid::new_v4());
        p.email = "owner@example.com".to_string();
        p
    }

    #[test]
    fn test_missing_preferences_skip_every_kind() {
        assert_eq!(
            gate_new_testimonial(None),
            Gate::Skip("preferences not configured".to_string())
        );
        assert_eq!(
            gate_weekly_summary(None),
            Gate::Skip("preferences not configured".to_string())
        );
        assert_eq!(
            gate_pending_reminder(None, 10),
            Gate::Skip("preferences not configured".to_string())
        );
    }

    #[test]
    fn test_blank_email_counts_as_unconfigured() {
        let mut p = prefs();
        p.email = "   ".to_string();
        assert_eq!(
            gate_new_testimonial(Some(&p)),
            Gate::Skip("preferences not configured".to_string())
        );
    }

    #[test]
    fn test_new_testimonial_toggle() {
        let mut p = prefs();
        assert!(gate_new_testimonial(Some(&p)).proceeds());
        p.new_testimonial_notifications = false;
        assert_eq!(
            gate_new_testimonial(Some(&p)),
            Gate::Skip("new testimonial notifications disabled".to_string())
        );
    }

    #[test]
    fn test_rule_notification_follows_new_testimonial_toggle() {
        let mut p = prefs();
        p.new_testimonial_notifications = false;
        assert!(!gate_rule_notification(Some(&p)).proceeds());
    }

    #[test]
    fn test_weekly_summary_toggle() {
        let mut p = prefs();
        assert!(gate_weekly_summary(Some(&p)).proceeds());
        p.weekly_summary = false;
        assert_eq!(
            gate_weekly_summary(Some(&p)),
            Gate::Skip("weekly summary disabled".to_string())
        );
    }

    #[test]
    fn test_reminder_below_threshold_reports_both_numbers() {
        let p = prefs();
        assert_eq!(
            gate_pending_reminder(Some(&p), 2),
            Gate::Skip("Only 2 pending testimonials, below threshold of 3".to_string())
        );
    }

    #[test]
    fn test_reminder_at_threshold_proceeds() {
        let p = prefs();
        assert!(gate_pending_reminder(Some(&p), 3).proceeds());
        assert!(gate_pending_reminder(Some(&p), 7).proceeds());
    }

    #[test]
    fn test_reminder_toggle_checked_before_threshold() {
        let mut p = prefs();
        p.pending_reminders = false;
        assert_eq!(
            gate_pending_reminder(Some(&p), 100),
            Gate::Skip("pending reminders disabled".to_string())
        );
    }

    #[test]
    fn test_week_window_starts_most_recent_monday() {
        // Thursday afternoon; the window opens Monday of the same week.
        let now = Utc.with_ymd_and_hms(2026, 8, 20, 15, 30, 0).unwrap();
        let (start, end) = week_window(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 17, 0, 0, 0).unwrap());
        assert_eq!(end, now);
    }

    #[test]
    fn test_week_window_on_monday_midnight_is_empty() {
        let now = Utc.with_ymd_and_hms(2026, 8, 17, 0, 0, 0).unwrap();
        let (start, end) = week_window(now);
        assert_eq!(start, end);
    }

    #[test]
    fn test_week_window_uses_zone_of_caller() {
        // Monday 05:00 at UTC+10 is still Sunday in UTC; the boundary
        // follows the caller's zone, not UTC.
        let zone = FixedOffset::east_opt(10 * 3600).unwrap();
        let now = zone.with_ymd_and_hms(2026, 8, 17, 5, 0, 0).unwrap();
        let (start, _) = week_window(now);
        assert_eq!(
            start.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 8, 16, 14, 0, 0).unwrap()
        );
    }
}
