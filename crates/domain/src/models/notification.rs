//! Notification domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Default pending-testimonial count that triggers a reminder.
pub const DEFAULT_REMINDER_THRESHOLD: i32 = 3;

/// Owner-facing notification events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewTestimonial,
    WeeklySummary,
    PendingReminder,
    /// Sent when a rule with a notify action matches.
    RuleTriggered,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::NewTestimonial => write!(f, "new_testimonial"),
            NotificationKind::WeeklySummary => write!(f, "weekly_summary"),
            NotificationKind::PendingReminder => write!(f, "pending_reminder"),
            NotificationKind::RuleTriggered => write!(f, "rule_triggered"),
        }
    }
}

/// Delivery status recorded on a notification log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Failed,
    Skipped,
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationStatus::Sent => write!(f, "sent"),
            NotificationStatus::Failed => write!(f, "failed"),
            NotificationStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// How often an owner wants pending reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderFrequency {
    Daily,
    Weekly,
}

impl FromStr for ReminderFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(ReminderFrequency::Daily),
            "weekly" => Ok(ReminderFrequency::Weekly),
            _ => Err(format!("Unknown reminder frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for ReminderFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderFrequency::Daily => write!(f, "daily"),
            ReminderFrequency::Weekly => write!(f, "weekly"),
        }
    }
}

/// Per-owner notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationPreferences {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub email: String,
    pub new_testimonial_notifications: bool,
    pub weekly_summary: bool,
    pub pending_reminders: bool,
    pub pending_reminder_threshold: i32,
    pub reminder_frequency: ReminderFrequency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreferences {
    /// Settings served when an owner never saved any: everything on,
    /// threshold 3, daily cadence, no destination address yet.
    pub fn defaults_for(owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            owner_id,
            email: String::new(),
            new_testimonial_notifications: true,
            weekly_summary: true,
            pending_reminders: true,
            pending_reminder_threshold: DEFAULT_REMINDER_THRESHOLD,
            reminder_frequency: ReminderFrequency::Daily,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Upsert payload for notification preferences.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateNotificationPreferencesRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub new_testimonial_notifications: Option<bool>,
    pub weekly_summary: Option<bool>,
    pub pending_reminders: Option<bool>,

    #[validate(range(min = 1, max = 100, message = "Threshold must be between 1 and 100"))]
    pub pending_reminder_threshold: Option<i32>,

    pub reminder_frequency: Option<ReminderFrequency>,
}

/// Response payload for preference reads and writes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationPreferencesResponse {
    pub owner_id: Uuid,
    pub email: String,
    pub new_testimonial_notifications: bool,
    pub weekly_summary: bool,
    pub pending_reminders: bool,
    pub pending_reminder_threshold: i32,
    pub reminder_frequency: ReminderFrequency,
}

impl From<NotificationPreferences> for NotificationPreferencesResponse {
    fn from(p: NotificationPreferences) -> Self {
        Self {
            owner_id: p.owner_id,
            email: p.email,
            new_testimonial_notifications: p.new_testimonial_notifications,
            weekly_summary: p.weekly_summary,
            pending_reminders: p.pending_reminders,
            pending_reminder_threshold: p.pending_reminder_threshold,
            reminder_frequency: p.reminder_frequency,
        }
    }
}

/// A delivery-log row. Kind and status are stored as text snapshots so
/// historical rows survive enum changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationLog {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub notification_type: String,
    pub status: String,
    pub detail: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing notification logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListNotificationLogsQuery {
    pub owner_id: Uuid,
    pub limit: Option<i64>,
}

impl ListNotificationLogsQuery {
    /// Effective row cap, defaulting to 50.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }
}

/// Unsubscribe payload: disables every notification for all preference
/// rows carrying this address.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UnsubscribeRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Outcome of a single dispatch attempt. Failures are data, not errors:
/// callers never see a dispatch problem as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// One email was handed to the sender.
    Sent,
    /// Nothing sent, by design (disabled, unconfigured, below threshold).
    Skipped(String),
    /// The sender reported a problem; recorded and contained.
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent)
    }

    pub fn status(&self) -> NotificationStatus {
        match self {
            DispatchOutcome::Sent => NotificationStatus::Sent,
            DispatchOutcome::Skipped(_) => NotificationStatus::Skipped,
            DispatchOutcome::Failed(_) => NotificationStatus::Failed,
        }
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchOutcome::Sent => write!(f, "sent"),
            DispatchOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            DispatchOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Counts backing a weekly summary email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct WeeklySummaryCounts {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
}
