//! Notification dispatcher.
//!
//! One entry point per notification kind. Each call loads the owner's
//! preferences, runs the policy gates, composes the email, hands it to
//! the sender, and appends a NotificationLog row for the attempt. Skips
//! are logged too, so gating decisions stay auditable.
//!
//! Dispatch problems never escape as errors; callers get a
//! `DispatchOutcome` and carry on.

use chrono::{Local, Utc};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::notification::{
    DispatchOutcome, NotificationKind, NotificationPreferences, WeeklySummaryCounts,
};
use domain::models::testimonial::Testimonial;
use domain::services::email::{EmailMessage, EmailSender};
use domain::services::notification_policy::{
    gate_new_testimonial, gate_pending_reminder, gate_rule_notification, gate_weekly_summary,
    week_window, Gate,
};

use crate::config::{Config, EmailConfig};
use crate::middleware::metrics::record_notification;
use persistence::repositories::{
    NotificationLogRepository, NotificationPreferencesRepository, TestimonialRepository,
};

/// Sends owner notifications and records every attempt.
#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: PgPool,
    config: Arc<Config>,
    email: Arc<dyn EmailSender>,
}

impl NotificationDispatcher {
    pub fn new(pool: PgPool, config: Arc<Config>, email: Arc<dyn EmailSender>) -> Self {
        Self {
            pool,
            config,
            email,
        }
    }

    /// Notify the owner that a testimonial just arrived.
    pub async fn on_new_testimonial(&self, testimonial: &Testimonial) -> DispatchOutcome {
        let kind = NotificationKind::NewTestimonial;
        let owner_id = testimonial.owner_id;

        let prefs = match self.load_preferences(owner_id).await {
            Ok(prefs) => prefs,
            Err(outcome) => return outcome,
        };

        if let Gate::Skip(reason) = gate_new_testimonial(prefs.as_ref()) {
            return self.record_skip(owner_id, kind, reason).await;
        }
        let prefs = prefs.expect("gate passed without preferences");

        let message = compose_new_testimonial(&self.config.email, &prefs, testimonial);
        let detail = json!({
            "testimonial_id": testimonial.id,
            "subject": message.subject,
        });
        self.deliver(owner_id, kind, message, detail).await
    }

    /// Notify the owner that a rule with a notify action matched.
    pub async fn on_rule_match(
        &self,
        owner_id: Uuid,
        rule_name: &str,
        note: &str,
        testimonial: &Testimonial,
    ) -> DispatchOutcome {
        let kind = NotificationKind::RuleTriggered;

        let prefs = match self.load_preferences(owner_id).await {
            Ok(prefs) => prefs,
            Err(outcome) => return outcome,
        };

        if let Gate::Skip(reason) = gate_rule_notification(prefs.as_ref()) {
            return self.record_skip(owner_id, kind, reason).await;
        }
        let prefs = prefs.expect("gate passed without preferences");

        let message = compose_rule_triggered(&self.config.email, &prefs, rule_name, note, testimonial);
        let detail = json!({
            "rule_name": rule_name,
            "testimonial_id": testimonial.id,
        });
        self.deliver(owner_id, kind, message, detail).await
    }

    /// Send the weekly activity summary. The window runs from Monday
    /// 00:00 server-local time through now; zero counts still send.
    pub async fn send_weekly_summary(&self, owner_id: Uuid) -> DispatchOutcome {
        let kind = NotificationKind::WeeklySummary;

        let prefs = match self.load_preferences(owner_id).await {
            Ok(prefs) => prefs,
            Err(outcome) => return outcome,
        };

        if let Gate::Skip(reason) = gate_weekly_summary(prefs.as_ref()) {
            return self.record_skip(owner_id, kind, reason).await;
        }
        let prefs = prefs.expect("gate passed without preferences");

        let (start, end) = week_window(Local::now());
        let (start, end) = (start.with_timezone(&Utc), end.with_timezone(&Utc));

        let repo = TestimonialRepository::new(self.pool.clone());
        let window = match repo.window_counts(owner_id, start, end).await {
            Ok(counts) => counts,
            Err(e) => {
                let reason = format!("Window count query failed: {}", e);
                return self.record_failure(owner_id, kind, reason).await;
            }
        };

        let counts = WeeklySummaryCounts {
            total: window.total,
            approved: window.approved,
            pending: window.pending,
            week_start: start,
            week_end: end,
        };

        let message = compose_weekly_summary(&self.config.email, &prefs, &counts);
        let detail = serde_json::to_value(&counts).unwrap_or(JsonValue::Null);
        self.deliver(owner_id, kind, message, detail).await
    }

    /// Remind the owner about their pending review queue. Below the
    /// owner's threshold nothing is sent.
    pub async fn send_pending_reminder(&self, owner_id: Uuid) -> DispatchOutcome {
        let kind = NotificationKind::PendingReminder;

        let prefs = match self.load_preferences(owner_id).await {
            Ok(prefs) => prefs,
            Err(outcome) => return outcome,
        };

        // A count that passes any threshold screens just the preference
        // gates, so unconfigured or disabled owners skip the query.
        if let Gate::Skip(reason) = gate_pending_reminder(prefs.as_ref(), i64::MAX) {
            return self.record_skip(owner_id, kind, reason).await;
        }
        let prefs = prefs.expect("gate passed without preferences");

        let repo = TestimonialRepository::new(self.pool.clone());
        let pending = match repo.count_pending(owner_id).await {
            Ok(count) => count,
            Err(e) => {
                let reason = format!("Pending count query failed: {}", e);
                return self.record_failure(owner_id, kind, reason).await;
            }
        };

        if let Gate::Skip(reason) = gate_pending_reminder(Some(&prefs), pending) {
            return self.record_skip(owner_id, kind, reason).await;
        }

        let message = compose_pending_reminder(&self.config.email, &prefs, pending);
        let detail = json!({
            "pending": pending,
            "threshold": prefs.pending_reminder_threshold,
        });
        self.deliver(owner_id, kind, message, detail).await
    }

    async fn load_preferences(
        &self,
        owner_id: Uuid,
    ) -> Result<Option<NotificationPreferences>, DispatchOutcome> {
        let repo = NotificationPreferencesRepository::new(self.pool.clone());
        match repo.find_by_owner(owner_id).await {
            Ok(entity) => Ok(entity.map(NotificationPreferences::from)),
            Err(e) => {
                warn!(owner_id = %owner_id, error = %e, "Preference lookup failed");
                Err(DispatchOutcome::Failed(format!(
                    "Preference lookup failed: {}",
                    e
                )))
            }
        }
    }

    async fn deliver(
        &self,
        owner_id: Uuid,
        kind: NotificationKind,
        message: EmailMessage,
        detail: JsonValue,
    ) -> DispatchOutcome {
        match self.email.send(&message).await {
            Ok(()) => {
                info!(
                    owner_id = %owner_id,
                    kind = %kind,
                    to = %message.to,
                    "Notification sent"
                );
                let outcome = DispatchOutcome::Sent;
                self.append_log(owner_id, kind, &outcome, Some(detail)).await;
                outcome
            }
            Err(e) => {
                warn!(
                    owner_id = %owner_id,
                    kind = %kind,
                    error = %e,
                    "Notification send failed"
                );
                let outcome = DispatchOutcome::Failed(e.to_string());
                let detail = json!({ "error": e.to_string() });
                self.append_log(owner_id, kind, &outcome, Some(detail)).await;
                outcome
            }
        }
    }

    async fn record_skip(
        &self,
        owner_id: Uuid,
        kind: NotificationKind,
        reason: String,
    ) -> DispatchOutcome {
        let outcome = DispatchOutcome::Skipped(reason.clone());
        let detail = json!({ "reason": reason });
        self.append_log(owner_id, kind, &outcome, Some(detail)).await;
        outcome
    }

    async fn record_failure(
        &self,
        owner_id: Uuid,
        kind: NotificationKind,
        reason: String,
    ) -> DispatchOutcome {
        warn!(owner_id = %owner_id, kind = %kind, reason = %reason, "Dispatch failed");
        let outcome = DispatchOutcome::Failed(reason.clone());
        let detail = json!({ "error": reason });
        self.append_log(owner_id, kind, &outcome, Some(detail)).await;
        outcome
    }

    /// Append the delivery-log row. A log write problem is reported but
    /// never changes the outcome.
    async fn append_log(
        &self,
        owner_id: Uuid,
        kind: NotificationKind,
        outcome: &DispatchOutcome,
        detail: Option<JsonValue>,
    ) {
        let status = outcome.status().to_string();
        record_notification(&kind.to_string(), &status);

        let repo = NotificationLogRepository::new(self.pool.clone());
        if let Err(e) = repo
            .insert(owner_id, &kind.to_string(), &status, detail)
            .await
        {
            warn!(
                owner_id = %owner_id,
                kind = %kind,
                error = %e,
                "Failed to record notification log"
            );
        }
    }
}

/// First characters of the testimonial text for email bodies.
fn excerpt(text: &str) -> String {
    const LIMIT: usize = 160;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        let cut: String = text.chars().take(LIMIT).collect();
        format!("{}...", cut.trim_end())
    }
}

fn footer_text(config: &EmailConfig) -> String {
    if config.base_url.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nManage your notification settings: {}/settings/notifications",
            config.base_url
        )
    }
}

fn wrap_html(config: &EmailConfig, title: &str, inner: &str) -> String {
    let footer = if config.base_url.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p style="color: #999; font-size: 12px;"><a href="{base}/settings/notifications" style="color: #667eea;">Manage your notification settings</a></p>"#,
            base = config.base_url
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: #4c6ef5; padding: 24px; border-radius: 10px 10px 0 0;">
        <h1 style="color: white; margin: 0; font-size: 22px;">{sender}</h1>
    </div>
    <div style="background: #f9f9f9; padding: 24px; border-radius: 0 0 10px 10px;">
        {inner}
        {footer}
    </div>
</body>
</html>"#,
        title = title,
        sender = config.sender_name,
        inner = inner,
        footer = footer,
    )
}

fn compose_new_testimonial(
    config: &EmailConfig,
    prefs: &NotificationPreferences,
    testimonial: &Testimonial,
) -> EmailMessage {
    let subject = format!("New testimonial from {}", testimonial.name);
    let rating_line = match testimonial.rating {
        Some(rating) => format!("Rating: {}/5\n", rating),
        None => String::new(),
    };

    let body_text = format!(
        "You received a new testimonial.\n\nFrom: {name}\n{rating}Status: {status}\n\n\"{excerpt}\"{footer}",
        name = testimonial.name,
        rating = rating_line,
        status = testimonial.status,
        excerpt = excerpt(&testimonial.text),
        footer = footer_text(config),
    );

    let body_html = (config.template_style == "html").then(|| {
        let rating_html = match testimonial.rating {
            Some(rating) => format!("<p>Rating: <strong>{}/5</strong></p>", rating),
            None => String::new(),
        };
        let inner = format!(
            r#"<h2 style="margin-top: 0;">New testimonial</h2>
        <p>From: <strong>{name}</strong></p>
        {rating}
        <p>Status: {status}</p>
        <blockquote style="border-left: 3px solid #4c6ef5; margin: 16px 0; padding: 8px 16px; background: #fff;">{excerpt}</blockquote>"#,
            name = testimonial.name,
            rating = rating_html,
            status = testimonial.status,
            excerpt = excerpt(&testimonial.text),
        );
        wrap_html(config, &subject, &inner)
    });

    EmailMessage {
        to: prefs.email.clone(),
        to_name: None,
        subject,
        body_text,
        body_html,
    }
}

fn compose_rule_triggered(
    config: &EmailConfig,
    prefs: &NotificationPreferences,
    rule_name: &str,
    note: &str,
    testimonial: &Testimonial,
) -> EmailMessage {
    let subject = format!("Automation rule matched: {}", rule_name);

    let body_text = format!(
        "Your rule \"{rule}\" matched a testimonial from {name}.\n\n{note}\n\n\"{excerpt}\"{footer}",
        rule = rule_name,
        name = testimonial.name,
        note = note,
        excerpt = excerpt(&testimonial.text),
        footer = footer_text(config),
    );

    let body_html = (config.template_style == "html").then(|| {
        let inner = format!(
            r#"<h2 style="margin-top: 0;">Rule matched</h2>
        <p>Your rule <strong>{rule}</strong> matched a testimonial from <strong>{name}</strong>.</p>
        <p>{note}</p>
        <blockquote style="border-left: 3px solid #4c6ef5; margin: 16px 0; padding: 8px 16px; background: #fff;">{excerpt}</blockquote>"#,
            rule = rule_name,
            name = testimonial.name,
            note = note,
            excerpt = excerpt(&testimonial.text),
        );
        wrap_html(config, &subject, &inner)
    });

    EmailMessage {
        to: prefs.email.clone(),
        to_name: None,
        subject,
        body_text,
        body_html,
    }
}

fn compose_weekly_summary(
    config: &EmailConfig,
    prefs: &NotificationPreferences,
    counts: &WeeklySummaryCounts,
) -> EmailMessage {
    let subject = "Your weekly testimonial summary".to_string();

    let body_text = format!(
        "Here is your testimonial activity since Monday.\n\nReceived: {total}\nApproved: {approved}\nAwaiting review: {pending}{footer}",
        total = counts.total,
        approved = counts.approved,
        pending = counts.pending,
        footer = footer_text(config),
    );

    let body_html = (config.template_style == "html").then(|| {
        let inner = format!(
            r#"<h2 style="margin-top: 0;">Weekly summary</h2>
        <p>Your testimonial activity since Monday:</p>
        <ul>
            <li>Received: <strong>{total}</strong></li>
            <li>Approved: <strong>{approved}</strong></li>
            <li>Awaiting review: <strong>{pending}</strong></li>
        </ul>"#,
            total = counts.total,
            approved = counts.approved,
            pending = counts.pending,
        );
        wrap_html(config, &subject, &inner)
    });

    EmailMessage {
        to: prefs.email.clone(),
        to_name: None,
        subject,
        body_text,
        body_html,
    }
}

fn compose_pending_reminder(
    config: &EmailConfig,
    prefs: &NotificationPreferences,
    pending: i64,
) -> EmailMessage {
    let subject = format!(
        "{} testimonial{} waiting for review",
        pending,
        if pending == 1 { "" } else { "s" }
    );

    let body_text = format!(
        "You have {pending} testimonial{plural} waiting for review.{footer}",
        pending = pending,
        plural = if pending == 1 { "" } else { "s" },
        footer = footer_text(config),
    );

    let body_html = (config.template_style == "html").then(|| {
        let inner = format!(
            r#"<h2 style="margin-top: 0;">Pending reviews</h2>
        <p>You have <strong>{}</strong> testimonial{} waiting for review.</p>"#,
            pending,
            if pending == 1 { "" } else { "s" }
        );
        wrap_html(config, &subject, &inner)
    });

    EmailMessage {
        to: prefs.email.clone(),
        to_name: None,
        subject,
        body_text,
        body_html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::testimonial::ApprovalStatus;

    fn email_config(style: &str) -> EmailConfig {
        EmailConfig {
            template_style: style.to_string(),
            base_url: "https://app.example.com".to_string(),
            ..EmailConfig::default()
        }
    }

    fn prefs() -> NotificationPreferences {
        let mut p = NotificationPreferences::defaults_for(Uuid::new_v4());
        p.email = "owner@example.com".to_string();
        p
    }

    fn testimonial(text: &str) -> Testimonial {
        Testimonial {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Jordan Blake".to_string(),
            text: text.to_string(),
            rating: Some(5),
            category: None,
            email: None,
            allow_sharing: true,
            video_url: None,
            photo_url: None,
            status: ApprovalStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_excerpt_keeps_short_text() {
        assert_eq!(excerpt("Great product"), "Great product");
    }

    #[test]
    fn test_excerpt_truncates_long_text() {
        let long = "x".repeat(400);
        let result = excerpt(&long);
        assert!(result.ends_with("..."));
        assert!(result.chars().count() <= 163);
    }

    #[test]
    fn test_compose_new_testimonial_addresses_preference_email() {
        let message =
            compose_new_testimonial(&email_config("html"), &prefs(), &testimonial("Loved it, five stars"));

        assert_eq!(message.to, "owner@example.com");
        assert!(message.subject.contains("Jordan Blake"));
        assert!(message.body_text.contains("Rating: 5/5"));
        assert!(message.body_text.contains("Loved it"));
        assert!(message.body_html.is_some());
    }

    #[test]
    fn test_compose_plain_style_has_no_html_body() {
        let message =
            compose_new_testimonial(&email_config("plain"), &prefs(), &testimonial("Loved it"));
        assert!(message.body_html.is_none());
    }

    #[test]
    fn test_compose_includes_settings_footer_when_base_url_set() {
        let message =
            compose_new_testimonial(&email_config("plain"), &prefs(), &testimonial("Loved it"));
        assert!(message
            .body_text
            .contains("https://app.example.com/settings/notifications"));
    }

    #[test]
    fn test_compose_weekly_summary_carries_counts() {
        let counts = WeeklySummaryCounts {
            total: 7,
            approved: 4,
            pending: 2,
            week_start: Utc::now(),
            week_end: Utc::now(),
        };
        let message = compose_weekly_summary(&email_config("html"), &prefs(), &counts);

        assert!(message.body_text.contains("Received: 7"));
        assert!(message.body_text.contains("Approved: 4"));
        assert!(message.body_text.contains("Awaiting review: 2"));
    }

    #[test]
    fn test_compose_pending_reminder_singular_and_plural() {
        let one = compose_pending_reminder(&email_config("plain"), &prefs(), 1);
        assert_eq!(one.subject, "1 testimonial waiting for review");

        let many = compose_pending_reminder(&email_config("plain"), &prefs(), 4);
        assert_eq!(many.subject, "4 testimonials waiting for review");
    }

    #[test]
    fn test_compose_rule_triggered_names_rule_and_note() {
        let message = compose_rule_triggered(
            &email_config("plain"),
            &prefs(),
            "Flag spam",
            "Needs a second look",
            &testimonial("Click here for free prizes today"),
        );
        assert!(message.subject.contains("Flag spam"));
        assert!(message.body_text.contains("Needs a second look"));
    }
}
