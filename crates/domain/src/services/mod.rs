//! Domain services for Testimonial Flow.
//!
//! Services contain business logic that operates on domain models.

pub mod email;
pub mod notification_policy;
pub mod rule_evaluation;

pub use email::{EmailError, EmailMessage, EmailSender, MockEmailSender};

pub use notification_policy::{
    gate_new_testimonial, gate_pending_reminder, gate_rule_notification, gate_weekly_summary,
    week_window, Gate,
};

pub use rule_evaluation::{
    apply_actions, dry_run, evaluate_condition, evaluate_conditions, order_for_pass, ActionEffects,
};
