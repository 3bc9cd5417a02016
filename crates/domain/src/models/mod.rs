//! Domain models for Testimonial Flow.

pub mod automation;
pub mod automation_log;
pub mod notification;
pub mod personal_message;
pub mod testimonial;

pub use automation::{
    Action, AutomationRule, Condition, ConditionOperator, LogicalOperator, RuleKind,
};
pub use automation_log::{AutomationLog, DryRunReport, EngineReport, RuleExecution};
pub use notification::{DispatchOutcome, NotificationKind, NotificationPreferences};
pub use personal_message::PersonalMessage;
pub use testimonial::{ApprovalStatus, Testimonial};
