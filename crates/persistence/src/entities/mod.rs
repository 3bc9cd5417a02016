//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod automation_log;
pub mod automation_rule;
pub mod notification_log;
pub mod notification_preferences;
pub mod personal_message;
pub mod testimonial;

pub use automation_log::AutomationLogEntity;
pub use automation_rule::AutomationRuleEntity;
pub use notification_log::NotificationLogEntity;
pub use notification_preferences::NotificationPreferencesEntity;
pub use personal_message::PersonalMessageEntity;
pub use testimonial::TestimonialEntity;
