//! Repository implementations for database operations.

pub mod automation_log;
pub mod automation_rule;
pub mod notification_log;
pub mod notification_preferences;
pub mod personal_message;
pub mod testimonial;

pub use automation_log::AutomationLogRepository;
pub use automation_rule::AutomationRuleRepository;
pub use notification_log::NotificationLogRepository;
pub use notification_preferences::NotificationPreferencesRepository;
pub use personal_message::PersonalMessageRepository;
pub use testimonial::{TestimonialRepository, WindowCounts};
