//! Application services: the rule engine, notification dispatch, and
//! email transport.

pub mod automation;
pub mod email;
pub mod notifications;

#[allow(unused_imports)] // Used in routes and jobs
pub use automation::AutomationEngine;
pub use email::EmailService;
pub use notifications::NotificationDispatcher;
