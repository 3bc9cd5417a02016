//! HTTP route handlers.

pub mod automation;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod testimonials;
