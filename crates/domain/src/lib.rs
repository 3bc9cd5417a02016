//! Domain layer for the Testimonial Flow backend.
//!
//! This crate contains:
//! - Domain models (Testimonial, AutomationRule, NotificationPreferences)
//! - Rule evaluation and notification policy services
//! - The email sending abstraction

pub mod models;
pub mod services;
