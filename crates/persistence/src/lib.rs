//! Persistence layer for the Testimonial Flow backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//!
//! Migrations live in `src/migrations` and are embedded by the api crate
//! with `sqlx::migrate!`.

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
