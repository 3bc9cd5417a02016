//! Shared utilities and common types for the Testimonial Flow backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Field validation helpers and submission limits
//! - Offset pagination types for list endpoints

pub mod pagination;
pub mod validation;
