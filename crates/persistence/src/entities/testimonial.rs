//! Testimonial entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::testimonial::{ApprovalStatus, Testimonial};

/// Database row mapping for the testimonials table.
#[derive(Debug, Clone, FromRow)]
pub struct TestimonialEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub text: String,
    pub rating: Option<i32>,
    pub category: Option<String>,
    pub email: Option<String>,
    pub allow_sharing: bool,
    pub video_url: Option<String>,
    pub photo_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TestimonialEntity> for Testimonial {
    fn from(entity: TestimonialEntity) -> Self {
        // The status column carries a CHECK constraint; an unexpected
        // value degrades to pending instead of failing the read.
        let status = entity
            .status
            .parse::<ApprovalStatus>()
            .unwrap_or(ApprovalStatus::Pending);

        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            name: entity.name,
            text: entity.text,
            rating: entity.rating,
            category: entity.category,
            email: entity.email,
            allow_sharing: entity.allow_sharing,
            video_url: entity.video_url,
            photo_url: entity.photo_url,
            status,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
