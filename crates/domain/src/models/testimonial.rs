//! Testimonial domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use shared::validation::{
    validate_category_label, validate_photo_url, validate_rating, validate_testimonial_text,
    validate_video_url,
};

/// Moderation state of a testimonial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting moderation (default on submission).
    Pending,
    /// Published to the owner's wall.
    Approved,
    /// Hidden by moderation.
    Rejected,
}

impl ApprovalStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalStatus::Approved)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ApprovalStatus::Pending)
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            _ => Err(format!("Unknown approval status: {}", s)),
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "pending"),
            ApprovalStatus::Approved => write!(f, "approved"),
            ApprovalStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A testimonial collected from an end user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Testimonial {
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
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Testimonial {
    /// Resolves a field name to its text form for condition evaluation.
    ///
    /// Known fields: `name`, `text`, `email`, `category`, `rating`,
    /// `created_at`, plus the virtual `text_length` (character count of
    /// the body, not bytes). Absent values and unknown field names
    /// resolve to the empty string.
    pub fn field_value(&self, field: &str) -> String {
        match field {
            "name" => self.name.clone(),
            "text" => self.text.clone(),
            "email" => self.email.clone().unwrap_or_default(),
            "category" => self.category.clone().unwrap_or_default(),
            "rating" => self
                .rating
                .map(|r| r.to_string())
                .unwrap_or_default(),
            "created_at" => self.created_at.to_rfc3339(),
            "text_length" => self.text.chars().count().to_string(),
            _ => String::new(),
        }
    }
}

fn default_allow_sharing() -> bool {
    true
}

/// Public submission payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SubmitTestimonialRequest {
    pub owner_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_testimonial_text"))]
    pub text: String,

    #[validate(custom(function = "validate_rating"))]
    pub rating: Option<i32>,

    #[validate(custom(function = "validate_category_label"))]
    pub category: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default = "default_allow_sharing")]
    pub allow_sharing: bool,

    #[validate(custom(function = "validate_video_url"))]
    pub video_url: Option<String>,

    #[validate(custom(function = "validate_photo_url"))]
    pub photo_url: Option<String>,
}

impl SubmitTestimonialRequest {
    /// Trims free-text fields in place before persistence.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.text = self.text.trim().to_string();
        self.category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }
}

/// Query parameters for listing testimonials.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListTestimonialsQuery {
    pub owner_id: Uuid,
    pub approved_only: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListTestimonialsQuery {
    pub fn page_query(&self) -> shared::pagination::PageQuery {
        shared::pagination::PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Response payload for testimonial operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TestimonialResponse {
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
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Testimonial> for TestimonialResponse {
    fn from(t: Testimonial) -> Self {
        Self {
            id: t.id,
            owner_id: t.owner_id,
            name: t.name,
            text: t.text,
            rating: t.rating,
            category: t.category,
            email: t.email,
            allow_sharing: t.allow_sharing,
            video_url: t.video_url,
            photo_url: t.photo_url,
            status: t.status,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}
