//! Personal message domain model.
//!
//! Owners curate short thank-you messages shown on the public collection
//! page. At most one message per owner is visible at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A thank-you message shown after submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PersonalMessage {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub message: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_visible() -> bool {
    true
}

/// Request payload for creating a personal message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreatePersonalMessageRequest {
    pub owner_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 500, message = "Message must be 1-500 characters"))]
    pub message: String,

    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

impl CreatePersonalMessageRequest {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.message = self.message.trim().to_string();
        self
    }
}

/// Request payload for updating a personal message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdatePersonalMessageRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 500, message = "Message must be 1-500 characters"))]
    pub message: Option<String>,

    pub is_visible: Option<bool>,
}

/// Request payload for switching which message is visible.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SetVisibilityRequest {
    pub is_visible: bool,
}

/// Query parameters for listing an owner's messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListPersonalMessagesQuery {
    pub owner_id: Uuid,
}

/// Response payload for personal message operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PersonalMessageResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub message: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PersonalMessage> for PersonalMessageResponse {
    fn from(m: PersonalMessage) -> Self {
        Self {
            id: m.id,
            owner_id: m.owner_id,
            title: m.title,
            message: m.message,
            is_visible: m.is_visible,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
