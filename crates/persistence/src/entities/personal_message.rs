//! Personal message entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::personal_message::PersonalMessage;

/// Database row mapping for the personal_messages table.
#[derive(Debug, Clone, FromRow)]
pub struct PersonalMessageEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub message: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PersonalMessageEntity> for PersonalMessage {
    fn from(entity: PersonalMessageEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            title: entity.title,
            message: entity.message,
            is_visible: entity.is_visible,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
