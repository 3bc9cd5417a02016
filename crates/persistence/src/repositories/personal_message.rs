//! Personal message repository for database operations.
//!
//! Owners keep at most one visible message; every write that turns a
//! message visible first hides the rest of that owner's messages, inside
//! one transaction.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PersonalMessageEntity;
use crate::metrics::QueryTimer;

/// Repository for personal message database operations.
#[derive(Clone)]
pub struct PersonalMessageRepository {
    pool: PgPool,
}

impl PersonalMessageRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a message. When it arrives visible, the owner's other
    /// messages are hidden in the same transaction.
    pub async fn create(
        &self,
        owner_id: Uuid,
        title: &str,
        message: &str,
        is_visible: bool,
    ) -> Result<PersonalMessageEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_personal_message");
        let mut tx = self.pool.begin().await?;

        if is_visible {
            sqlx::query(
                r#"
                UPDATE personal_messages
                SET is_visible = false, updated_at = NOW()
                WHERE owner_id = $1 AND is_visible = true
                "#,
            )
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        }

        let entity = sqlx::query_as::<_, PersonalMessageEntity>(
            r#"
            INSERT INTO personal_messages (owner_id, title, message, is_visible)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(title)
        .bind(message)
        .bind(is_visible)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Find message by ID.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<PersonalMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_personal_message_by_id");
        let result = sqlx::query_as::<_, PersonalMessageEntity>(
            r#"
            SELECT * FROM personal_messages WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All messages for an owner, newest first.
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<PersonalMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_personal_messages");
        let result = sqlx::query_as::<_, PersonalMessageEntity>(
            r#"
            SELECT * FROM personal_messages
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The owner's single visible message, if any.
    pub async fn find_visible(
        &self,
        owner_id: Uuid,
    ) -> Result<Option<PersonalMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_visible_personal_message");
        let result = sqlx::query_as::<_, PersonalMessageEntity>(
            r#"
            SELECT * FROM personal_messages
            WHERE owner_id = $1 AND is_visible = true
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update a message (partial update).
    /// Only provided fields are updated; None values are preserved.
    /// Turning a message visible hides the owner's other messages.
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<&str>,
        message: Option<&str>,
        is_visible: Option<bool>,
    ) -> Result<Option<PersonalMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_personal_message");
        let mut tx = self.pool.begin().await?;

        if is_visible == Some(true) {
            sqlx::query(
                r#"
                UPDATE personal_messages
                SET is_visible = false, updated_at = NOW()
                WHERE owner_id = (SELECT owner_id FROM personal_messages WHERE id = $1)
                  AND id <> $1
                  AND is_visible = true
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let entity = sqlx::query_as::<_, PersonalMessageEntity>(
            r#"
            UPDATE personal_messages SET
                title = COALESCE($2, title),
                message = COALESCE($3, message),
                is_visible = COALESCE($4, is_visible),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(message)
        .bind(is_visible)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Show or hide one message, keeping the one-visible invariant.
    pub async fn set_visibility(
        &self,
        id: Uuid,
        is_visible: bool,
    ) -> Result<Option<PersonalMessageEntity>, sqlx::Error> {
        self.update(id, None, None, Some(is_visible)).await
    }

    /// Delete a message.
    /// Returns the number of rows deleted (0 or 1).
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_personal_message");
        let result = sqlx::query(
            r#"
            DELETE FROM personal_messages WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
