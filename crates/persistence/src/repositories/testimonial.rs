//! Testimonial repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::testimonial::{ApprovalStatus, ListTestimonialsQuery, SubmitTestimonialRequest};

use crate::entities::TestimonialEntity;
use crate::metrics::QueryTimer;

/// Totals for one owner's reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCounts {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
}

/// Repository for testimonial-related database operations.
#[derive(Clone)]
pub struct TestimonialRepository {
    pool: PgPool,
}

impl TestimonialRepository {
    /// Creates a new TestimonialRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a submitted testimonial. The row always starts pending;
    /// the caller is expected to pass a normalized request.
    pub async fn create(
        &self,
        request: &SubmitTestimonialRequest,
    ) -> Result<TestimonialEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_testimonial");
        let result = sqlx::query_as::<_, TestimonialEntity>(
            r#"
            INSERT INTO testimonials (
                owner_id, name, text, rating, category, email,
                allow_sharing, video_url, photo_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(request.owner_id)
        .bind(&request.name)
        .bind(&request.text)
        .bind(request.rating)
        .bind(&request.category)
        .bind(&request.email)
        .bind(request.allow_sharing)
        .bind(&request.video_url)
        .bind(&request.photo_url)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find testimonial by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TestimonialEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_testimonial_by_id");
        let result = sqlx::query_as::<_, TestimonialEntity>(
            r#"
            SELECT * FROM testimonials WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List an owner's testimonials newest first, with a total count for
    /// pagination. `approved_only` narrows to approved rows.
    pub async fn list(
        &self,
        query: &ListTestimonialsQuery,
    ) -> Result<(Vec<TestimonialEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_testimonials");
        let page = query.page_query();
        let approved_only = query.approved_only.unwrap_or(false);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM testimonials
            WHERE owner_id = $1
              AND (NOT $2 OR status = 'approved')
            "#,
        )
        .bind(query.owner_id)
        .bind(approved_only)
        .fetch_one(&self.pool)
        .await?;

        let entities = sqlx::query_as::<_, TestimonialEntity>(
            r#"
            SELECT * FROM testimonials
            WHERE owner_id = $1
              AND (NOT $2 OR status = 'approved')
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.owner_id)
        .bind(approved_only)
        .bind(page.per_page())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        timer.record();
        Ok((entities, total))
    }

    /// Set the approval status of a testimonial.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: ApprovalStatus,
    ) -> Result<Option<TestimonialEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_testimonial_status");
        let result = sqlx::query_as::<_, TestimonialEntity>(
            r#"
            UPDATE testimonials
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Persist the state a rule pass produced: status always, category
    /// only when the pass assigned one.
    pub async fn apply_engine_outcome(
        &self,
        id: Uuid,
        status: ApprovalStatus,
        category: Option<&str>,
    ) -> Result<Option<TestimonialEntity>, sqlx::Error> {
        let timer = QueryTimer::new("apply_engine_outcome");
        let result = sqlx::query_as::<_, TestimonialEntity>(
            r#"
            UPDATE testimonials
            SET status = $2,
                category = COALESCE($3, category),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .bind(category)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count an owner's pending testimonials.
    pub async fn count_pending(&self, owner_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_pending_testimonials");
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM testimonials
            WHERE owner_id = $1 AND status = 'pending'
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count)
    }

    /// Totals for a reporting window (weekly summary).
    pub async fn window_counts(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WindowCounts, sqlx::Error> {
        let timer = QueryTimer::new("testimonial_window_counts");
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'approved'),
                   COUNT(*) FILTER (WHERE status = 'pending')
            FROM testimonials
            WHERE owner_id = $1
              AND created_at >= $2
              AND created_at <= $3
            "#,
        )
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(WindowCounts {
            total: row.0,
            approved: row.1,
            pending: row.2,
        })
    }

    /// Delete a testimonial.
    /// Returns the number of rows deleted (0 or 1).
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_testimonial");
        let result = sqlx::query(
            r#"
            DELETE FROM testimonials WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
