//! Automation rule repository for database operations.

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::automation::{CreateAutomationRuleRequest, UpdateAutomationRuleRequest};

use crate::entities::AutomationRuleEntity;
use crate::metrics::QueryTimer;

/// Repository for automation rule database operations.
#[derive(Clone)]
pub struct AutomationRuleRepository {
    pool: PgPool,
}

impl AutomationRuleRepository {
    /// Creates a new AutomationRuleRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new automation rule.
    pub async fn create(
        &self,
        request: &CreateAutomationRuleRequest,
    ) -> Result<AutomationRuleEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_automation_rule");
        let conditions =
            serde_json::to_value(&request.conditions).unwrap_or_else(|_| JsonValue::Array(vec![]));
        let actions =
            serde_json::to_value(&request.actions).unwrap_or_else(|_| JsonValue::Array(vec![]));

        let result = sqlx::query_as::<_, AutomationRuleEntity>(
            r#"
            INSERT INTO automation_rules (
                owner_id, name, description, rule_type, conditions, actions,
                priority, enabled
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(request.owner_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.rule_type.to_string())
        .bind(conditions)
        .bind(actions)
        .bind(request.priority)
        .bind(request.enabled)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find rule by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AutomationRuleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_automation_rule_by_id");
        let result = sqlx::query_as::<_, AutomationRuleEntity>(
            r#"
            SELECT * FROM automation_rules WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List an owner's rules in execution order (priority first, then
    /// creation). `enabled` narrows when set.
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        enabled: Option<bool>,
    ) -> Result<Vec<AutomationRuleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_automation_rules");
        let result = sqlx::query_as::<_, AutomationRuleEntity>(
            r#"
            SELECT * FROM automation_rules
            WHERE owner_id = $1
              AND ($2::boolean IS NULL OR enabled = $2)
            ORDER BY priority DESC, created_at ASC
            "#,
        )
        .bind(owner_id)
        .bind(enabled)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Enabled rules for a pass, in creation order. The engine applies
    /// the priority ordering itself.
    pub async fn find_enabled_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<AutomationRuleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_enabled_automation_rules");
        let result = sqlx::query_as::<_, AutomationRuleEntity>(
            r#"
            SELECT * FROM automation_rules
            WHERE owner_id = $1 AND enabled = true
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count rules for an owner.
    pub async fn count_by_owner(&self, owner_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_automation_rules");
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM automation_rules WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count)
    }

    /// Update a rule (partial update).
    /// Only provided fields are updated; None values are preserved.
    pub async fn update(
        &self,
        id: Uuid,
        request: &UpdateAutomationRuleRequest,
    ) -> Result<Option<AutomationRuleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_automation_rule");
        let conditions = request
            .conditions
            .as_ref()
            .map(|c| serde_json::to_value(c).unwrap_or_else(|_| JsonValue::Array(vec![])));
        let actions = request
            .actions
            .as_ref()
            .map(|a| serde_json::to_value(a).unwrap_or_else(|_| JsonValue::Array(vec![])));

        let result = sqlx::query_as::<_, AutomationRuleEntity>(
            r#"
            UPDATE automation_rules SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                rule_type = COALESCE($4, rule_type),
                conditions = COALESCE($5, conditions),
                actions = COALESCE($6, actions),
                priority = COALESCE($7, priority),
                enabled = COALESCE($8, enabled),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.rule_type.map(|t| t.to_string()))
        .bind(conditions)
        .bind(actions)
        .bind(request.priority)
        .bind(request.enabled)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Flip a rule's enabled flag.
    pub async fn set_enabled(
        &self,
        id: Uuid,
        enabled: bool,
    ) -> Result<Option<AutomationRuleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("toggle_automation_rule");
        let result = sqlx::query_as::<_, AutomationRuleEntity>(
            r#"
            UPDATE automation_rules
            SET enabled = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(enabled)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a rule.
    /// Returns the number of rows deleted (0 or 1). Log rows keep their
    /// snapshots; their rule_id nulls out via the foreign key.
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_automation_rule");
        let result = sqlx::query(
            r#"
            DELETE FROM automation_rules WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_repository_creation() {
        // This test verifies the AutomationRuleRepository can be created
        // Actual database tests are integration tests
    }
}
