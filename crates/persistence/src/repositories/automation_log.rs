//! Automation log repository for database operations.
//!
//! Logs are append-only: one row per evaluated rule, written after the
//! rule's outcome is known. Rule name and type are snapshotted so the
//! history survives rule deletion.

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::automation_log::{
    AutomationStats, ListAutomationLogsQuery, RuleExecution, RuleStats,
};

use crate::entities::AutomationLogEntity;
use crate::metrics::QueryTimer;

/// Repository for automation log database operations.
#[derive(Clone)]
pub struct AutomationLogRepository {
    pool: PgPool,
}

impl AutomationLogRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one execution record.
    pub async fn insert(
        &self,
        owner_id: Uuid,
        testimonial_id: Option<Uuid>,
        execution: &RuleExecution,
    ) -> Result<AutomationLogEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_automation_log");
        let conditions = serde_json::to_value(&execution.conditions_evaluated)
            .unwrap_or_else(|_| JsonValue::Array(vec![]));
        let actions = serde_json::to_value(&execution.actions_executed)
            .unwrap_or_else(|_| JsonValue::Array(vec![]));

        let result = sqlx::query_as::<_, AutomationLogEntity>(
            r#"
            INSERT INTO automation_logs (
                owner_id, rule_id, testimonial_id, rule_name, rule_type,
                conditions_evaluated, conditions_met, actions_executed,
                execution_time_ms, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(execution.rule_id)
        .bind(testimonial_id)
        .bind(&execution.rule_name)
        .bind(execution.rule_type.to_string())
        .bind(conditions)
        .bind(execution.conditions_met)
        .bind(actions)
        .bind(execution.execution_time_ms)
        .bind(&execution.error_message)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List an owner's logs newest first, with a total count for
    /// pagination. Optional narrowing by rule or match outcome.
    pub async fn list(
        &self,
        query: &ListAutomationLogsQuery,
    ) -> Result<(Vec<AutomationLogEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_automation_logs");
        let page = query.page_query();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM automation_logs
            WHERE owner_id = $1
              AND ($2::uuid IS NULL OR rule_id = $2)
              AND ($3::boolean IS NULL OR conditions_met = $3)
            "#,
        )
        .bind(query.owner_id)
        .bind(query.rule_id)
        .bind(query.conditions_met)
        .fetch_one(&self.pool)
        .await?;

        let entities = sqlx::query_as::<_, AutomationLogEntity>(
            r#"
            SELECT * FROM automation_logs
            WHERE owner_id = $1
              AND ($2::uuid IS NULL OR rule_id = $2)
              AND ($3::boolean IS NULL OR conditions_met = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(query.owner_id)
        .bind(query.rule_id)
        .bind(query.conditions_met)
        .bind(page.per_page())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        timer.record();
        Ok((entities, total))
    }

    /// Aggregate execution statistics for an owner.
    pub async fn stats(&self, owner_id: Uuid) -> Result<AutomationStats, sqlx::Error> {
        let timer = QueryTimer::new("automation_log_stats");

        let totals: (i64, i64, i64, i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE conditions_met),
                   COALESCE(SUM(jsonb_array_length(actions_executed)), 0)::bigint,
                   COUNT(*) FILTER (WHERE error_message IS NOT NULL),
                   COALESCE(AVG(execution_time_ms), 0)::float8
            FROM automation_logs
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<(Option<Uuid>, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT rule_id, rule_name,
                   COUNT(*),
                   COUNT(*) FILTER (WHERE conditions_met)
            FROM automation_logs
            WHERE owner_id = $1
            GROUP BY rule_id, rule_name
            ORDER BY COUNT(*) DESC, rule_name ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        timer.record();

        let (total_executions, matched, actions_executed, failed, avg_execution_time_ms) = totals;
        let match_rate = if total_executions > 0 {
            matched as f64 / total_executions as f64
        } else {
            0.0
        };

        Ok(AutomationStats {
            total_executions,
            matched,
            match_rate,
            actions_executed,
            failed,
            avg_execution_time_ms,
            by_rule: rows
                .into_iter()
                .map(|(rule_id, rule_name, executions, matched)| RuleStats {
                    rule_id,
                    rule_name,
                    executions,
                    matched,
                })
                .collect(),
        })
    }
}
