//! Automation log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::automation_log::AutomationLog;

/// Database row mapping for the automation_logs table.
///
/// Rule name and type are snapshots taken at execution time; the rule_id
/// and testimonial_id references null out when their rows are deleted.
#[derive(Debug, Clone, FromRow)]
pub struct AutomationLogEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub rule_id: Option<Uuid>,
    pub testimonial_id: Option<Uuid>,
    pub rule_name: String,
    pub rule_type: String,
    pub conditions_evaluated: serde_json::Value,
    pub conditions_met: bool,
    pub actions_executed: serde_json::Value,
    pub execution_time_ms: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AutomationLogEntity> for AutomationLog {
    fn from(entity: AutomationLogEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            rule_id: entity.rule_id,
            testimonial_id: entity.testimonial_id,
            rule_name: entity.rule_name,
            rule_type: entity.rule_type,
            conditions_evaluated: entity.conditions_evaluated,
            conditions_met: entity.conditions_met,
            actions_executed: entity.actions_executed,
            execution_time_ms: entity.execution_time_ms,
            error_message: entity.error_message,
            created_at: entity.created_at,
        }
    }
}
