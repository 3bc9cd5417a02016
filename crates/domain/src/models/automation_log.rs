//! Automation audit log domain models.
//!
//! Every rule evaluated during a pass leaves one log row, matched or not.
//! Rows snapshot the rule name/type and the conditions as they were at
//! execution time, so the trail stays readable after rules are edited or
//! deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::automation::{Action, Condition, RuleKind};
use crate::models::testimonial::ApprovalStatus;

/// A persisted automation log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AutomationLog {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Null once the rule has been deleted.
    pub rule_id: Option<Uuid>,
    /// Null once the testimonial has been deleted.
    pub testimonial_id: Option<Uuid>,
    pub rule_name: String,
    pub rule_type: String,
    pub conditions_evaluated: JsonValue,
    pub conditions_met: bool,
    pub actions_executed: JsonValue,
    pub execution_time_ms: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of evaluating one rule against one testimonial, before it is
/// persisted as an [`AutomationLog`] row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleExecution {
    pub rule_id: Option<Uuid>,
    pub rule_name: String,
    pub rule_type: RuleKind,
    pub conditions_evaluated: Vec<Condition>,
    pub conditions_met: bool,
    pub actions_executed: Vec<Action>,
    pub execution_time_ms: i32,
    pub error_message: Option<String>,
}

/// Aggregate result of one full rule pass over a testimonial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineReport {
    pub testimonial_id: Uuid,
    pub rules_evaluated: usize,
    pub rules_matched: usize,
    pub final_status: ApprovalStatus,
    pub final_category: Option<String>,
    pub flags: Vec<String>,
    pub executions: Vec<RuleExecution>,
}

impl EngineReport {
    /// Compact form returned alongside submission responses.
    pub fn summary(&self) -> EngineReportSummary {
        EngineReportSummary {
            rules_evaluated: self.rules_evaluated,
            rules_matched: self.rules_matched,
            final_status: self.final_status,
            flags: self.flags.clone(),
        }
    }
}

/// Engine outcome summary embedded in submission responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineReportSummary {
    pub rules_evaluated: usize,
    pub rules_matched: usize,
    pub final_status: ApprovalStatus,
    pub flags: Vec<String>,
}

/// Per-condition detail reported by dry runs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConditionCheck {
    pub condition: Condition,
    pub passed: bool,
    /// Combined result after folding this condition in.
    pub running_result: bool,
}

/// Dry-run result: what the rule WOULD do. Nothing is mutated or logged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DryRunReport {
    pub matched: bool,
    pub checks: Vec<ConditionCheck>,
    pub planned_actions: Vec<Action>,
}

/// Query parameters for listing automation logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListAutomationLogsQuery {
    pub owner_id: Uuid,
    pub rule_id: Option<Uuid>,
    pub conditions_met: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListAutomationLogsQuery {
    pub fn page_query(&self) -> shared::pagination::PageQuery {
        shared::pagination::PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Query parameters for the stats endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AutomationStatsQuery {
    pub owner_id: Uuid,
}

/// Per-rule slice of the stats aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleStats {
    pub rule_id: Option<Uuid>,
    pub rule_name: String,
    pub executions: i64,
    pub matched: i64,
}

/// Owner-level automation statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AutomationStats {
    pub total_executions: i64,
    pub matched: i64,
    pub match_rate: f64,
    pub actions_executed: i64,
    pub failed: i64,
    pub avg_execution_time_ms: f64,
    pub by_rule: Vec<RuleStats>,
}
