//! Automation rule entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::automation::{Action, AutomationRule, Condition, RuleKind};

/// Database row mapping for the automation_rules table.
///
/// Conditions and actions are stored as JSONB arrays and decoded into
/// their typed forms on conversion.
#[derive(Debug, Clone, FromRow)]
pub struct AutomationRuleEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub rule_type: String,
    pub conditions: serde_json::Value,
    pub actions: serde_json::Value,
    pub priority: i32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AutomationRuleEntity> for AutomationRule {
    fn from(entity: AutomationRuleEntity) -> Self {
        let rule_type = entity
            .rule_type
            .parse::<RuleKind>()
            .unwrap_or(RuleKind::AutoApproval);

        // Rows are written through the typed requests, so decode failures
        // mean hand-edited data; treat those rules as having no body.
        let conditions: Vec<Condition> =
            serde_json::from_value(entity.conditions).unwrap_or_default();
        let actions: Vec<Action> = serde_json::from_value(entity.actions).unwrap_or_default();

        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            name: entity.name,
            description: entity.description,
            rule_type,
            conditions,
            actions,
            priority: entity.priority,
            enabled: entity.enabled,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::automation::ConditionOperator;

    fn create_test_rule_entity() -> AutomationRuleEntity {
        AutomationRuleEntity {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Approve five star".to_string(),
            description: None,
            rule_type: "auto_approval".to_string(),
            conditions: serde_json::json!([
                { "field": "rating", "operator": "equals", "value": "5" }
            ]),
            actions: serde_json::json!([{ "type": "approve" }]),
            priority: 5,
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_decodes_conditions_and_actions() {
        let rule: AutomationRule = create_test_rule_entity().into();

        assert_eq!(rule.rule_type, RuleKind::AutoApproval);
        assert_eq!(rule.conditions.len(), 1);
        assert_eq!(rule.conditions[0].operator, ConditionOperator::Equals);
        assert_eq!(rule.actions, vec![Action::Approve]);
    }

    #[test]
    fn test_malformed_json_degrades_to_empty_body() {
        let mut entity = create_test_rule_entity();
        entity.conditions = serde_json::json!({ "not": "a list" });
        entity.actions = serde_json::json!(42);

        let rule: AutomationRule = entity.into();
        assert!(rule.conditions.is_empty());
        assert!(rule.actions.is_empty());
    }

    #[test]
    fn test_unknown_action_kind_survives_decode() {
        let mut entity = create_test_rule_entity();
        entity.actions = serde_json::json!([
            { "type": "escalate", "value": "tier-2" }
        ]);

        let rule: AutomationRule = entity.into();
        assert_eq!(rule.actions.len(), 1);
        assert_eq!(rule.actions[0].kind(), "escalate");
    }
}
