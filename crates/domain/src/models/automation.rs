//! Automation rule domain model.
//!
//! Rules are owner-defined: an ordered set of conditions over an incoming
//! testimonial plus the actions to apply when they match. Conditions and
//! actions are stored as JSON, so both tolerate values written by newer
//! builds: unknown operators evaluate to false, unknown action kinds are
//! preserved and skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::testimonial::{ApprovalStatus, Testimonial};
use shared::validation::{validate_category_label, validate_priority, validate_rating};

/// Rule families surfaced in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    AutoApproval,
    SpamDetection,
    Categorization,
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto_approval" => Ok(RuleKind::AutoApproval),
            "spam_detection" => Ok(RuleKind::SpamDetection),
            "categorization" => Ok(RuleKind::Categorization),
            _ => Err(format!("Unknown rule type: {}", s)),
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::AutoApproval => write!(f, "auto_approval"),
            RuleKind::SpamDetection => write!(f, "spam_detection"),
            RuleKind::Categorization => write!(f, "categorization"),
        }
    }
}

/// Comparison applied by a single condition.
///
/// Operator names unknown to this build deserialize as `Other` and always
/// evaluate to false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOperator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    Regex,
    StartsWith,
    EndsWith,
    Other(String),
}

impl ConditionOperator {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "equals" => ConditionOperator::Equals,
            "contains" => ConditionOperator::Contains,
            "greater_than" => ConditionOperator::GreaterThan,
            "less_than" => ConditionOperator::LessThan,
            "regex" => ConditionOperator::Regex,
            "starts_with" => ConditionOperator::StartsWith,
            "ends_with" => ConditionOperator::EndsWith,
            _ => ConditionOperator::Other(s.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ConditionOperator::Other(_))
    }
}

impl FromStr for ConditionOperator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ConditionOperator::parse(s))
    }
}

impl std::fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionOperator::Equals => write!(f, "equals"),
            ConditionOperator::Contains => write!(f, "contains"),
            ConditionOperator::GreaterThan => write!(f, "greater_than"),
            ConditionOperator::LessThan => write!(f, "less_than"),
            ConditionOperator::Regex => write!(f, "regex"),
            ConditionOperator::StartsWith => write!(f, "starts_with"),
            ConditionOperator::EndsWith => write!(f, "ends_with"),
            ConditionOperator::Other(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for ConditionOperator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ConditionOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ConditionOperator::parse(&s))
    }
}

/// Connective between a condition and the running result of everything
/// before it. Dashboards have historically sent both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    #[serde(alias = "AND", alias = "And")]
    And,
    #[serde(alias = "OR", alias = "Or")]
    Or,
}

/// A single check against one testimonial field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<LogicalOperator>,
}

/// What a matched rule does to the testimonial.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Approve,
    Reject,
    Flag { label: String },
    Categorize { category: String },
    Notify { message: String },
    /// Kinds this build does not know. Kept verbatim, skipped at
    /// execution with a warning.
    Other { kind: String, value: Option<JsonValue> },
}

impl Action {
    pub fn kind(&self) -> &str {
        match self {
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::Flag { .. } => "flag",
            Action::Categorize { .. } => "categorize",
            Action::Notify { .. } => "notify",
            Action::Other { kind, .. } => kind,
        }
    }
}

/// Wire form of an action: `{"type": "...", "value": ...}`.
#[derive(Serialize, Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<JsonValue>,
}

fn raw_value_text(value: Option<JsonValue>) -> String {
    match value {
        Some(JsonValue::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let raw = match self {
            Action::Approve => RawAction {
                kind: "approve".to_string(),
                value: None,
            },
            Action::Reject => RawAction {
                kind: "reject".to_string(),
                value: None,
            },
            Action::Flag { label } => RawAction {
                kind: "flag".to_string(),
                value: Some(JsonValue::String(label.clone())),
            },
            Action::Categorize { category } => RawAction {
                kind: "categorize".to_string(),
                value: Some(JsonValue::String(category.clone())),
            },
            Action::Notify { message } => RawAction {
                kind: "notify".to_string(),
                value: Some(JsonValue::String(message.clone())),
            },
            Action::Other { kind, value } => RawAction {
                kind: kind.clone(),
                value: value.clone(),
            },
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawAction::deserialize(deserializer)?;
        let action = match raw.kind.to_lowercase().as_str() {
            "approve" => Action::Approve,
            "reject" => Action::Reject,
            "flag" => Action::Flag {
                label: raw_value_text(raw.value),
            },
            "categorize" => Action::Categorize {
                category: raw_value_text(raw.value),
            },
            "notify" => Action::Notify {
                message: raw_value_text(raw.value),
            },
            _ => Action::Other {
                kind: raw.kind,
                value: raw.value,
            },
        };
        Ok(action)
    }
}

/// An owner-defined automation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AutomationRule {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub rule_type: RuleKind,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    /// 1-10; higher priority rules run first.
    pub priority: i32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_priority() -> i32 {
    1
}

fn default_enabled() -> bool {
    true
}

/// Request payload for creating a rule.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateAutomationRuleRequest {
    pub owner_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub rule_type: RuleKind,

    #[serde(default)]
    #[validate(custom(function = "validate_rule_conditions"))]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    #[validate(custom(function = "validate_rule_actions"))]
    pub actions: Vec<Action>,

    #[serde(default = "default_priority")]
    #[validate(custom(function = "validate_priority"))]
    pub priority: i32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Request payload for updating a rule (partial update).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateAutomationRuleRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub rule_type: Option<RuleKind>,

    #[validate(custom(function = "validate_rule_conditions"))]
    pub conditions: Option<Vec<Condition>>,

    #[validate(custom(function = "validate_rule_actions"))]
    pub actions: Option<Vec<Action>>,

    #[validate(custom(function = "validate_priority"))]
    pub priority: Option<i32>,

    pub enabled: Option<bool>,
}

/// Request payload for the enable/disable toggle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToggleAutomationRuleRequest {
    pub enabled: bool,
}

/// Query parameters for listing rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListAutomationRulesQuery {
    pub owner_id: Uuid,
    pub enabled: Option<bool>,
}

/// Conditions on a create/update request must be executable as written.
fn validate_rule_conditions(conditions: &[Condition]) -> Result<(), ValidationError> {
    for condition in conditions {
        if condition.field.trim().is_empty() {
            let mut err = ValidationError::new("condition_field");
            err.message = Some("Condition field must not be empty".into());
            return Err(err);
        }
        if !condition.operator.is_known() {
            let mut err = ValidationError::new("condition_operator");
            err.message =
                Some(format!("Unknown condition operator: {}", condition.operator).into());
            return Err(err);
        }
        if condition.operator == ConditionOperator::Regex
            && regex::Regex::new(&condition.value).is_err()
        {
            let mut err = ValidationError::new("condition_regex");
            err.message = Some("Condition value is not a valid regex".into());
            return Err(err);
        }
    }
    Ok(())
}

/// Known action kinds must carry a usable payload. Unknown kinds pass
/// through so rules written by newer builds keep working.
fn validate_rule_actions(actions: &[Action]) -> Result<(), ValidationError> {
    for action in actions {
        match action {
            Action::Flag { label } if label.trim().is_empty() => {
                let mut err = ValidationError::new("action_value");
                err.message = Some("Flag actions require a label".into());
                return Err(err);
            }
            Action::Categorize { category } => {
                validate_category_label(category)?;
            }
            Action::Notify { message } if message.trim().is_empty() => {
                let mut err = ValidationError::new("action_value");
                err.message = Some("Notify actions require a message".into());
                return Err(err);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Response payload for rule operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AutomationRuleResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub rule_type: RuleKind,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    pub priority: i32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AutomationRule> for AutomationRuleResponse {
    fn from(r: AutomationRule) -> Self {
        Self {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            description: r.description,
            rule_type: r.rule_type,
            conditions: r.conditions,
            actions: r.actions,
            priority: r.priority,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Sample payload evaluated by dry runs. Everything is optional so a
/// dashboard can probe a rule with partial data.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SampleTestimonial {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    pub text: Option<String>,

    #[validate(custom(function = "validate_rating"))]
    pub rating: Option<i32>,

    pub category: Option<String>,

    pub email: Option<String>,
}

impl SampleTestimonial {
    /// Builds an ephemeral testimonial for evaluation only.
    pub fn into_testimonial(self, owner_id: Uuid) -> Testimonial {
        let now = Utc::now();
        Testimonial {
            id: Uuid::new_v4(),
            owner_id,
            name: self.name.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            rating: self.rating,
            category: self.category,
            email: self.email,
            allow_sharing: true,
            video_url: None,
            photo_url: None,
            status: ApprovalStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request payload for dry-running a persisted rule.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct TestRuleRequest {
    #[validate(nested)]
    pub testimonial: SampleTestimonial,
}

/// Request payload for dry-running a draft rule that was never saved.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct TestDraftRuleRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_rule_conditions"))]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    #[validate(custom(function = "validate_rule_actions"))]
    pub actions: Vec<Action>,

    #[validate(nested)]
    pub testimonial: SampleTestimonial,
}
