//! Rule evaluation logic.
//!
//! Everything here is pure: conditions are checked against a testimonial,
//! actions are applied to an in-memory copy, and nothing touches storage.
//! Persistence and notifications happen in the api layer around this core.
//!
//! Evaluation never fails. Every malformed input (unknown operator,
//! unparseable number, invalid regex) degrades the condition to false.

use tracing::warn;

use crate::models::automation::{
    Action, AutomationRule, Condition, ConditionOperator, LogicalOperator,
};
use crate::models::automation_log::{ConditionCheck, DryRunReport};
use crate::models::testimonial::Testimonial;

/// Evaluates one condition against a testimonial.
pub fn evaluate_condition(condition: &Condition, testimonial: &Testimonial) -> bool {
    // The virtual length field compares numerically; a non-numeric
    // condition value counts as 0.
    if condition.field == "text_length" {
        let length = testimonial.text.chars().count() as i64;
        let value = condition.value.trim().parse::<i64>().unwrap_or(0);
        match &condition.operator {
            ConditionOperator::Equals => return length == value,
            ConditionOperator::GreaterThan => return length > value,
            ConditionOperator::LessThan => return length < value,
            // Remaining operators treat the length as its decimal text.
            _ => {}
        }
    }

    let field_value = testimonial.field_value(&condition.field);

    match &condition.operator {
        ConditionOperator::Equals => {
            field_value.to_lowercase() == condition.value.to_lowercase()
        }
        ConditionOperator::Contains => field_value
            .to_lowercase()
            .contains(&condition.value.to_lowercase()),
        ConditionOperator::StartsWith => field_value
            .to_lowercase()
            .starts_with(&condition.value.to_lowercase()),
        ConditionOperator::EndsWith => field_value
            .to_lowercase()
            .ends_with(&condition.value.to_lowercase()),
        ConditionOperator::GreaterThan => match numeric_sides(&field_value, &condition.value) {
            Some((field, value)) => field > value,
            None => false,
        },
        ConditionOperator::LessThan => match numeric_sides(&field_value, &condition.value) {
            Some((field, value)) => field < value,
            None => false,
        },
        ConditionOperator::Regex => match regex::Regex::new(&condition.value) {
            // The pattern is compiled as written; the subject is lowercased.
            Ok(re) => re.is_match(&field_value.to_lowercase()),
            Err(_) => {
                warn!(
                    field = %condition.field,
                    pattern = %condition.value,
                    "invalid regex in condition, evaluating false"
                );
                false
            }
        },
        ConditionOperator::Other(name) => {
            warn!(operator = %name, "unknown condition operator, evaluating false");
            false
        }
    }
}

fn numeric_sides(field_value: &str, condition_value: &str) -> Option<(f64, f64)> {
    let field = field_value.trim().parse::<f64>().ok()?;
    let value = condition_value.trim().parse::<f64>().ok()?;
    Some((field, value))
}

/// Folds a condition list left to right.
///
/// An empty list matches vacuously. The first condition seeds the
/// accumulator; each later condition combines with it under the sticky
/// connective: `and` until a condition carries `logical_operator`, which
/// then stays in force until the next override. `and` narrows, `or`
/// widens, so `A and B or C` reads `((A and B) or C)`.
pub fn evaluate_conditions(conditions: &[Condition], testimonial: &Testimonial) -> bool {
    fold_conditions(conditions, testimonial, None)
}

/// Evaluates a rule body without touching anything: reports every
/// condition check, the overall match, and the actions that would run.
pub fn dry_run(conditions: &[Condition], actions: &[Action], testimonial: &Testimonial) -> DryRunReport {
    let mut checks = Vec::with_capacity(conditions.len());
    let matched = fold_conditions(conditions, testimonial, Some(&mut checks));
    DryRunReport {
        matched,
        checks,
        planned_actions: actions.to_vec(),
    }
}

fn fold_conditions(
    conditions: &[Condition],
    testimonial: &Testimonial,
    mut checks: Option<&mut Vec<ConditionCheck>>,
) -> bool {
    if conditions.is_empty() {
        return true;
    }

    let mut result = false;
    let mut connective = LogicalOperator::And;

    for (index, condition) in conditions.iter().enumerate() {
        let passed = evaluate_condition(condition, testimonial);
        if index == 0 {
            result = passed;
        } else {
            if let Some(op) = condition.logical_operator {
                connective = op;
            }
            result = match connective {
                LogicalOperator::And => result && passed,
                LogicalOperator::Or => result || passed,
            };
        }
        if let Some(ref mut checks) = checks {
            checks.push(ConditionCheck {
                condition: condition.clone(),
                passed,
                running_result: result,
            });
        }
    }

    result
}

/// What applying a matched rule's actions did to the working copy.
#[derive(Debug, Clone, Default)]
pub struct ActionEffects {
    /// Actions actually applied, in order.
    pub executed: Vec<Action>,
    /// Labels attached by flag actions.
    pub flags: Vec<String>,
    /// Messages requested by notify actions; the caller forwards them to
    /// the dispatcher.
    pub notify_messages: Vec<String>,
}

/// Applies a matched rule's actions to the working testimonial copy.
///
/// Status and category changes land immediately, so rules later in the
/// same pass see them. Unknown kinds are skipped with a warning and do
/// not appear in `executed`.
pub fn apply_actions(testimonial: &mut Testimonial, actions: &[Action]) -> ActionEffects {
    use crate::models::testimonial::ApprovalStatus;

    let mut effects = ActionEffects::default();

    for action in actions {
        match action {
            Action::Approve => testimonial.status = ApprovalStatus::Approved,
            Action::Reject => testimonial.status = ApprovalStatus::Rejected,
            Action::Categorize { category } => testimonial.category = Some(category.clone()),
            Action::Flag { label } => effects.flags.push(label.clone()),
            Action::Notify { message } => effects.notify_messages.push(message.clone()),
            Action::Other { kind, .. } => {
                warn!(kind = %kind, "skipping unknown action kind");
                continue;
            }
        }
        effects.executed.push(action.clone());
    }

    effects
}

/// Orders rules for a pass: priority descending, ties keep their input
/// (creation) order.
pub fn order_for_pass(mut rules: Vec<AutomationRule>) -> Vec<AutomationRule> {
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    rules
}
