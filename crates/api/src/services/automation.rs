//! Automation rule engine.
//!
//! Runs an owner's enabled rules over one testimonial: priority order,
//! conditions against the working copy, matched actions applied so later
//! rules see earlier effects, one audit-log row per evaluated rule. The
//! pass never fails the caller; rule loading or log-write problems are
//! logged and contained.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use domain::models::automation::{AutomationRule, SampleTestimonial};
use domain::models::automation_log::{DryRunReport, EngineReport, RuleExecution};
use domain::models::notification::DispatchOutcome;
use domain::models::testimonial::Testimonial;
use domain::services::rule_evaluation::{
    apply_actions, dry_run, evaluate_conditions, order_for_pass, ActionEffects,
};

use crate::config::Config;
use crate::middleware::metrics::record_rule_pass;
use crate::services::notifications::NotificationDispatcher;
use persistence::repositories::{
    AutomationLogRepository, AutomationRuleRepository, TestimonialRepository,
};

/// Executes rule passes and dry runs for one deployment.
#[derive(Clone)]
pub struct AutomationEngine {
    pool: PgPool,
    config: Arc<Config>,
    dispatcher: NotificationDispatcher,
}

impl AutomationEngine {
    pub fn new(pool: PgPool, config: Arc<Config>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            pool,
            config,
            dispatcher,
        }
    }

    /// Runs the owner's enabled rules over `testimonial` and persists the
    /// resulting status/category change.
    ///
    /// The returned report reflects what is actually stored: if the final
    /// write fails, `final_status` stays at the pre-pass value.
    pub async fn apply_rules(&self, testimonial: &Testimonial) -> EngineReport {
        let owner_id = testimonial.owner_id;
        let rule_repo = AutomationRuleRepository::new(self.pool.clone());
        let log_repo = AutomationLogRepository::new(self.pool.clone());

        let mut report = EngineReport {
            testimonial_id: testimonial.id,
            rules_evaluated: 0,
            rules_matched: 0,
            final_status: testimonial.status,
            final_category: testimonial.category.clone(),
            flags: Vec::new(),
            executions: Vec::new(),
        };

        let rules: Vec<AutomationRule> = match rule_repo.find_enabled_by_owner(owner_id).await {
            Ok(entities) => entities.into_iter().map(AutomationRule::from).collect(),
            Err(e) => {
                error!(
                    owner_id = %owner_id,
                    testimonial_id = %testimonial.id,
                    error = %e,
                    "Failed to load automation rules, leaving testimonial untouched"
                );
                return report;
            }
        };

        if rules.is_empty() {
            return report;
        }

        let rules = order_for_pass(rules);
        let total = rules.len();

        let mut working = testimonial.clone();
        let original_status = testimonial.status;
        let original_category = testimonial.category.clone();

        let budget_ms = self.config.automation.pass_budget_ms;
        let pass_started = Instant::now();

        for rule in rules {
            if budget_ms > 0 && pass_started.elapsed().as_millis() as u64 >= budget_ms {
                warn!(
                    owner_id = %owner_id,
                    evaluated = report.rules_evaluated,
                    skipped = total - report.rules_evaluated,
                    budget_ms,
                    "Rule pass budget exhausted, remaining rules skipped"
                );
                break;
            }

            let started = Instant::now();
            let matched = evaluate_conditions(&rule.conditions, &working);
            let effects = if matched {
                apply_actions(&mut working, &rule.actions)
            } else {
                ActionEffects::default()
            };
            let execution_time_ms = started.elapsed().as_millis() as i32;

            report.rules_evaluated += 1;
            if matched {
                report.rules_matched += 1;
            }
            report.flags.extend(effects.flags.iter().cloned());

            // Notify actions go out as soon as the rule settles; the
            // first delivery failure is kept on the log row.
            let mut error_message = None;
            for note in &effects.notify_messages {
                let outcome = self
                    .dispatcher
                    .on_rule_match(owner_id, &rule.name, note, &working)
                    .await;
                if let DispatchOutcome::Failed(reason) = outcome {
                    if error_message.is_none() {
                        error_message = Some(format!("Notify action failed: {}", reason));
                    }
                }
            }

            let execution = RuleExecution {
                rule_id: Some(rule.id),
                rule_name: rule.name.clone(),
                rule_type: rule.rule_type,
                conditions_evaluated: rule.conditions.clone(),
                conditions_met: matched,
                actions_executed: effects.executed,
                execution_time_ms,
                error_message,
            };

            if let Err(e) = log_repo
                .insert(owner_id, Some(testimonial.id), &execution)
                .await
            {
                error!(
                    owner_id = %owner_id,
                    rule_id = %rule.id,
                    error = %e,
                    "Failed to record automation log row"
                );
            }

            report.executions.push(execution);
        }

        let status_changed = working.status != original_status;
        let category_changed = working.category != original_category;
        if status_changed || category_changed {
            let testimonial_repo = TestimonialRepository::new(self.pool.clone());
            let category = if category_changed {
                working.category.as_deref()
            } else {
                None
            };
            match testimonial_repo
                .apply_engine_outcome(testimonial.id, working.status, category)
                .await
            {
                Ok(Some(_)) => {
                    report.final_status = working.status;
                    report.final_category = working.category.clone();
                }
                Ok(None) => {
                    warn!(
                        testimonial_id = %testimonial.id,
                        "Testimonial disappeared before the engine outcome could be applied"
                    );
                }
                Err(e) => {
                    error!(
                        testimonial_id = %testimonial.id,
                        error = %e,
                        "Failed to persist engine outcome"
                    );
                }
            }
        }

        record_rule_pass(report.rules_evaluated, report.rules_matched);

        info!(
            owner_id = %owner_id,
            testimonial_id = %testimonial.id,
            rules_evaluated = report.rules_evaluated,
            rules_matched = report.rules_matched,
            final_status = %report.final_status,
            "Automation pass complete"
        );

        report
    }

    /// Dry-runs a persisted rule against a sample testimonial. Returns
    /// `None` when the rule does not exist. Nothing is mutated or logged.
    pub async fn test_rule(
        &self,
        rule_id: Uuid,
        sample: SampleTestimonial,
    ) -> Result<Option<DryRunReport>, sqlx::Error> {
        let repo = AutomationRuleRepository::new(self.pool.clone());
        let Some(entity) = repo.find_by_id(rule_id).await? else {
            return Ok(None);
        };

        let rule = AutomationRule::from(entity);
        let testimonial = sample.into_testimonial(rule.owner_id);
        Ok(Some(dry_run(&rule.conditions, &rule.actions, &testimonial)))
    }
}
