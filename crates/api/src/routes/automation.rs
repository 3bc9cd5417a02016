//! Automation rule management routes.
//!
//! Rules CRUD plus the dry-run endpoints, the audit-log listing, and
//! the per-owner stats aggregate.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{AutomationEngine, NotificationDispatcher};
use domain::models::automation::{
    AutomationRule, AutomationRuleResponse, CreateAutomationRuleRequest, ListAutomationRulesQuery,
    TestDraftRuleRequest, TestRuleRequest, ToggleAutomationRuleRequest,
    UpdateAutomationRuleRequest,
};
use domain::models::automation_log::{
    AutomationLog, AutomationStatsQuery, ListAutomationLogsQuery,
};
use domain::services::rule_evaluation::dry_run;
use persistence::repositories::{AutomationLogRepository, AutomationRuleRepository};
use shared::pagination::PaginatedResponse;

/// Create automation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rules", get(list_rules).post(create_rule))
        .route(
            "/rules/:rule_id",
            get(get_rule).put(update_rule).delete(delete_rule),
        )
        .route("/rules/:rule_id/toggle", put(toggle_rule))
        .route("/rules/:rule_id/test", post(test_rule))
        .route("/test", post(test_draft_rule))
        .route("/logs", get(list_logs))
        .route("/stats", get(get_stats))
}

fn engine(state: &AppState) -> AutomationEngine {
    let dispatcher = NotificationDispatcher::new(
        state.pool.clone(),
        state.config.clone(),
        state.email.clone(),
    );
    AutomationEngine::new(state.pool.clone(), state.config.clone(), dispatcher)
}

/// List an owner's rules, highest priority first.
#[axum::debug_handler]
pub async fn list_rules(
    State(state): State<AppState>,
    Query(query): Query<ListAutomationRulesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AutomationRuleRepository::new(state.pool.clone());

    let entities = repo.list_by_owner(query.owner_id, query.enabled).await?;
    let rules: Vec<AutomationRuleResponse> = entities
        .into_iter()
        .map(AutomationRule::from)
        .map(AutomationRuleResponse::from)
        .collect();

    Ok((StatusCode::OK, Json(rules)))
}

/// Create a rule. Enforces the per-owner rule cap.
#[axum::debug_handler]
pub async fn create_rule(
    State(state): State<AppState>,
    Json(request): Json<CreateAutomationRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = AutomationRuleRepository::new(state.pool.clone());

    let max_rules = state.config.automation.max_rules_per_owner;
    let existing = repo.count_by_owner(request.owner_id).await?;
    if existing >= max_rules {
        return Err(ApiError::Conflict(format!(
            "Rule limit of {} per owner reached",
            max_rules
        )));
    }

    let entity = repo.create(&request).await?;
    let response = AutomationRuleResponse::from(AutomationRule::from(entity));

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a single rule.
#[axum::debug_handler]
pub async fn get_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AutomationRuleRepository::new(state.pool.clone());

    match repo.find_by_id(rule_id).await? {
        Some(entity) => Ok((
            StatusCode::OK,
            Json(AutomationRuleResponse::from(AutomationRule::from(entity))),
        )),
        None => Err(ApiError::NotFound("Automation rule not found".to_string())),
    }
}

/// Update a rule (partial).
#[axum::debug_handler]
pub async fn update_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<Uuid>,
    Json(request): Json<UpdateAutomationRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = AutomationRuleRepository::new(state.pool.clone());

    match repo.update(rule_id, &request).await? {
        Some(entity) => Ok((
            StatusCode::OK,
            Json(AutomationRuleResponse::from(AutomationRule::from(entity))),
        )),
        None => Err(ApiError::NotFound("Automation rule not found".to_string())),
    }
}

/// Enable or disable a rule.
#[axum::debug_handler]
pub async fn toggle_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<Uuid>,
    Json(request): Json<ToggleAutomationRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AutomationRuleRepository::new(state.pool.clone());

    match repo.set_enabled(rule_id, request.enabled).await? {
        Some(entity) => Ok((
            StatusCode::OK,
            Json(AutomationRuleResponse::from(AutomationRule::from(entity))),
        )),
        None => Err(ApiError::NotFound("Automation rule not found".to_string())),
    }
}

/// Delete a rule. Its log rows survive with `rule_id` nulled.
#[axum::debug_handler]
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AutomationRuleRepository::new(state.pool.clone());

    let deleted = repo.delete(rule_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Automation rule not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Dry-run a persisted rule against a sample testimonial.
#[axum::debug_handler]
pub async fn test_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<Uuid>,
    Json(request): Json<TestRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    match engine(&state).test_rule(rule_id, request.testimonial).await? {
        Some(report) => Ok((StatusCode::OK, Json(report))),
        None => Err(ApiError::NotFound("Automation rule not found".to_string())),
    }
}

/// Dry-run a draft rule that was never saved.
#[axum::debug_handler]
pub async fn test_draft_rule(
    Json(request): Json<TestDraftRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let TestDraftRuleRequest {
        conditions,
        actions,
        testimonial,
    } = request;

    let sample = testimonial.into_testimonial(Uuid::new_v4());
    let report = dry_run(&conditions, &actions, &sample);

    Ok((StatusCode::OK, Json(report)))
}

/// List an owner's automation log rows, newest first.
#[axum::debug_handler]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<ListAutomationLogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AutomationLogRepository::new(state.pool.clone());

    let (entities, total) = repo.list(&query).await?;
    let logs: Vec<AutomationLog> = entities.into_iter().map(AutomationLog::from).collect();

    let response = PaginatedResponse::new(logs, &query.page_query(), total);
    Ok((StatusCode::OK, Json(response)))
}

/// Per-owner automation statistics.
#[axum::debug_handler]
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<AutomationStatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AutomationLogRepository::new(state.pool.clone());

    let stats = repo.stats(query.owner_id).await?;
    Ok((StatusCode::OK, Json(stats)))
}
