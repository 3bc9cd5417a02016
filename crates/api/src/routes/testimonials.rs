//! Testimonial lifecycle routes.
//!
//! Submission is the public entry point: persist as pending, run the
//! owner's automation rules inline, notify the owner, and return the
//! post-engine state together with an engine summary.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_testimonial_submitted;
use crate::services::{AutomationEngine, NotificationDispatcher};
use domain::models::automation_log::EngineReportSummary;
use domain::models::testimonial::{
    ApprovalStatus, ListTestimonialsQuery, SubmitTestimonialRequest, Testimonial,
    TestimonialResponse,
};
use persistence::repositories::TestimonialRepository;
use shared::pagination::PaginatedResponse;

/// Create testimonials router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_testimonial).get(list_testimonials))
        .route("/:id", get(get_testimonial).delete(delete_testimonial))
        .route("/:id/approve", put(approve_testimonial))
        .route("/:id/reject", put(reject_testimonial))
}

/// Submission response: the stored testimonial plus what automation did.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SubmitTestimonialResponse {
    pub testimonial: TestimonialResponse,
    pub automation: EngineReportSummary,
}

/// Submit a testimonial.
///
/// Persists it as pending, runs the owner's enabled rules, then sends
/// the new-testimonial notification with the post-engine state.
#[axum::debug_handler]
pub async fn submit_testimonial(
    State(state): State<AppState>,
    Json(request): Json<SubmitTestimonialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let request = request.normalized();

    let repo = TestimonialRepository::new(state.pool.clone());
    let entity = repo.create(&request).await?;
    let testimonial = Testimonial::from(entity);

    record_testimonial_submitted();

    let dispatcher = NotificationDispatcher::new(
        state.pool.clone(),
        state.config.clone(),
        state.email.clone(),
    );
    let engine = AutomationEngine::new(state.pool.clone(), state.config.clone(), dispatcher.clone());

    let report = engine.apply_rules(&testimonial).await;

    let mut stored = testimonial;
    stored.status = report.final_status;
    stored.category = report.final_category.clone();

    dispatcher.on_new_testimonial(&stored).await;

    let response = SubmitTestimonialResponse {
        testimonial: stored.into(),
        automation: report.summary(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// List an owner's testimonials, newest first.
#[axum::debug_handler]
pub async fn list_testimonials(
    State(state): State<AppState>,
    Query(query): Query<ListTestimonialsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = TestimonialRepository::new(state.pool.clone());

    let (entities, total) = repo.list(&query).await?;
    let data: Vec<TestimonialResponse> = entities
        .into_iter()
        .map(Testimonial::from)
        .map(TestimonialResponse::from)
        .collect();

    let response = PaginatedResponse::new(data, &query.page_query(), total);
    Ok((StatusCode::OK, Json(response)))
}

/// Get a single testimonial.
#[axum::debug_handler]
pub async fn get_testimonial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = TestimonialRepository::new(state.pool.clone());

    match repo.find_by_id(id).await? {
        Some(entity) => Ok((
            StatusCode::OK,
            Json(TestimonialResponse::from(Testimonial::from(entity))),
        )),
        None => Err(ApiError::NotFound("Testimonial not found".to_string())),
    }
}

/// Approve a testimonial.
#[axum::debug_handler]
pub async fn approve_testimonial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    set_status(state, id, ApprovalStatus::Approved).await
}

/// Reject a testimonial.
#[axum::debug_handler]
pub async fn reject_testimonial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    set_status(state, id, ApprovalStatus::Rejected).await
}

async fn set_status(
    state: AppState,
    id: Uuid,
    status: ApprovalStatus,
) -> Result<(StatusCode, Json<TestimonialResponse>), ApiError> {
    let repo = TestimonialRepository::new(state.pool.clone());

    match repo.set_status(id, status).await? {
        Some(entity) => Ok((
            StatusCode::OK,
            Json(TestimonialResponse::from(Testimonial::from(entity))),
        )),
        None => Err(ApiError::NotFound("Testimonial not found".to_string())),
    }
}

/// Delete a testimonial.
#[axum::debug_handler]
pub async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = TestimonialRepository::new(state.pool.clone());

    let deleted = repo.delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Testimonial not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
