//! Notification preference and delivery-log routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::notification::{
    ListNotificationLogsQuery, NotificationLog, NotificationPreferences,
    NotificationPreferencesResponse, UnsubscribeRequest, UpdateNotificationPreferencesRequest,
};
use persistence::repositories::{NotificationLogRepository, NotificationPreferencesRepository};

/// Create notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/preferences/:owner_id",
            get(get_preferences).put(update_preferences),
        )
        .route("/logs", get(list_logs))
        .route("/unsubscribe", post(unsubscribe))
}

/// Get an owner's notification preferences.
///
/// Owners without a stored row get the defaults: everything on,
/// reminder threshold 3, daily frequency.
#[axum::debug_handler]
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = NotificationPreferencesRepository::new(state.pool.clone());

    let preferences = repo
        .find_by_owner(owner_id)
        .await?
        .map(NotificationPreferences::from)
        .unwrap_or_else(|| NotificationPreferences::defaults_for(owner_id));

    Ok((
        StatusCode::OK,
        Json(NotificationPreferencesResponse::from(preferences)),
    ))
}

/// Upsert an owner's notification preferences.
///
/// Omitted toggles keep their current value (or the default when no row
/// exists yet); the email is always taken from the request.
#[axum::debug_handler]
pub async fn update_preferences(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(request): Json<UpdateNotificationPreferencesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = NotificationPreferencesRepository::new(state.pool.clone());

    let current = repo
        .find_by_owner(owner_id)
        .await?
        .map(NotificationPreferences::from)
        .unwrap_or_else(|| NotificationPreferences::defaults_for(owner_id));

    let entity = repo
        .upsert(
            owner_id,
            &request.email,
            request
                .new_testimonial_notifications
                .unwrap_or(current.new_testimonial_notifications),
            request.weekly_summary.unwrap_or(current.weekly_summary),
            request.pending_reminders.unwrap_or(current.pending_reminders),
            request
                .pending_reminder_threshold
                .unwrap_or(current.pending_reminder_threshold),
            request
                .reminder_frequency
                .unwrap_or(current.reminder_frequency),
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(NotificationPreferencesResponse::from(
            NotificationPreferences::from(entity),
        )),
    ))
}

/// List an owner's recent notification log rows, newest first.
#[axum::debug_handler]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationLogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = NotificationLogRepository::new(state.pool.clone());

    let entities = repo.list_recent(query.owner_id, query.limit()).await?;
    let logs: Vec<NotificationLog> = entities.into_iter().map(NotificationLog::from).collect();

    Ok((StatusCode::OK, Json(logs)))
}

/// Unsubscribe response: how many preference rows were updated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UnsubscribeResponse {
    pub updated: u64,
}

/// Turn off all notification toggles for every preferences row matching
/// the given email. Idempotent; unknown addresses return `updated: 0`.
#[axum::debug_handler]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = NotificationPreferencesRepository::new(state.pool.clone());

    let updated = repo.unsubscribe_by_email(&request.email).await?;
    info!(updated, "Unsubscribe request processed");

    Ok((StatusCode::OK, Json(UnsubscribeResponse { updated })))
}
