//! Personal thank-you message routes.
//!
//! At most one message per owner is visible at a time; the repository
//! enforces that inside a transaction whenever visibility changes.

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
use domain::models::personal_message::{
    CreatePersonalMessageRequest, ListPersonalMessagesQuery, PersonalMessage,
    PersonalMessageResponse, SetVisibilityRequest, UpdatePersonalMessageRequest,
};
use persistence::repositories::PersonalMessageRepository;

/// Create personal messages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_messages).post(create_message))
        .route("/visible", get(get_visible_message))
        .route("/:id", get(get_message).put(update_message).delete(delete_message))
        .route("/:id/visibility", put(set_message_visibility))
}

/// List an owner's messages, newest first.
#[axum::debug_handler]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ListPersonalMessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PersonalMessageRepository::new(state.pool.clone());

    let entities = repo.list_by_owner(query.owner_id).await?;
    let messages: Vec<PersonalMessageResponse> = entities
        .into_iter()
        .map(PersonalMessage::from)
        .map(PersonalMessageResponse::from)
        .collect();

    Ok((StatusCode::OK, Json(messages)))
}

/// Create a message. Creating it visible hides the owner's others.
#[axum::debug_handler]
pub async fn create_message(
    State(state): State<AppState>,
    Json(request): Json<CreatePersonalMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let request = request.normalized();

    let repo = PersonalMessageRepository::new(state.pool.clone());

    let entity = repo
        .create(
            request.owner_id,
            &request.title,
            &request.message,
            request.is_visible,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PersonalMessageResponse::from(PersonalMessage::from(entity))),
    ))
}

/// The owner's currently visible message, shown on the public page.
#[axum::debug_handler]
pub async fn get_visible_message(
    State(state): State<AppState>,
    Query(query): Query<ListPersonalMessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PersonalMessageRepository::new(state.pool.clone());

    match repo.find_visible(query.owner_id).await? {
        Some(entity) => Ok((
            StatusCode::OK,
            Json(PersonalMessageResponse::from(PersonalMessage::from(entity))),
        )),
        None => Err(ApiError::NotFound("No visible message".to_string())),
    }
}

/// Get a single message.
#[axum::debug_handler]
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PersonalMessageRepository::new(state.pool.clone());

    match repo.find_by_id(id).await? {
        Some(entity) => Ok((
            StatusCode::OK,
            Json(PersonalMessageResponse::from(PersonalMessage::from(entity))),
        )),
        None => Err(ApiError::NotFound("Message not found".to_string())),
    }
}

/// Update a message (partial). Setting it visible hides the others.
#[axum::debug_handler]
pub async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePersonalMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = PersonalMessageRepository::new(state.pool.clone());

    match repo
        .update(
            id,
            request.title.as_deref(),
            request.message.as_deref(),
            request.is_visible,
        )
        .await?
    {
        Some(entity) => Ok((
            StatusCode::OK,
            Json(PersonalMessageResponse::from(PersonalMessage::from(entity))),
        )),
        None => Err(ApiError::NotFound("Message not found".to_string())),
    }
}

/// Switch a message's visibility.
#[axum::debug_handler]
pub async fn set_message_visibility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetVisibilityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PersonalMessageRepository::new(state.pool.clone());

    match repo.set_visibility(id, request.is_visible).await? {
        Some(entity) => Ok((
            StatusCode::OK,
            Json(PersonalMessageResponse::from(PersonalMessage::from(entity))),
        )),
        None => Err(ApiError::NotFound("Message not found".to_string())),
    }
}

/// Delete a message.
#[axum::debug_handler]
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PersonalMessageRepository::new(state.pool.clone());

    let deleted = repo.delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Message not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
