//! Badge CRUD handlers: create, list, get, update, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    BadgeListResponse, BadgeMutationResponse, BadgeResponse, MessageResponse, SyncQuery,
};
use crate::app_state::AppState;
use crate::domain::BadgeInput;
use crate::error::{BadgeError, ErrorResponse};

/// `POST /createBadge`: Create a timer badge.
///
/// # Errors
///
/// Returns [`BadgeError`] when the body is malformed, the name is missing
/// or taken, or a field is invalid.
#[utoipa::path(
    post,
    path = "/api/createBadge",
    tag = "Badges",
    summary = "Create a timer badge",
    description = "Validates the submitted badge, stores it and mirrors it into the shop's metafield. An unknown urgency notification is stored as `None`.",
    params(SyncQuery),
    request_body = BadgeInput,
    responses(
        (status = 201, description = "Badge created", body = BadgeMutationResponse),
        (status = 400, description = "Missing name, duplicate name or invalid field", body = ErrorResponse),
    )
)]
pub async fn create_badge(
    State(state): State<AppState>,
    Query(query): Query<SyncQuery>,
    body: Result<Json<BadgeInput>, JsonRejection>,
) -> Result<impl IntoResponse, BadgeError> {
    let Json(input) = body?;
    let badge = state.badge_service.create(input, &query.scope()).await?;
    Ok((
        StatusCode::CREATED,
        Json(BadgeMutationResponse::new(
            "TimerBadge created successfully",
            badge,
        )),
    ))
}

/// `GET /getBadges`: List every badge.
///
/// # Errors
///
/// Returns [`BadgeError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/getBadges",
    tag = "Badges",
    summary = "List badges",
    description = "Returns every stored badge, oldest first. No pagination.",
    responses(
        (status = 200, description = "All badges", body = BadgeListResponse),
    )
)]
pub async fn list_badges(
    State(state): State<AppState>,
) -> Result<Json<BadgeListResponse>, BadgeError> {
    let badges = state.badge_service.list().await?;
    Ok(Json(BadgeListResponse { badges }))
}

/// `GET /getBadge/{id}`: Fetch one badge.
///
/// # Errors
///
/// Returns [`BadgeError::NotFound`] for an unknown or malformed id.
#[utoipa::path(
    get,
    path = "/api/getBadge/{id}",
    tag = "Badges",
    summary = "Get badge",
    params(("id" = String, Path, description = "Badge id")),
    responses(
        (status = 200, description = "Badge found", body = BadgeResponse),
        (status = 404, description = "Badge not found", body = ErrorResponse),
    )
)]
pub async fn get_badge(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BadgeResponse>, BadgeError> {
    let badge = state.badge_service.get_by_id(&id).await?;
    Ok(Json(BadgeResponse { badge }))
}

/// `PUT|PATCH /updateBadge/{id}`: Replace a badge.
///
/// # Errors
///
/// Returns [`BadgeError`] as for create, or `NotFound` for an unknown id.
#[utoipa::path(
    put,
    path = "/api/updateBadge/{id}",
    tag = "Badges",
    summary = "Update badge",
    description = "Replaces every field of the badge. Fields left out of the body revert to their defaults. `PATCH` is accepted with the same semantics.",
    params(("id" = String, Path, description = "Badge id"), SyncQuery),
    request_body = BadgeInput,
    responses(
        (status = 200, description = "Badge updated", body = BadgeMutationResponse),
        (status = 400, description = "Missing name, duplicate name or invalid field", body = ErrorResponse),
        (status = 404, description = "Badge not found", body = ErrorResponse),
    )
)]
pub async fn update_badge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SyncQuery>,
    body: Result<Json<BadgeInput>, JsonRejection>,
) -> Result<Json<BadgeMutationResponse>, BadgeError> {
    let Json(input) = body?;
    let badge = state
        .badge_service
        .update(&id, input, &query.scope())
        .await?;
    Ok(Json(BadgeMutationResponse::new(
        "TimerBadge updated successfully",
        badge,
    )))
}

/// `DELETE /deleteBadge/{id}`: Delete a badge.
///
/// # Errors
///
/// Returns [`BadgeError::NotFound`] for an unknown or malformed id.
#[utoipa::path(
    delete,
    path = "/api/deleteBadge/{id}",
    tag = "Badges",
    summary = "Delete badge",
    description = "Removes the badge and its entry in the storefront mirror.",
    params(("id" = String, Path, description = "Badge id"), SyncQuery),
    responses(
        (status = 200, description = "Badge deleted", body = MessageResponse),
        (status = 404, description = "Badge not found", body = ErrorResponse),
    )
)]
pub async fn delete_badge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<MessageResponse>, BadgeError> {
    state.badge_service.delete(&id, &query.scope()).await?;
    Ok(Json(MessageResponse {
        message: "TimerBadge deleted successfully".to_string(),
    }))
}

/// Badge routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/createBadge", post(create_badge))
        .route("/getBadges", get(list_badges))
        .route("/getBadge/{id}", get(get_badge))
        .route("/updateBadge/{id}", put(update_badge).patch(update_badge))
        .route("/deleteBadge/{id}", delete(delete_badge))
}
