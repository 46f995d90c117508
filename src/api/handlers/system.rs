//! System endpoints: health check and editor options.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::BadgeOptionsResponse;
use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /config/badge-options`: Allowed values for the badge editor.
#[utoipa::path(
    get,
    path = "/config/badge-options",
    tag = "System",
    summary = "Badge editor options",
    description = "Lists the accepted timer sizes, positions and urgency notifications together with the defaults applied to omitted fields.",
    responses(
        (status = 200, description = "Editor options", body = BadgeOptionsResponse),
    )
)]
pub async fn badge_options_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(BadgeOptionsResponse::default()))
}

/// System routes mounted at the root level (not under /api).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/badge-options", get(badge_options_handler))
}
