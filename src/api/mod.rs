//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Badge endpoints are mounted under `/api`, where the embedded admin calls
//! them, and again at the root for callers using the bare paths.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api", handlers::routes())
        .merge(handlers::routes())
        .merge(handlers::system::routes())
}
