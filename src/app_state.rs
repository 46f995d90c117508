//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::BadgeService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Badge service for all business logic.
    pub badge_service: Arc<BadgeService>,
}

impl AppState {
    /// Wraps a service for sharing across handlers.
    #[must_use]
    pub fn new(badge_service: BadgeService) -> Self {
        Self {
            badge_service: Arc::new(badge_service),
        }
    }
}
