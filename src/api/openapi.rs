//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::handlers::{badge, system};

/// Generated OpenAPI description, served at `/api-docs/openapi.json` when
/// the `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "badge-admin",
        description = "Timer badge administration with a storefront metafield mirror."
    ),
    paths(
        badge::create_badge,
        badge::list_badges,
        badge::get_badge,
        badge::update_badge,
        badge::delete_badge,
        system::health_handler,
        system::badge_options_handler,
    ),
    tags(
        (name = "Badges", description = "Timer badge CRUD"),
        (name = "System", description = "Health and editor configuration"),
    )
)]
pub struct ApiDoc;
