//! badge-admin server entry point.
//!
//! Starts the Axum HTTP server with the badge REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use badge_admin::api;
use badge_admin::app_state::AppState;
use badge_admin::config::AppConfig;
use badge_admin::mirror::{
    CredentialSource, MetafieldClient, MirrorSync, ShopifyMetafieldClient, StaticCredentials,
};
use badge_admin::persistence::{BadgeStore, MemoryBadgeStore, PostgresBadgeStore};
use badge_admin::service::BadgeService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env().context("invalid LISTEN_ADDR")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting badge-admin");

    // Build persistence layer
    let store: Arc<dyn BadgeStore> = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("connecting to PostgreSQL")?;
        let store = PostgresBadgeStore::new(pool);
        store.migrate().await.context("running migrations")?;
        tracing::info!("using PostgreSQL badge store");
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled, badges are kept in memory only");
        Arc::new(MemoryBadgeStore::new())
    };

    // Build service layer
    let mut service = BadgeService::new(store);
    if config.mirror.enabled {
        service = service.with_mirror(Arc::new(build_mirror(&config)?));
    } else {
        tracing::info!("metafield mirror disabled");
    }

    // Build application state
    let app_state = AppState::new(service);

    // Build router
    let app = Router::new().merge(api::build_router());

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::openapi::ApiDoc::openapi()),
        )
    };

    let app = app
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_mirror(config: &AppConfig) -> anyhow::Result<MirrorSync> {
    let client: Arc<dyn MetafieldClient> = Arc::new(
        ShopifyMetafieldClient::new(
            config.shopify.api_version.clone(),
            config.mirror.location(),
            Duration::from_secs(config.shopify.request_timeout_secs),
        )
        .context("building Shopify client")?,
    );

    let credentials = match (&config.shopify.shop, &config.shopify.access_token) {
        (Some(shop), Some(token)) => StaticCredentials::new().with_shop(shop.clone(), token.clone()),
        _ => StaticCredentials::new(),
    };
    if config.shopify.access_token.is_none() {
        tracing::warn!("SHOPIFY_ACCESS_TOKEN not set, mirror writes will be skipped");
    } else if credentials.is_empty() {
        tracing::warn!(
            shop = ?config.shopify.shop,
            "SHOPIFY_SHOP is not a myshopify.com domain, mirror writes will be skipped"
        );
    }
    let credentials: Arc<dyn CredentialSource> = Arc::new(credentials);

    tracing::info!(
        namespace = %config.mirror.namespace,
        key = %config.mirror.key,
        default_shop = ?config.shopify.shop,
        deadline_ms = u64::try_from(config.mirror_deadline().as_millis()).unwrap_or(u64::MAX),
        "metafield mirror enabled"
    );

    Ok(MirrorSync::new(client, credentials)
        .with_default_shop(config.shopify.shop.clone())
        .with_installation_id(config.shopify.installation_id.clone())
        .with_policy(config.mirror.retry_policy())
        .with_deadline(config.mirror_deadline()))
}
