use axum::{routing::get, Router};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::cache::{CacheGateway, FileStore, MemoryStore, SnapshotStore};
use crate::feed::HttpFeed;
use crate::geocode::NominatimGeocoder;
use crate::service::IssService;

use super::api::ephemeris as ephemeris_handlers;
use super::api_doc::ApiDoc;
use super::config::{CacheBackend, Config};
use super::state::AppState;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid cache TTL: {0}")]
    Ttl(#[from] chrono::OutOfRangeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wire the service from its configured collaborators.
pub fn build_service(config: &Config) -> Result<IssService, ServerError> {
    let feed = HttpFeed::new(config.feed.url.clone(), config.feed.timeout)?;

    let store: Arc<dyn SnapshotStore> = match config.cache.backend {
        CacheBackend::File => Arc::new(FileStore::new(config.cache.folder.clone())),
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
    };
    let ttl = chrono::Duration::from_std(config.cache.ttl)?;

    let geocoder = NominatimGeocoder::new(
        config.geocoder.url.clone(),
        &config.geocoder.user_agent,
        config.geocoder.timeout,
    )?;

    let gateway = CacheGateway::new(Arc::new(feed), store, ttl);
    Ok(IssService::new(gateway, Arc::new(geocoder)))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/header", get(ephemeris_handlers::header))
        .route("/metadata", get(ephemeris_handlers::metadata))
        .route("/comment", get(ephemeris_handlers::comments))
        .route("/epochs", get(ephemeris_handlers::list_epochs))
        .route("/epochs/{epoch}", get(ephemeris_handlers::get_epoch))
        .route("/epochs/{epoch}/speed", get(ephemeris_handlers::get_speed))
        .route(
            "/epochs/{epoch}/location",
            get(ephemeris_handlers::get_location),
        )
        .route("/now", get(ephemeris_handlers::now))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();

    let service = build_service(&config)?;
    log::info!(
        "Serving ISS feed {} (cache {:?}, ttl {})",
        config.feed.url,
        config.cache.backend,
        humantime::format_duration(config.cache.ttl)
    );

    let state = AppState {
        service: Arc::new(service),
    };
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
