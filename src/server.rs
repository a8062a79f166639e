use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    catalog::PriceSource,
    config::Config,
    handlers::{self, AppState},
    metrics,
    session::SessionStore,
};

/// Start the CareCompare server
///
/// This function:
/// 1. Initializes metrics
/// 2. Resolves the hospital price source
/// 3. Creates the Axum application and the session cleanup sweep
/// 4. Binds to the configured address
/// 5. Serves requests until Ctrl-C, then drains connections
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics());

    let catalog = Arc::new(PriceSource::from_config(&config.catalog)?);

    let app_state = AppState {
        config: Arc::new(config.clone()),
        catalog,
        sessions: Arc::new(SessionStore::new()),
    };

    // Expired search sessions are swept in the background so the store
    // stays bounded under anonymous traffic.
    tokio::spawn(app_state.sessions.clone().cleanup_loop());

    let app = create_router(app_state.clone(), metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting CareCompare on {}", addr);
    info!(
        "Catalog: {} hospitals in {}",
        app_state.catalog.catalog()?.hospitals().len(),
        app_state.catalog.city()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(
    app_state: AppState,
    metrics_handle: Arc<metrics_exporter_prometheus::PrometheusHandle>,
) -> Router {
    let api_routes = Router::new()
        .route("/api/hospitals", get(handlers::lookup::lookup_hospitals))
        .route("/api/compare", get(handlers::compare::compare_prices))
        .route("/api/session/:id", get(handlers::session::session_state))
        .route("/api/risk-assessment", post(handlers::risk::assess_risk))
        .route(
            "/api/recommendations",
            get(handlers::recommend::recommendations_get)
                .post(handlers::recommend::recommendations_post),
        )
        .with_state(app_state.clone());

    let mut router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    if app_state.config.metrics.enabled {
        router = router.route(
            &app_state.config.metrics.endpoint,
            get(handlers::metrics_handler::metrics).with_state(metrics_handle),
        );
    }

    router
        .merge(api_routes)
        // Request bodies are small JSON documents; 1MB is generous.
        .layer(DefaultBodyLimit::max(1024 * 1024))
        // The browser SPA calls these endpoints cross-origin in development.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
