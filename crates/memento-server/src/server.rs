use std::net::SocketAddr;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;

use crate::handlers::{
    health::health_check,
    invalidate::{invalidate_key, invalidate_pattern, invalidate_tags},
    metrics::metrics_handler,
    stats::cache_stats,
};
use crate::middleware::{LoggingLayer, RequestIdLayer};
use crate::state::AppState;

/// Router with the health and cache administration endpoints.
pub fn admin_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/invalidate/tags", post(invalidate_tags))
        .route("/cache/invalidate/pattern", post(invalidate_pattern))
        .route("/cache/keys/{key}", delete(invalidate_key))
        .with_state(state)
}

/// Creates the full router: application routes, admin routes, `/metrics`
/// and the middleware stack.
pub fn create_router_with_state(
    state: AppState,
    prometheus_handle: PrometheusHandle,
    app: Router,
) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(LoggingLayer);

    // Router for metrics endpoint (different state)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    Router::new()
        .merge(app)
        .merge(admin_router(state))
        .merge(metrics_router)
        // HTTP metrics middleware
        .layer(middleware::from_fn(
            crate::metrics::http::http_metrics_middleware,
        ))
        .layer(middleware_stack)
}

/// Runs the server until a shutdown signal arrives.
pub async fn run_server_with_state(
    addr: SocketAddr,
    state: AppState,
    prometheus_handle: PrometheusHandle,
    app: Router,
) -> Result<(), std::io::Error> {
    let router = create_router_with_state(state, prometheus_handle, app);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
