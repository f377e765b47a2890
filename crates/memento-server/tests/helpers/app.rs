//! Routers wired with cached test routes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{Json, Router, extract::Path, http::Method, http::StatusCode};
use memento_server::cache::{CacheService, RouteCacheConfig, RouterCacheExt};
use memento_server::metrics::detached_handle;
use memento_server::{AppState, create_router_with_state};
use serde_json::json;

use super::client::TestClient;

/// Time each counted handler call takes.
pub const HANDLER_DELAY: Duration = Duration::from_millis(150);

/// Full router around an application router.
pub fn router_with(cache: CacheService, app: Router) -> Router {
    create_router_with_state(AppState::new(cache), detached_handle(), app)
}

/// Full router with no application routes.
pub fn full_router(cache: CacheService) -> Router {
    router_with(cache, Router::new())
}

/// A router whose cached handlers count their invocations.
///
/// - `GET /items/{id}` answers `{"id", "call"}` after [`HANDLER_DELAY`]
/// - `GET /status/{code}` answers with the given status code
pub struct CountingApp {
    pub client: TestClient,
    pub cache: CacheService,
    calls: Arc<AtomicUsize>,
}

impl CountingApp {
    /// Number of handler invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn counting_app(cache: CacheService, config: RouteCacheConfig) -> CountingApp {
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let items = move |Path(id): Path<String>| {
        let counter = counter.clone();
        async move {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(HANDLER_DELAY).await;
            Json(json!({"id": id, "call": call}))
        }
    };

    let counter = calls.clone();
    let status = move |Path(code): Path<u16>| {
        let counter = counter.clone();
        async move {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::OK);
            (status, Json(json!({"code": code, "call": call})))
        }
    };

    let app = Router::new()
        .cached_route(Method::GET, "/items/{id}", items, config.clone(), &cache)
        .expect("valid cache config")
        .cached_route(Method::GET, "/status/{code}", status, config, &cache)
        .expect("valid cache config");

    CountingApp {
        client: TestClient::new(router_with(cache.clone(), app)),
        cache,
        calls,
    }
}
