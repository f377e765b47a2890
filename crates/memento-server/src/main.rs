//! Memento Server binary.

use std::sync::Arc;

use anyhow::Context;
use axum::{Router, http::Method};
use memento_providers::{CacheProvider, MemoryProvider, RedisProvider, RedisProviderConfig};
use memento_server::cache::{CacheService, RouteCacheConfig, RouterCacheExt};
use memento_server::handlers::demo::greet;
use memento_server::metrics::init_metrics;
use memento_server::{AppState, ProviderKind, Settings, run_server_with_state};
use memento_core::{IncludeRule, IncludeSpec};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    let addr = settings.addr()?;

    tracing::info!(
        "Starting Memento Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Cache provider: {:?}", settings.cache.provider);

    let provider: Arc<dyn CacheProvider> = match settings.cache.provider {
        ProviderKind::Memory => Arc::new(MemoryProvider::new()),
        ProviderKind::Redis => {
            let url = settings.cache.redis_url.clone().unwrap_or_default();
            let config = RedisProviderConfig::new(url)
                .with_key_prefix(settings.cache.redis_key_prefix.clone());
            let provider = RedisProvider::connect(config)
                .await
                .context("failed to connect to redis")?;
            Arc::new(provider)
        },
    };

    let cache = CacheService::new(provider, settings.cache.service_options());
    let prometheus_handle = init_metrics().context("failed to install metrics recorder")?;

    let app = Router::new().cached_route(
        Method::GET,
        "/demo/{name}",
        greet,
        RouteCacheConfig::new()
            .ttl(settings.cache.default_ttl_seconds)
            .tags(["demo"])
            .include(IncludeSpec {
                query: Some(IncludeRule::Fields(vec!["lang".to_string()])),
                ..Default::default()
            }),
        &cache,
    )?;

    let state = AppState::new(cache.clone());
    let served = run_server_with_state(addr, state, prometheus_handle, app).await;

    cache.disconnect().await;
    tracing::info!("Cache provider disconnected");

    served?;
    Ok(())
}
