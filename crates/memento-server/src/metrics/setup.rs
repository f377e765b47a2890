//! Metrics setup and initialization.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

use super::{cache::register_cache_metrics, http::register_http_metrics};

/// Inicializa el sistema de metricas y retorna el handle para el endpoint.
///
/// Installs the global recorder, so it must run once per process.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets(&[
            0.0001, // 100 microsegundos
            0.0005, // 500 microsegundos
            0.001,  // 1 milisegundo
            0.005,  // 5 milisegundos
            0.01,   // 10 milisegundos
            0.05,   // 50 milisegundos
            0.1,    // 100 milisegundos
            0.5,    // 500 milisegundos
            1.0,    // 1 segundo
            5.0,    // 5 segundos
        ])?
        .install_recorder()?;

    register_cache_metrics();
    register_http_metrics();

    info!("Metrics system initialized");
    Ok(handle)
}

/// Crea un handle sin instalar el recorder global (tests y routers embebidos).
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
