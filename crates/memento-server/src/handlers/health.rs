use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Nombre del provider de cache activo
    pub provider: String,
}

impl HealthResponse {
    pub fn up(provider: impl Into<String>) -> Self {
        Self {
            status: "UP".to_string(),
            provider: provider.into(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::up(state.cache().provider().name()))
}
