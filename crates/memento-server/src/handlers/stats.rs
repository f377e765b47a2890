//! Cache statistics endpoint handler.

use axum::{Json, extract::State};
use memento_core::CacheStats;

use crate::state::AppState;

/// GET /cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache().stats())
}
