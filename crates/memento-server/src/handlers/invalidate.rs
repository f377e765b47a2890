//! Cache invalidation endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Response para operaciones de invalidacion.
#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    /// Numero de entries invalidadas.
    pub invalidated: u64,
    /// Mensaje descriptivo.
    pub message: String,
}

/// Request body para invalidacion por tags.
#[derive(Debug, Deserialize)]
pub struct InvalidateTagsRequest {
    pub tags: Vec<String>,
}

/// Request body para invalidacion por patron glob.
#[derive(Debug, Deserialize)]
pub struct InvalidatePatternRequest {
    pub pattern: String,
}

/// POST /cache/invalidate/tags
/// Invalida todas las entries registradas bajo los tags.
#[instrument(skip_all, fields(tags = ?request.tags))]
pub async fn invalidate_tags(
    State(state): State<AppState>,
    Json(request): Json<InvalidateTagsRequest>,
) -> Result<Response, AppError> {
    if request.tags.is_empty() || request.tags.iter().any(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "Tags must be a non-empty list of non-blank names".to_string(),
        ));
    }

    let count = state.cache().invalidate(&request.tags).await;

    Ok((
        StatusCode::OK,
        Json(InvalidateResponse {
            invalidated: count,
            message: format!(
                "Invalidated {} cache entries for tags {:?}",
                count, request.tags
            ),
        }),
    )
        .into_response())
}

/// POST /cache/invalidate/pattern
/// Invalida entries usando un patron glob.
#[instrument(skip_all, fields(pattern = %request.pattern))]
pub async fn invalidate_pattern(
    State(state): State<AppState>,
    Json(request): Json<InvalidatePatternRequest>,
) -> Result<Response, AppError> {
    if request.pattern.trim().is_empty() {
        return Err(AppError::BadRequest("Pattern cannot be empty".to_string()));
    }

    let count = state.cache().invalidate_pattern(&request.pattern).await;

    Ok((
        StatusCode::OK,
        Json(InvalidateResponse {
            invalidated: count,
            message: format!(
                "Invalidated {} cache entries matching '{}'",
                count, request.pattern
            ),
        }),
    )
        .into_response())
}

/// DELETE /cache/keys/{key}
/// Invalida una entry especifica.
#[instrument(skip_all, fields(key = %key))]
pub async fn invalidate_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    if !state.cache().invalidate_key(&key).await {
        return Err(AppError::NotFound(format!("Cache key '{}'", key)));
    }

    Ok((
        StatusCode::OK,
        Json(InvalidateResponse {
            invalidated: 1,
            message: format!("Invalidated cache key '{}'", key),
        }),
    )
        .into_response())
}
