//! Demo route served through the response cache.

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query},
};
use serde::{Deserialize, Serialize};

/// Simulated cost of computing a greeting.
pub const DEMO_LATENCY: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
pub struct GreetingQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Greeting {
    pub message: String,
    /// Epoch millis when the greeting was computed.
    pub computed_at: u128,
}

/// GET /demo/{name}
pub async fn greet(Path(name): Path<String>, Query(query): Query<GreetingQuery>) -> Json<Greeting> {
    tokio::time::sleep(DEMO_LATENCY).await;

    let message = match query.lang.as_deref() {
        Some("es") => format!("Hola, {}!", name),
        Some("fr") => format!("Bonjour, {}!", name),
        _ => format!("Hello, {}!", name),
    };

    let computed_at = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    Json(Greeting {
        message,
        computed_at,
    })
}
