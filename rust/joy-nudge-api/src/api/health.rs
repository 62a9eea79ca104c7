//! Health check endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    status: &'static str,
    database: &'static str,
    llm_provider: &'static str,
    llm_configured: bool,
}

/// Reports the storage backend and whether generation can reach a provider.
async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let settings = state.generator.settings();
    Json(ReadinessResponse {
        status: "ready",
        database: state.database.backend_name(),
        llm_provider: settings.provider.as_str(),
        llm_configured: settings.api_key.as_ref().is_some_and(|k| !k.is_empty()),
    })
}
