//! HTTP server setup and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::config::AppConfig;
use crate::database::{self, Database};
use crate::gateway;
use crate::llm::providers::create_driver;
use crate::logging::OpTimer;
use crate::nudge::NudgeGenerator;
use crate::{AppState, log_banner, log_init_step, log_init_warning, log_success};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the database, LLM driver and generator from configuration, then
/// the router.
pub async fn create_app(config: AppConfig) -> anyhow::Result<Router> {
    let overall_timer = OpTimer::new("server", "create_app");

    log_banner!(
        format!("🌱 Joy Nudge API v{VERSION}"),
        format!(
            "Database: {:?} | LLM: {} ({})",
            config.database.driver,
            config.llm.provider.as_str(),
            config.llm.model
        )
    );

    // [1/3] Database
    let step_timer = OpTimer::new("server", "database");
    let database = database::create_database(&config.database).await;
    step_timer.finish_with_result(database.as_ref());
    let database = database?;
    log_init_step!(
        1,
        3,
        "Database",
        format!("🗄️  {} ({})", database.backend_name(), config.database.path)
    );

    // [2/3] LLM driver
    let step_timer = OpTimer::new("server", "llm_driver");
    let settings = config.llm.settings(&config.providers);
    if settings.api_key.as_ref().is_none_or(|k| k.is_empty()) {
        log_init_warning!(
            "No API key configured for provider {}. Nudge generation will fail.",
            settings.provider.as_str()
        );
    }
    let detail = format!("🤖 {} ({})", settings.provider.as_str(), settings.model);
    let driver = create_driver(settings)?;
    log_init_step!(2, 3, "LLM Driver", detail);
    step_timer.finish();

    let generator = Arc::new(NudgeGenerator::new(driver));
    let state = AppState::new(config, database, generator);

    // [3/3] Router
    let app = build_router(state);
    log_init_step!(3, 3, "Router", "🌐 Routes + middleware configured");

    overall_timer.finish();
    log_success!("Joy Nudge API server created successfully");

    Ok(app)
}

/// Routes and middleware around an existing state.
///
/// CORS is outermost so preflight requests never reach authentication.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.timeout_secs);

    api::create_router(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            gateway::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// In-memory store, seeded, for tests and local tooling.
pub async fn in_memory_database() -> anyhow::Result<Database> {
    let database = Database::in_memory();
    database.seed_catalogue().await?;
    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseDriver;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.driver = DatabaseDriver::Memory;
        config.gateway.jwt_secret = Some("server-test-secret".into());
        config
    }

    #[tokio::test]
    async fn test_create_app_without_llm_key() {
        let app = create_app(memory_config()).await.unwrap();

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/api/v1/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
