//! Joy Nudge API
//!
//! Backend for the Joy Nudge wellness app: daily streak tracking,
//! personalized AI nudge generation and the per-user data the client
//! screens read and write.
//!
//! # Architecture
//!
//! - [`config`]: layered configuration and startup validation
//! - [`gateway`]: bearer-token authentication and per-user rate limiting
//! - [`domain`]: data types and the pure policies (streaks, garden,
//!   personalization)
//! - [`database`]: repository traits over SQLite and an in-memory store
//! - [`llm`]: provider drivers (Gemini, OpenAI-compatible, Anthropic)
//! - [`nudge`]: prompt construction, strict draft parsing, coercion and
//!   fallback templates
//! - [`api`]: HTTP endpoints
//!
//! # Example
//!
//! ```rust,ignore
//! use joy_nudge_api::{config::AppConfig, server::create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let app = create_app(config).await?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod database;
pub mod domain;
pub mod gateway;
pub mod llm;
pub mod logging;
pub mod nudge;
pub mod server;

use std::sync::Arc;

use config::AppConfig;
use database::Database;
use gateway::UserRateLimiters;
use nudge::NudgeGenerator;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: Database,
    pub generator: Arc<NudgeGenerator>,
    /// Guards `generate-nudge`.
    pub rate_limiters: Arc<UserRateLimiters>,
}

impl AppState {
    pub fn new(config: AppConfig, database: Database, generator: Arc<NudgeGenerator>) -> Self {
        let rate_limiters = Arc::new(UserRateLimiters::new(
            config.gateway.rate_limit_per_minute,
            config.gateway.rate_limit_burst,
        ));

        Self {
            config: Arc::new(config),
            database,
            generator,
            rate_limiters,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"AppConfig")
            .field("database", &self.database)
            .field("generator", &self.generator)
            .field("rate_limiters", &self.rate_limiters)
            .finish()
    }
}
