//! HTTP API endpoints.
//!
//! - [`functions`]: `update-streak` and `generate-nudge`
//! - [`profile`], [`nudges`], [`activity`], [`audio`]: the data the client
//!   screens read and write
//! - [`health`]: unauthenticated liveness and readiness

pub mod activity;
pub mod audio;
pub mod error;
pub mod functions;
pub mod health;
pub mod nudges;
pub mod profile;

use axum::Router;
use serde::{Deserialize, Serialize};

use crate::AppState;

pub use error::{ApiError, JsonBody};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 200;

/// Create the API router. Authentication is layered on by the server.
pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(functions::router(state))
        .merge(profile::router())
        .merge(nudges::router())
        .merge(activity::router())
        .merge(audio::router())
}

/// Success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> axum::Json<Self> {
        axum::Json(Self {
            success: true,
            data,
        })
    }
}

/// `?limit=` for list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

impl ListParams {
    pub fn limit(self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_limit_is_clamped() {
        assert_eq!(ListParams::default().limit(), 50);
        assert_eq!(ListParams { limit: Some(0) }.limit(), 1);
        assert_eq!(ListParams { limit: Some(10_000) }.limit(), 200);
    }
}
