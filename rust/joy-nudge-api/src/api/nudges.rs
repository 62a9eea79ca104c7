//! Nudge catalogue and likes.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;

use super::{ApiError, ApiResponse};
use crate::AppState;
use crate::database::{NudgeRepository, PreferenceRepository};
use crate::domain::{Nudge, NudgeLike};
use crate::gateway::AuthenticatedUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/nudges", get(list_nudges))
        .route("/api/v1/nudges/{nudge_id}", get(get_nudge))
        .route(
            "/api/v1/nudges/{nudge_id}/like",
            post(like_nudge).delete(unlike_nudge),
        )
        .route("/api/v1/likes", get(list_likes))
}

/// A nudge the caller is allowed to see, or 404.
pub(crate) async fn visible_nudge(
    state: &AppState,
    user_id: &str,
    nudge_id: &str,
) -> Result<Nudge, ApiError> {
    state
        .database
        .get_nudge(nudge_id)
        .await?
        .filter(|nudge| nudge.is_visible_to(user_id))
        .ok_or_else(|| ApiError::NotFound("Nudge not found".into()))
}

async fn list_nudges(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<Nudge>>>, ApiError> {
    let nudges = state.database.list_nudges(&user.user_id).await?;
    tracing::debug!(
        "📋 Listed nudges - user_id={}, count={}",
        user.user_id,
        nudges.len()
    );
    Ok(ApiResponse::ok(nudges))
}

async fn get_nudge(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(nudge_id): Path<String>,
) -> Result<Json<ApiResponse<Nudge>>, ApiError> {
    let nudge = visible_nudge(&state, &user.user_id, &nudge_id).await?;
    Ok(ApiResponse::ok(nudge))
}

async fn like_nudge(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(nudge_id): Path<String>,
) -> Result<Json<ApiResponse<NudgeLike>>, ApiError> {
    visible_nudge(&state, &user.user_id, &nudge_id).await?;
    let like = state.database.like_nudge(&user.user_id, &nudge_id).await?;
    tracing::info!("💛 Nudge liked - user_id={}, nudge_id={}", user.user_id, nudge_id);
    Ok(ApiResponse::ok(like))
}

#[derive(Debug, Serialize)]
pub struct Unliked {
    pub removed: bool,
}

async fn unlike_nudge(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(nudge_id): Path<String>,
) -> Result<Json<ApiResponse<Unliked>>, ApiError> {
    let removed = state.database.unlike_nudge(&user.user_id, &nudge_id).await?;
    Ok(ApiResponse::ok(Unliked { removed }))
}

async fn list_likes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let ids = state.database.liked_nudge_ids(&user.user_id).await?;
    Ok(ApiResponse::ok(ids))
}
