//! Profile, avatar, tutorial flag, garden and achievements.

use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResponse, JsonBody};
use crate::AppState;
use crate::database::{ActivityRepository, UserRepository};
use crate::domain::UserProfile;
use crate::domain::garden::{self, Achievement, GardenView};
use crate::gateway::AuthenticatedUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/me", get(get_profile))
        .route("/api/v1/me/avatar", put(set_avatar))
        .route("/api/v1/me/tutorial", put(mark_tutorial_seen))
        .route("/api/v1/garden", get(get_garden))
        .route("/api/v1/achievements", get(get_achievements))
}

async fn load_profile(state: &AppState, user_id: &str) -> Result<UserProfile, ApiError> {
    state
        .database
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User profile not found".into()))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let profile = load_profile(&state, &user.user_id).await?;
    Ok(ApiResponse::ok(profile))
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
pub struct Updated {
    pub updated: bool,
}

async fn set_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody<AvatarRequest>,
) -> Result<Json<ApiResponse<Updated>>, ApiError> {
    let url = body.avatar_url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ApiError::BadRequest(
            "avatar_url must be an http(s) URL".into(),
        ));
    }

    let updated = state.database.set_avatar(&user.user_id, url).await?;
    tracing::info!("🖼️ Avatar updated - user_id={}", user.user_id);
    Ok(ApiResponse::ok(Updated { updated }))
}

async fn mark_tutorial_seen(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Updated>>, ApiError> {
    let updated = state.database.mark_tutorial_seen(&user.user_id).await?;
    Ok(ApiResponse::ok(Updated { updated }))
}

async fn get_garden(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<GardenView>>, ApiError> {
    let total = state.database.count_completions(&user.user_id).await?;
    Ok(ApiResponse::ok(garden::garden_for(total)))
}

async fn get_achievements(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<Achievement>>>, ApiError> {
    let profile = load_profile(&state, &user.user_id).await?;
    let stats = state.database.activity_stats(&user.user_id).await?;
    Ok(ApiResponse::ok(garden::achievements_for(
        &stats,
        profile.longest_streak_days,
    )))
}
