//! The two server-side functions: streak update and nudge generation.

use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::State,
    middleware,
    routing::post,
};
use chrono::Utc;
use serde::Serialize;

use super::error::ApiError;
use crate::AppState;
use crate::database::UserRepository;
use crate::domain::StreakUpdate;
use crate::domain::streak::{self, StreakOutcome};
use crate::gateway::{AuthenticatedUser, user_rate_limit_middleware};
use crate::nudge::{GenerateNudgeRequest, GeneratedNudge};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/functions/v1/update-streak", post(update_streak))
        .route(
            "/functions/v1/generate-nudge",
            post(generate_nudge)
                .route_layer(middleware::from_fn_with_state(state, user_rate_limit_middleware)),
        )
}

#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub success: bool,
    pub streak: StreakOutcome,
}

/// Apply today's visit to the caller's streak.
async fn update_streak(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<StreakResponse>, ApiError> {
    let now = Utc::now();
    let profile = state
        .database
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("User profile not found".into()))?;

    let today = now.date_naive();
    let outcome = streak::advance(&profile.streak_state(), today);

    state
        .database
        .save_streak(
            &user.user_id,
            &StreakUpdate {
                current_streak_days: outcome.current_streak_days,
                longest_streak_days: outcome.longest_streak_days,
                last_update_date: today,
                last_active_at: now,
            },
        )
        .await?;

    tracing::info!(
        "🔥 Streak updated - user_id={}, current={}, longest={}, change={:?}, new_record={}",
        user.user_id,
        outcome.current_streak_days,
        outcome.longest_streak_days,
        outcome.change,
        outcome.is_new_record
    );

    Ok(Json(StreakResponse {
        success: true,
        streak: outcome,
    }))
}

#[derive(Debug, Serialize)]
pub struct GenerateNudgeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub generated: GeneratedNudge,
}

/// Generate one personalized nudge. The body is optional.
async fn generate_nudge(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Bytes,
) -> Result<Json<GenerateNudgeResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateNudgeRequest::default()
    } else {
        serde_json::from_slice::<GenerateNudgeRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?
    };

    tracing::debug!(
        "🪄 Generating nudge - user_id={}, mood={}, context={:?}",
        user.user_id,
        request.mood(),
        request.context
    );

    let generated = state
        .generator
        .generate(&state.database, &user.user_id, &request, Utc::now())
        .await?;

    Ok(Json(GenerateNudgeResponse {
        success: true,
        generated,
    }))
}
