//! Audio preferences.

use axum::{Extension, Json, Router, extract::State, routing::get};
use chrono::Utc;

use super::{ApiError, ApiResponse, JsonBody};
use crate::AppState;
use crate::database::PreferenceRepository;
use crate::domain::{AudioSettings, AudioSettingsPatch};
use crate::gateway::AuthenticatedUser;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/v1/audio-settings",
        get(get_audio_settings).put(update_audio_settings),
    )
}

/// Stored settings, or the defaults if the user never saved any.
async fn current_settings(state: &AppState, user_id: &str) -> Result<AudioSettings, ApiError> {
    Ok(state
        .database
        .get_audio_settings(user_id)
        .await?
        .unwrap_or_else(|| AudioSettings::defaults_for(user_id, Utc::now())))
}

async fn get_audio_settings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<AudioSettings>>, ApiError> {
    let settings = current_settings(&state, &user.user_id).await?;
    Ok(ApiResponse::ok(settings))
}

/// Merge a partial update and write it back. Last write wins.
async fn update_audio_settings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(patch): JsonBody<AudioSettingsPatch>,
) -> Result<Json<ApiResponse<AudioSettings>>, ApiError> {
    let mut settings = current_settings(&state, &user.user_id).await?;
    settings.apply(&patch, Utc::now());
    state.database.upsert_audio_settings(&settings).await?;

    tracing::info!(
        "🔊 Audio settings saved - user_id={}, volume={:.2}, sounds={}",
        user.user_id,
        settings.master_volume,
        settings.sounds_enabled
    );
    Ok(ApiResponse::ok(settings))
}
