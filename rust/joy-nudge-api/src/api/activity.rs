//! Append-only activity: completions, reflections, focus sessions, moods,
//! plus nudge schedules.

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use super::nudges::visible_nudge;
use super::{ApiError, ApiResponse, JsonBody, ListParams};
use crate::AppState;
use crate::database::{ActivityRepository, PreferenceRepository};
use crate::domain::{
    FocusSession, FocusSessionType, MoodLog, NewCompletion, NewFocusSession, NewMoodLog,
    NewReflection, NewUserNudge, NudgeCompletion, Reflection, ScheduleFrequency, UserNudge,
};
use crate::gateway::AuthenticatedUser;

const MAX_MOOD_CHARS: usize = 64;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/completions",
            post(record_completion).get(list_completions),
        )
        .route(
            "/api/v1/reflections",
            post(add_reflection).get(list_reflections),
        )
        .route(
            "/api/v1/focus-sessions",
            post(record_focus_session).get(list_focus_sessions),
        )
        .route("/api/v1/moods", post(log_mood))
        .route("/api/v1/schedules", post(create_schedule).get(list_schedules))
}

/// Trimmed, non-empty text or a 400 naming the field.
fn required_text(value: &str, field: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub nudge_id: String,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub mood_at_completion: Option<String>,
}

async fn record_completion(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody<CompletionRequest>,
) -> Result<Json<ApiResponse<NudgeCompletion>>, ApiError> {
    let nudge = visible_nudge(&state, &user.user_id, &body.nudge_id).await?;

    let completion = state
        .database
        .record_completion(&NewCompletion {
            user_id: user.user_id.clone(),
            nudge_id: nudge.id,
            duration_seconds: body.duration_seconds,
            mood_at_completion: optional_text(body.mood_at_completion),
        })
        .await?;

    tracing::info!(
        "✅ Completion recorded - user_id={}, nudge_id={}, category={}",
        user.user_id,
        completion.nudge_id,
        nudge.category
    );
    Ok(ApiResponse::ok(completion))
}

async fn list_completions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<NudgeCompletion>>>, ApiError> {
    let completions = state
        .database
        .list_completions(&user.user_id, params.limit())
        .await?;
    Ok(ApiResponse::ok(completions))
}

#[derive(Debug, Deserialize)]
pub struct ReflectionRequest {
    pub content: String,
    #[serde(default)]
    pub completion_id: Option<String>,
}

async fn add_reflection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody<ReflectionRequest>,
) -> Result<Json<ApiResponse<Reflection>>, ApiError> {
    let content = required_text(&body.content, "content")?;
    let completion_id = optional_text(body.completion_id);
    if let Some(id) = &completion_id {
        if !state.database.owns_completion(&user.user_id, id).await? {
            tracing::warn!(
                "⚠️ Reflection references foreign completion - user_id={}, completion_id={}",
                user.user_id,
                id
            );
            return Err(ApiError::BadRequest("Unknown completion_id".into()));
        }
    }

    let reflection = state
        .database
        .add_reflection(&NewReflection {
            user_id: user.user_id.clone(),
            completion_id,
            content,
        })
        .await?;

    tracing::info!("📝 Reflection saved - user_id={}", user.user_id);
    Ok(ApiResponse::ok(reflection))
}

async fn list_reflections(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Reflection>>>, ApiError> {
    let reflections = state
        .database
        .list_reflections(&user.user_id, params.limit())
        .await?;
    Ok(ApiResponse::ok(reflections))
}

#[derive(Debug, Deserialize)]
pub struct FocusSessionRequest {
    pub duration_minutes: u32,
    #[serde(default)]
    pub break_minutes: u32,
    #[serde(default = "default_session_type")]
    pub session_type: FocusSessionType,
}

fn default_session_type() -> FocusSessionType {
    FocusSessionType::Focus
}

async fn record_focus_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody<FocusSessionRequest>,
) -> Result<Json<ApiResponse<FocusSession>>, ApiError> {
    if body.duration_minutes == 0 {
        return Err(ApiError::BadRequest(
            "duration_minutes must be greater than zero".into(),
        ));
    }

    let session = state
        .database
        .record_focus_session(&NewFocusSession {
            user_id: user.user_id.clone(),
            duration_minutes: body.duration_minutes,
            break_minutes: body.break_minutes,
            session_type: body.session_type,
        })
        .await?;

    tracing::info!(
        "⏱️ Focus session recorded - user_id={}, type={}, minutes={}",
        user.user_id,
        session.session_type,
        session.duration_minutes
    );
    Ok(ApiResponse::ok(session))
}

async fn list_focus_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<FocusSession>>>, ApiError> {
    let sessions = state
        .database
        .list_focus_sessions(&user.user_id, params.limit())
        .await?;
    Ok(ApiResponse::ok(sessions))
}

#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub mood: String,
    /// Defaults to today (UTC).
    #[serde(default)]
    pub logged_on: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

async fn log_mood(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody<MoodRequest>,
) -> Result<Json<ApiResponse<MoodLog>>, ApiError> {
    let mood = required_text(&body.mood, "mood")?;
    if mood.chars().count() > MAX_MOOD_CHARS {
        return Err(ApiError::BadRequest(format!(
            "mood must be at most {MAX_MOOD_CHARS} characters"
        )));
    }

    let entry = state
        .database
        .log_mood(&NewMoodLog {
            user_id: user.user_id.clone(),
            mood,
            logged_on: body.logged_on.unwrap_or_else(|| Utc::now().date_naive()),
            note: optional_text(body.note),
        })
        .await?;
    Ok(ApiResponse::ok(entry))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub nudge_id: String,
    #[serde(default = "default_frequency")]
    pub frequency: ScheduleFrequency,
    /// Local times as `HH:MM`.
    #[serde(default)]
    pub scheduled_times: Vec<String>,
}

fn default_frequency() -> ScheduleFrequency {
    ScheduleFrequency::Daily
}

/// Normalize `HH:MM` strings, rejecting anything else.
fn parse_times(times: &[String]) -> Result<Vec<String>, ApiError> {
    times
        .iter()
        .map(|raw| {
            NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .map(|t| t.format("%H:%M").to_string())
                .map_err(|e| ApiError::BadRequest(format!("invalid scheduled time {raw:?}: {e}")))
        })
        .collect()
}

async fn create_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody<ScheduleRequest>,
) -> Result<Json<ApiResponse<UserNudge>>, ApiError> {
    let scheduled_times = parse_times(&body.scheduled_times)?;
    let nudge = visible_nudge(&state, &user.user_id, &body.nudge_id).await?;

    let schedule = state
        .database
        .create_schedule(&NewUserNudge {
            user_id: user.user_id.clone(),
            nudge_id: nudge.id,
            frequency: body.frequency,
            scheduled_times,
        })
        .await?;

    tracing::info!(
        "📅 Schedule created - user_id={}, nudge_id={}, frequency={}",
        user.user_id,
        schedule.nudge_id,
        schedule.frequency.as_str()
    );
    Ok(ApiResponse::ok(schedule))
}

async fn list_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<UserNudge>>>, ApiError> {
    let schedules = state.database.list_schedules(&user.user_id).await?;
    Ok(ApiResponse::ok(schedules))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_times_normalizes() {
        let times = parse_times(&["7:05".to_string(), " 21:30 ".to_string()]).unwrap();
        assert_eq!(times, vec!["07:05", "21:30"]);
    }

    #[test]
    fn test_parse_times_rejects_garbage() {
        assert!(parse_times(&["25:00".to_string()]).is_err());
        assert!(parse_times(&["noon".to_string()]).is_err());
    }
}
