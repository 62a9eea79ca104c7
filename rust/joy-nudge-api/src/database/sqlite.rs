//! SQLite backend.
//!
//! A single connection behind a mutex; every query runs on the blocking
//! pool so the async executor never waits on disk I/O.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::repository::{
    ActivityRepository, NudgeRepository, PreferenceRepository, UserRepository,
};
use super::schema::{SEED_NUDGES, SQLITE_SCHEMA};
use crate::domain::{
    ActivityStats, AudioSettings, CompletionWithNudge, FocusSession, MoodLog, NewCompletion,
    NewFocusSession, NewMoodLog, NewNudge, NewReflection, NewUser, NewUserNudge, Nudge,
    NudgeCompletion, NudgeLike, ParseEnumError, Reflection, StreakUpdate, UserNudge, UserProfile,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

const USER_COLUMNS: &str = "id, email, username, current_streak_days, longest_streak_days, \
     last_streak_update_date, last_active_at, selected_avatar_url, tutorial_seen, \
     subscription_status, created_at";

const NUDGE_COLUMNS: &str = "id, title, description, category, interactive_type, \
     is_ai_generated, duration_seconds, created_by, created_at";

/// SQLite-backed store.
#[derive(Clone)]
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database file and apply the schema.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db_path = path.clone();

        let conn = tokio::task::spawn_blocking(move || -> anyhow::Result<Connection> {
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let conn = Connection::open(&db_path)
                .with_context(|| format!("Failed to open {}", db_path.display()))?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            init_schema(&conn)?;
            Ok(conn)
        })
        .await
        .context("Tokio spawn_blocking failed")??;

        Ok(Self {
            path: Some(path),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Private in-memory SQLite database.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            path: None,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .context("Tokio spawn_blocking failed")?
    }

    pub(crate) async fn seed_catalogue(&self) -> anyhow::Result<usize> {
        let now = Utc::now();
        self.with_conn(move |conn| {
            let existing: i64 = conn.query_row(
                "SELECT COUNT(*) FROM nudges WHERE is_ai_generated = 0",
                [],
                |row| row.get(0),
            )?;
            if existing > 0 {
                return Ok(0);
            }
            for seed in &SEED_NUDGES {
                insert_nudge_row(conn, &seed.to_new_nudge().into_nudge(now))?;
            }
            Ok(SEED_NUDGES.len())
        })
        .await
    }
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SQLITE_SCHEMA)
        .context("Failed to apply SQLite schema")?;
    Ok(())
}

/// Fixed-width so text ordering matches time ordering.
fn ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}

fn get_opt_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}

fn get_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn count_to_u64(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        current_streak_days: row.get(3)?,
        longest_streak_days: row.get(4)?,
        last_streak_update_date: get_opt_date(row, 5)?,
        last_active_at: get_opt_ts(row, 6)?,
        selected_avatar_url: row.get(7)?,
        tutorial_seen: row.get(8)?,
        subscription_status: get_enum(row, 9)?,
        created_at: get_ts(row, 10)?,
    })
}

fn nudge_from_row(row: &Row<'_>) -> rusqlite::Result<Nudge> {
    Ok(Nudge {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: get_enum(row, 3)?,
        interactive_type: get_enum(row, 4)?,
        is_ai_generated: row.get(5)?,
        duration_seconds: row.get(6)?,
        created_by: row.get(7)?,
        created_at: get_ts(row, 8)?,
    })
}

fn completion_from_row(row: &Row<'_>) -> rusqlite::Result<NudgeCompletion> {
    Ok(NudgeCompletion {
        id: row.get(0)?,
        user_id: row.get(1)?,
        nudge_id: row.get(2)?,
        duration_seconds: row.get(3)?,
        mood_at_completion: row.get(4)?,
        completed_at: get_ts(row, 5)?,
    })
}

fn reflection_from_row(row: &Row<'_>) -> rusqlite::Result<Reflection> {
    Ok(Reflection {
        id: row.get(0)?,
        user_id: row.get(1)?,
        completion_id: row.get(2)?,
        content: row.get(3)?,
        created_at: get_ts(row, 4)?,
    })
}

fn focus_session_from_row(row: &Row<'_>) -> rusqlite::Result<FocusSession> {
    Ok(FocusSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        duration_minutes: row.get(2)?,
        break_minutes: row.get(3)?,
        session_type: get_enum(row, 4)?,
        completed_at: get_ts(row, 5)?,
    })
}

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<UserNudge> {
    let times: String = row.get(4)?;
    Ok(UserNudge {
        id: row.get(0)?,
        user_id: row.get(1)?,
        nudge_id: row.get(2)?,
        frequency: get_enum(row, 3)?,
        scheduled_times: serde_json::from_str(&times).map_err(|e| conversion_error(4, e))?,
        is_active: row.get(5)?,
        created_at: get_ts(row, 6)?,
    })
}

fn insert_nudge_row(conn: &Connection, nudge: &Nudge) -> rusqlite::Result<usize> {
    conn.execute(
        &format!("INSERT INTO nudges ({NUDGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            nudge.id,
            nudge.title,
            nudge.description,
            nudge.category.as_str(),
            nudge.interactive_type.as_str(),
            nudge.is_ai_generated,
            nudge.duration_seconds,
            nudge.created_by,
            ts(&nudge.created_at),
        ],
    )
}

fn select_user(conn: &Connection, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![user_id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn ensure_user(&self, user: &NewUser) -> anyhow::Result<UserProfile> {
        let profile = user.clone().into_profile(Utc::now());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO users (id, email, username, subscription_status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    profile.id,
                    profile.email,
                    profile.username,
                    profile.subscription_status.as_str(),
                    ts(&profile.created_at),
                ],
            )?;
            select_user(conn, &profile.id)?
                .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", profile.id))
        })
        .await
    }

    async fn get_user(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| select_user(conn, &user_id)).await
    }

    async fn save_streak(&self, user_id: &str, update: &StreakUpdate) -> anyhow::Result<()> {
        let user_id = user_id.to_string();
        let update = *update;
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET current_streak_days = ?2, longest_streak_days = ?3,
                    last_streak_update_date = ?4, last_active_at = ?5
                 WHERE id = ?1",
                params![
                    user_id,
                    update.current_streak_days,
                    update.longest_streak_days,
                    date(&update.last_update_date),
                    ts(&update.last_active_at),
                ],
            )?;
            if changed == 0 {
                anyhow::bail!("User not found: {user_id}");
            }
            Ok(())
        })
        .await
    }

    async fn set_avatar(&self, user_id: &str, avatar_url: &str) -> anyhow::Result<bool> {
        let user_id = user_id.to_string();
        let avatar_url = avatar_url.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET selected_avatar_url = ?2 WHERE id = ?1",
                params![user_id, avatar_url],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn mark_tutorial_seen(&self, user_id: &str) -> anyhow::Result<bool> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET tutorial_seen = 1 WHERE id = ?1",
                params![user_id],
            )?;
            Ok(changed > 0)
        })
        .await
    }
}

#[async_trait]
impl NudgeRepository for SqliteStore {
    async fn insert_nudge(&self, nudge: &NewNudge) -> anyhow::Result<Nudge> {
        let nudge = nudge.clone().into_nudge(Utc::now());
        self.with_conn(move |conn| {
            insert_nudge_row(conn, &nudge)?;
            Ok(nudge)
        })
        .await
    }

    async fn get_nudge(&self, id: &str) -> anyhow::Result<Option<Nudge>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let nudge = conn
                .query_row(
                    &format!("SELECT {NUDGE_COLUMNS} FROM nudges WHERE id = ?1"),
                    params![id],
                    nudge_from_row,
                )
                .optional()?;
            Ok(nudge)
        })
        .await
    }

    async fn list_nudges(&self, user_id: &str) -> anyhow::Result<Vec<Nudge>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NUDGE_COLUMNS} FROM nudges
                 WHERE created_by IS NULL OR created_by = ?1
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt
                .query_map(params![user_id], nudge_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }
}

#[async_trait]
impl ActivityRepository for SqliteStore {
    async fn record_completion(
        &self,
        completion: &NewCompletion,
    ) -> anyhow::Result<NudgeCompletion> {
        let record = NudgeCompletion {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: completion.user_id.clone(),
            nudge_id: completion.nudge_id.clone(),
            duration_seconds: completion.duration_seconds,
            mood_at_completion: completion.mood_at_completion.clone(),
            completed_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO nudge_completions
                    (id, user_id, nudge_id, duration_seconds, mood_at_completion, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.user_id,
                    record.nudge_id,
                    record.duration_seconds,
                    record.mood_at_completion,
                    ts(&record.completed_at),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    async fn list_completions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<NudgeCompletion>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, nudge_id, duration_seconds, mood_at_completion, completed_at
                 FROM nudge_completions WHERE user_id = ?1
                 ORDER BY completed_at DESC, rowid DESC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit_param(limit)], completion_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn recent_completions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<CompletionWithNudge>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.user_id, c.nudge_id, c.duration_seconds, c.mood_at_completion,
                        c.completed_at, n.category, n.interactive_type
                 FROM nudge_completions c JOIN nudges n ON n.id = c.nudge_id
                 WHERE c.user_id = ?1
                 ORDER BY c.completed_at DESC, c.rowid DESC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit_param(limit)], |row| {
                    Ok(CompletionWithNudge {
                        completion: completion_from_row(row)?,
                        category: get_enum(row, 6)?,
                        interactive_type: get_enum(row, 7)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn count_completions(&self, user_id: &str) -> anyhow::Result<u64> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM nudge_completions WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok(count_to_u64(n))
        })
        .await
    }

    async fn owns_completion(&self, user_id: &str, completion_id: &str) -> anyhow::Result<bool> {
        let user_id = user_id.to_string();
        let completion_id = completion_id.to_string();
        self.with_conn(move |conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM nudge_completions WHERE id = ?1 AND user_id = ?2",
                params![completion_id, user_id],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
        .await
    }

    async fn add_reflection(&self, reflection: &NewReflection) -> anyhow::Result<Reflection> {
        let record = Reflection {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: reflection.user_id.clone(),
            completion_id: reflection.completion_id.clone(),
            content: reflection.content.clone(),
            created_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO reflections (id, user_id, completion_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.user_id,
                    record.completion_id,
                    record.content,
                    ts(&record.created_at),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    async fn list_reflections(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Reflection>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, completion_id, content, created_at
                 FROM reflections WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit_param(limit)], reflection_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn record_focus_session(
        &self,
        session: &NewFocusSession,
    ) -> anyhow::Result<FocusSession> {
        let record = FocusSession {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: session.user_id.clone(),
            duration_minutes: session.duration_minutes,
            break_minutes: session.break_minutes,
            session_type: session.session_type,
            completed_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO focus_sessions
                    (id, user_id, duration_minutes, break_minutes, session_type, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.user_id,
                    record.duration_minutes,
                    record.break_minutes,
                    record.session_type.as_str(),
                    ts(&record.completed_at),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    async fn list_focus_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<FocusSession>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, duration_minutes, break_minutes, session_type, completed_at
                 FROM focus_sessions WHERE user_id = ?1
                 ORDER BY completed_at DESC, rowid DESC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit_param(limit)], focus_session_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn log_mood(&self, mood: &NewMoodLog) -> anyhow::Result<MoodLog> {
        let record = MoodLog {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: mood.user_id.clone(),
            mood: mood.mood.clone(),
            logged_on: mood.logged_on,
            note: mood.note.clone(),
            created_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO mood_logs (id, user_id, mood, logged_on, note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.user_id,
                    record.mood,
                    date(&record.logged_on),
                    record.note,
                    ts(&record.created_at),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    async fn activity_stats(&self, user_id: &str) -> anyhow::Result<ActivityStats> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let (total, categories): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT n.category)
                 FROM nudge_completions c JOIN nudges n ON n.id = c.nudge_id
                 WHERE c.user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let reflections: i64 = conn.query_row(
                "SELECT COUNT(*) FROM reflections WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?;
            let focus_sessions: i64 = conn.query_row(
                "SELECT COUNT(*) FROM focus_sessions WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok(ActivityStats {
                total_completions: count_to_u64(total),
                reflections: count_to_u64(reflections),
                focus_sessions: count_to_u64(focus_sessions),
                distinct_categories: count_to_u64(categories),
            })
        })
        .await
    }
}

#[async_trait]
impl PreferenceRepository for SqliteStore {
    async fn get_audio_settings(&self, user_id: &str) -> anyhow::Result<Option<AudioSettings>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let settings = conn
                .query_row(
                    "SELECT user_id, master_volume, sounds_enabled, breathing_cues_enabled,
                            completion_chime_enabled, updated_at
                     FROM user_audio_settings WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        #[allow(clippy::cast_possible_truncation, reason = "volume is within 0..=1")]
                        let master_volume = row.get::<_, f64>(1)? as f32;
                        Ok(AudioSettings {
                            user_id: row.get(0)?,
                            master_volume,
                            sounds_enabled: row.get(2)?,
                            breathing_cues_enabled: row.get(3)?,
                            completion_chime_enabled: row.get(4)?,
                            updated_at: get_ts(row, 5)?,
                        })
                    },
                )
                .optional()?;
            Ok(settings)
        })
        .await
    }

    async fn upsert_audio_settings(&self, settings: &AudioSettings) -> anyhow::Result<()> {
        let settings = settings.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO user_audio_settings
                    (user_id, master_volume, sounds_enabled, breathing_cues_enabled,
                     completion_chime_enabled, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                    master_volume = excluded.master_volume,
                    sounds_enabled = excluded.sounds_enabled,
                    breathing_cues_enabled = excluded.breathing_cues_enabled,
                    completion_chime_enabled = excluded.completion_chime_enabled,
                    updated_at = excluded.updated_at",
                params![
                    settings.user_id,
                    f64::from(settings.master_volume),
                    settings.sounds_enabled,
                    settings.breathing_cues_enabled,
                    settings.completion_chime_enabled,
                    ts(&settings.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn like_nudge(&self, user_id: &str, nudge_id: &str) -> anyhow::Result<NudgeLike> {
        let user_id = user_id.to_string();
        let nudge_id = nudge_id.to_string();
        let now = Utc::now();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_nudge_likes (user_id, nudge_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![user_id, nudge_id, ts(&now)],
            )?;
            let like = conn.query_row(
                "SELECT user_id, nudge_id, created_at FROM user_nudge_likes
                 WHERE user_id = ?1 AND nudge_id = ?2",
                params![user_id, nudge_id],
                |row| {
                    Ok(NudgeLike {
                        user_id: row.get(0)?,
                        nudge_id: row.get(1)?,
                        created_at: get_ts(row, 2)?,
                    })
                },
            )?;
            Ok(like)
        })
        .await
    }

    async fn unlike_nudge(&self, user_id: &str, nudge_id: &str) -> anyhow::Result<bool> {
        let user_id = user_id.to_string();
        let nudge_id = nudge_id.to_string();
        self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM user_nudge_likes WHERE user_id = ?1 AND nudge_id = ?2",
                params![user_id, nudge_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn liked_nudge_ids(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT nudge_id FROM user_nudge_likes WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let ids = stmt
                .query_map(params![user_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(ids)
        })
        .await
    }

    async fn create_schedule(&self, schedule: &NewUserNudge) -> anyhow::Result<UserNudge> {
        let record = UserNudge {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: schedule.user_id.clone(),
            nudge_id: schedule.nudge_id.clone(),
            frequency: schedule.frequency,
            scheduled_times: schedule.scheduled_times.clone(),
            is_active: true,
            created_at: Utc::now(),
        };
        let times = serde_json::to_string(&record.scheduled_times)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO user_nudges
                    (id, user_id, nudge_id, frequency, scheduled_times, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.user_id,
                    record.nudge_id,
                    record.frequency.as_str(),
                    times,
                    record.is_active,
                    ts(&record.created_at),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    async fn list_schedules(&self, user_id: &str) -> anyhow::Result<Vec<UserNudge>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, nudge_id, frequency, scheduled_times, is_active, created_at
                 FROM user_nudges WHERE user_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map(params![user_id], schedule_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }
}
