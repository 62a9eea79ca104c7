//! Repository traits and the backend-dispatching [`Database`] handle.
//!
//! Handlers talk to [`Database`], which forwards every call to the
//! configured backend: SQLite for real deployments, an in-memory store for
//! tests and throwaway runs.

use async_trait::async_trait;

use super::memory::InMemoryStore;
use super::sqlite::SqliteStore;
use crate::domain::{
    ActivityStats, AudioSettings, CompletionWithNudge, FocusSession, MoodLog, NewCompletion,
    NewFocusSession, NewMoodLog, NewNudge, NewReflection, NewUser, NewUserNudge, Nudge,
    NudgeCompletion, NudgeLike, Reflection, StreakUpdate, UserNudge, UserProfile,
};

/// Repository trait for user profiles.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Return the profile, creating it with zeroed counters if absent.
    async fn ensure_user(&self, user: &NewUser) -> anyhow::Result<UserProfile>;

    /// Get a profile by ID.
    async fn get_user(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>>;

    /// Overwrite streak counters. Last write wins.
    async fn save_streak(&self, user_id: &str, update: &StreakUpdate) -> anyhow::Result<()>;

    /// Returns `false` if the user does not exist.
    async fn set_avatar(&self, user_id: &str, avatar_url: &str) -> anyhow::Result<bool>;

    /// Returns `false` if the user does not exist.
    async fn mark_tutorial_seen(&self, user_id: &str) -> anyhow::Result<bool>;
}

/// Repository trait for the nudge catalogue.
#[async_trait]
pub trait NudgeRepository: Send + Sync {
    async fn insert_nudge(&self, nudge: &NewNudge) -> anyhow::Result<Nudge>;

    async fn get_nudge(&self, id: &str) -> anyhow::Result<Option<Nudge>>;

    /// Shared catalogue plus the user's own generated nudges, oldest first.
    async fn list_nudges(&self, user_id: &str) -> anyhow::Result<Vec<Nudge>>;
}

/// Repository trait for append-only activity.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn record_completion(&self, completion: &NewCompletion)
    -> anyhow::Result<NudgeCompletion>;

    /// Most recent first.
    async fn list_completions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<NudgeCompletion>>;

    /// Most recent first, joined to the completed nudge.
    async fn recent_completions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<CompletionWithNudge>>;

    async fn count_completions(&self, user_id: &str) -> anyhow::Result<u64>;

    /// Whether `completion_id` exists and was recorded by `user_id`.
    async fn owns_completion(&self, user_id: &str, completion_id: &str) -> anyhow::Result<bool>;

    async fn add_reflection(&self, reflection: &NewReflection) -> anyhow::Result<Reflection>;

    /// Most recent first.
    async fn list_reflections(&self, user_id: &str, limit: usize)
    -> anyhow::Result<Vec<Reflection>>;

    async fn record_focus_session(
        &self,
        session: &NewFocusSession,
    ) -> anyhow::Result<FocusSession>;

    /// Most recent first.
    async fn list_focus_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<FocusSession>>;

    async fn log_mood(&self, mood: &NewMoodLog) -> anyhow::Result<MoodLog>;

    async fn activity_stats(&self, user_id: &str) -> anyhow::Result<ActivityStats>;
}

/// Repository trait for per-user preferences, likes and schedules.
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn get_audio_settings(&self, user_id: &str) -> anyhow::Result<Option<AudioSettings>>;

    /// Insert or replace.
    async fn upsert_audio_settings(&self, settings: &AudioSettings) -> anyhow::Result<()>;

    /// Idempotent; liking twice returns the original like.
    async fn like_nudge(&self, user_id: &str, nudge_id: &str) -> anyhow::Result<NudgeLike>;

    /// Returns whether a like was removed.
    async fn unlike_nudge(&self, user_id: &str, nudge_id: &str) -> anyhow::Result<bool>;

    async fn liked_nudge_ids(&self, user_id: &str) -> anyhow::Result<Vec<String>>;

    async fn create_schedule(&self, schedule: &NewUserNudge) -> anyhow::Result<UserNudge>;

    async fn list_schedules(&self, user_id: &str) -> anyhow::Result<Vec<UserNudge>>;
}

/// Database abstraction over different backends.
#[derive(Clone)]
pub enum Database {
    /// SQLite file or in-memory connection.
    Sqlite(SqliteStore),
    /// In-memory store for testing.
    InMemory(InMemoryStore),
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(_) => write!(f, "Database::Sqlite"),
            Self::InMemory(_) => write!(f, "Database::InMemory"),
        }
    }
}

impl Database {
    /// Create an empty in-memory database for testing.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryStore::new())
    }

    /// Backend name for logs and health output.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::InMemory(_) => "memory",
        }
    }

    /// Insert the built-in catalogue if no shared nudges exist yet.
    pub async fn seed_catalogue(&self) -> anyhow::Result<usize> {
        match self {
            Self::Sqlite(store) => store.seed_catalogue().await,
            Self::InMemory(store) => store.seed_catalogue(),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Self::Sqlite($store) => $call.await,
            Self::InMemory($store) => $call.await,
        }
    };
}

#[async_trait]
impl UserRepository for Database {
    async fn ensure_user(&self, user: &NewUser) -> anyhow::Result<UserProfile> {
        dispatch!(self, s => s.ensure_user(user))
    }

    async fn get_user(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        dispatch!(self, s => s.get_user(user_id))
    }

    async fn save_streak(&self, user_id: &str, update: &StreakUpdate) -> anyhow::Result<()> {
        dispatch!(self, s => s.save_streak(user_id, update))
    }

    async fn set_avatar(&self, user_id: &str, avatar_url: &str) -> anyhow::Result<bool> {
        dispatch!(self, s => s.set_avatar(user_id, avatar_url))
    }

    async fn mark_tutorial_seen(&self, user_id: &str) -> anyhow::Result<bool> {
        dispatch!(self, s => s.mark_tutorial_seen(user_id))
    }
}

#[async_trait]
impl NudgeRepository for Database {
    async fn insert_nudge(&self, nudge: &NewNudge) -> anyhow::Result<Nudge> {
        dispatch!(self, s => s.insert_nudge(nudge))
    }

    async fn get_nudge(&self, id: &str) -> anyhow::Result<Option<Nudge>> {
        dispatch!(self, s => s.get_nudge(id))
    }

    async fn list_nudges(&self, user_id: &str) -> anyhow::Result<Vec<Nudge>> {
        dispatch!(self, s => s.list_nudges(user_id))
    }
}

#[async_trait]
impl ActivityRepository for Database {
    async fn record_completion(
        &self,
        completion: &NewCompletion,
    ) -> anyhow::Result<NudgeCompletion> {
        dispatch!(self, s => s.record_completion(completion))
    }

    async fn list_completions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<NudgeCompletion>> {
        dispatch!(self, s => s.list_completions(user_id, limit))
    }

    async fn recent_completions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<CompletionWithNudge>> {
        dispatch!(self, s => s.recent_completions(user_id, limit))
    }

    async fn count_completions(&self, user_id: &str) -> anyhow::Result<u64> {
        dispatch!(self, s => s.count_completions(user_id))
    }

    async fn owns_completion(&self, user_id: &str, completion_id: &str) -> anyhow::Result<bool> {
        dispatch!(self, s => s.owns_completion(user_id, completion_id))
    }

    async fn add_reflection(&self, reflection: &NewReflection) -> anyhow::Result<Reflection> {
        dispatch!(self, s => s.add_reflection(reflection))
    }

    async fn list_reflections(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Reflection>> {
        dispatch!(self, s => s.list_reflections(user_id, limit))
    }

    async fn record_focus_session(
        &self,
        session: &NewFocusSession,
    ) -> anyhow::Result<FocusSession> {
        dispatch!(self, s => s.record_focus_session(session))
    }

    async fn list_focus_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<FocusSession>> {
        dispatch!(self, s => s.list_focus_sessions(user_id, limit))
    }

    async fn log_mood(&self, mood: &NewMoodLog) -> anyhow::Result<MoodLog> {
        dispatch!(self, s => s.log_mood(mood))
    }

    async fn activity_stats(&self, user_id: &str) -> anyhow::Result<ActivityStats> {
        dispatch!(self, s => s.activity_stats(user_id))
    }
}

#[async_trait]
impl PreferenceRepository for Database {
    async fn get_audio_settings(&self, user_id: &str) -> anyhow::Result<Option<AudioSettings>> {
        dispatch!(self, s => s.get_audio_settings(user_id))
    }

    async fn upsert_audio_settings(&self, settings: &AudioSettings) -> anyhow::Result<()> {
        dispatch!(self, s => s.upsert_audio_settings(settings))
    }

    async fn like_nudge(&self, user_id: &str, nudge_id: &str) -> anyhow::Result<NudgeLike> {
        dispatch!(self, s => s.like_nudge(user_id, nudge_id))
    }

    async fn unlike_nudge(&self, user_id: &str, nudge_id: &str) -> anyhow::Result<bool> {
        dispatch!(self, s => s.unlike_nudge(user_id, nudge_id))
    }

    async fn liked_nudge_ids(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        dispatch!(self, s => s.liked_nudge_ids(user_id))
    }

    async fn create_schedule(&self, schedule: &NewUserNudge) -> anyhow::Result<UserNudge> {
        dispatch!(self, s => s.create_schedule(schedule))
    }

    async fn list_schedules(&self, user_id: &str) -> anyhow::Result<Vec<UserNudge>> {
        dispatch!(self, s => s.list_schedules(user_id))
    }
}
