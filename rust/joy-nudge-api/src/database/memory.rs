//! In-memory store for tests and throwaway runs.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::repository::{
    ActivityRepository, NudgeRepository, PreferenceRepository, UserRepository,
};
use super::schema::SEED_NUDGES;
use crate::domain::{
    ActivityStats, AudioSettings, CompletionWithNudge, FocusSession, MoodLog, NewCompletion,
    NewFocusSession, NewMoodLog, NewNudge, NewReflection, NewUser, NewUserNudge, Nudge,
    NudgeCompletion, NudgeLike, Reflection, StreakUpdate, UserNudge, UserProfile,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, UserProfile>,
    /// Insertion order is creation order.
    nudges: Vec<Nudge>,
    completions: Vec<NudgeCompletion>,
    reflections: Vec<Reflection>,
    focus_sessions: Vec<FocusSession>,
    moods: Vec<MoodLog>,
    likes: Vec<NudgeLike>,
    audio: HashMap<String, AudioSettings>,
    schedules: Vec<UserNudge>,
}

impl Tables {
    fn nudge(&self, id: &str) -> Option<&Nudge> {
        self.nudges.iter().find(|n| n.id == id)
    }
}

/// In-memory store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seed_catalogue(&self) -> anyhow::Result<usize> {
        let mut tables = self.tables.write();
        if tables.nudges.iter().any(|n| !n.is_ai_generated) {
            return Ok(0);
        }
        let now = Utc::now();
        tables
            .nudges
            .extend(SEED_NUDGES.iter().map(|seed| seed.to_new_nudge().into_nudge(now)));
        Ok(SEED_NUDGES.len())
    }
}

/// Newest first, most recently inserted winning ties.
fn newest_first<T: Clone>(
    items: &[T],
    keep: impl Fn(&T) -> bool,
    limit: usize,
) -> Vec<T> {
    items.iter().rev().filter(|item| keep(item)).take(limit).cloned().collect()
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn ensure_user(&self, user: &NewUser) -> anyhow::Result<UserProfile> {
        let mut tables = self.tables.write();
        let profile = tables
            .users
            .entry(user.id.clone())
            .or_insert_with(|| user.clone().into_profile(Utc::now()));
        Ok(profile.clone())
    }

    async fn get_user(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        Ok(self.tables.read().users.get(user_id).cloned())
    }

    async fn save_streak(&self, user_id: &str, update: &StreakUpdate) -> anyhow::Result<()> {
        let mut tables = self.tables.write();
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;
        user.current_streak_days = update.current_streak_days;
        user.longest_streak_days = update.longest_streak_days;
        user.last_streak_update_date = Some(update.last_update_date);
        user.last_active_at = Some(update.last_active_at);
        Ok(())
    }

    async fn set_avatar(&self, user_id: &str, avatar_url: &str) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        Ok(tables.users.get_mut(user_id).is_some_and(|user| {
            user.selected_avatar_url = Some(avatar_url.to_string());
            true
        }))
    }

    async fn mark_tutorial_seen(&self, user_id: &str) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        Ok(tables.users.get_mut(user_id).is_some_and(|user| {
            user.tutorial_seen = true;
            true
        }))
    }
}

#[async_trait]
impl NudgeRepository for InMemoryStore {
    async fn insert_nudge(&self, nudge: &NewNudge) -> anyhow::Result<Nudge> {
        let nudge = nudge.clone().into_nudge(Utc::now());
        self.tables.write().nudges.push(nudge.clone());
        Ok(nudge)
    }

    async fn get_nudge(&self, id: &str) -> anyhow::Result<Option<Nudge>> {
        Ok(self.tables.read().nudge(id).cloned())
    }

    async fn list_nudges(&self, user_id: &str) -> anyhow::Result<Vec<Nudge>> {
        let tables = self.tables.read();
        Ok(tables
            .nudges
            .iter()
            .filter(|n| n.created_by.as_deref().is_none_or(|owner| owner == user_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActivityRepository for InMemoryStore {
    async fn record_completion(
        &self,
        completion: &NewCompletion,
    ) -> anyhow::Result<NudgeCompletion> {
        let mut tables = self.tables.write();
        if tables.nudge(&completion.nudge_id).is_none() {
            anyhow::bail!("Nudge not found: {}", completion.nudge_id);
        }
        let record = NudgeCompletion {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: completion.user_id.clone(),
            nudge_id: completion.nudge_id.clone(),
            duration_seconds: completion.duration_seconds,
            mood_at_completion: completion.mood_at_completion.clone(),
            completed_at: Utc::now(),
        };
        tables.completions.push(record.clone());
        Ok(record)
    }

    async fn list_completions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<NudgeCompletion>> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.completions, |c| c.user_id == user_id, limit))
    }

    async fn recent_completions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<CompletionWithNudge>> {
        let tables = self.tables.read();
        Ok(tables
            .completions
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .filter_map(|c| {
                tables.nudge(&c.nudge_id).map(|n| CompletionWithNudge {
                    completion: c.clone(),
                    category: n.category,
                    interactive_type: n.interactive_type,
                })
            })
            .take(limit)
            .collect())
    }

    async fn count_completions(&self, user_id: &str) -> anyhow::Result<u64> {
        let tables = self.tables.read();
        Ok(tables.completions.iter().filter(|c| c.user_id == user_id).count() as u64)
    }

    async fn owns_completion(&self, user_id: &str, completion_id: &str) -> anyhow::Result<bool> {
        let tables = self.tables.read();
        Ok(tables
            .completions
            .iter()
            .any(|c| c.id == completion_id && c.user_id == user_id))
    }

    async fn add_reflection(&self, reflection: &NewReflection) -> anyhow::Result<Reflection> {
        let record = Reflection {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: reflection.user_id.clone(),
            completion_id: reflection.completion_id.clone(),
            content: reflection.content.clone(),
            created_at: Utc::now(),
        };
        self.tables.write().reflections.push(record.clone());
        Ok(record)
    }

    async fn list_reflections(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Reflection>> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.reflections, |r| r.user_id == user_id, limit))
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
        self.tables.write().focus_sessions.push(record.clone());
        Ok(record)
    }

    async fn list_focus_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<FocusSession>> {
        let tables = self.tables.read();
        Ok(newest_first(&tables.focus_sessions, |s| s.user_id == user_id, limit))
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
        self.tables.write().moods.push(record.clone());
        Ok(record)
    }

    async fn activity_stats(&self, user_id: &str) -> anyhow::Result<ActivityStats> {
        let tables = self.tables.read();
        let mine: Vec<_> = tables.completions.iter().filter(|c| c.user_id == user_id).collect();
        let categories: HashSet<_> = mine
            .iter()
            .filter_map(|c| tables.nudge(&c.nudge_id).map(|n| n.category))
            .collect();

        Ok(ActivityStats {
            total_completions: mine.len() as u64,
            reflections: tables.reflections.iter().filter(|r| r.user_id == user_id).count() as u64,
            focus_sessions: tables
                .focus_sessions
                .iter()
                .filter(|s| s.user_id == user_id)
                .count() as u64,
            distinct_categories: categories.len() as u64,
        })
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryStore {
    async fn get_audio_settings(&self, user_id: &str) -> anyhow::Result<Option<AudioSettings>> {
        Ok(self.tables.read().audio.get(user_id).cloned())
    }

    async fn upsert_audio_settings(&self, settings: &AudioSettings) -> anyhow::Result<()> {
        self.tables
            .write()
            .audio
            .insert(settings.user_id.clone(), settings.clone());
        Ok(())
    }

    async fn like_nudge(&self, user_id: &str, nudge_id: &str) -> anyhow::Result<NudgeLike> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables
            .likes
            .iter()
            .find(|l| l.user_id == user_id && l.nudge_id == nudge_id)
        {
            return Ok(existing.clone());
        }
        let like = NudgeLike {
            user_id: user_id.to_string(),
            nudge_id: nudge_id.to_string(),
            created_at: Utc::now(),
        };
        tables.likes.push(like.clone());
        Ok(like)
    }

    async fn unlike_nudge(&self, user_id: &str, nudge_id: &str) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        let before = tables.likes.len();
        tables
            .likes
            .retain(|l| !(l.user_id == user_id && l.nudge_id == nudge_id));
        Ok(tables.likes.len() < before)
    }

    async fn liked_nudge_ids(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        let tables = self.tables.read();
        Ok(tables
            .likes
            .iter()
            .rev()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.nudge_id.clone())
            .collect())
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
        self.tables.write().schedules.push(record.clone());
        Ok(record)
    }

    async fn list_schedules(&self, user_id: &str) -> anyhow::Result<Vec<UserNudge>> {
        let tables = self.tables.read();
        Ok(tables
            .schedules
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}
