//! Local persisted state.
//!
//! Best-effort and never authoritative: the server owns the real history.
//! This is what lets the engine keep going offline.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::EngineResult;
use crate::prompt::{InteractiveType, Prompt};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub prompt_key: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEntry {
    pub prompt_key: String,
    pub title: String,
    pub category: String,
    pub interactive_type: InteractiveType,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceAction {
    Completed,
    Skipped,
    Liked,
    Unliked,
}

/// One signal for future personalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    pub prompt_key: String,
    pub category: String,
    pub action: PreferenceAction,
    pub at: DateTime<Utc>,
}

/// Everything the engine keeps on the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalState {
    pub journal: Vec<JournalEntry>,
    pub completions: Vec<CompletionEntry>,
    pub seen_breathing_nudge: bool,
    pub last_mood_date: Option<NaiveDate>,
    pub preferences: Vec<PreferenceEntry>,
    /// Prompts queued from discovery, served before the rotation.
    pub queued: Vec<Prompt>,
    /// Server ids of liked prompts.
    pub liked: Vec<String>,
}

/// Oldest entries are dropped past this many completions.
pub const MAX_COMPLETION_LOG: usize = 500;
/// Oldest entries are dropped past this many preference signals.
pub const MAX_PREFERENCE_LOG: usize = 1000;

impl LocalState {
    pub fn log_completion(&mut self, entry: CompletionEntry) {
        push_bounded(&mut self.completions, entry, MAX_COMPLETION_LOG);
    }

    pub fn log_preference(&mut self, entry: PreferenceEntry) {
        push_bounded(&mut self.preferences, entry, MAX_PREFERENCE_LOG);
    }
}

/// Append, evicting from the front once `cap` is exceeded.
fn push_bounded<T>(log: &mut Vec<T>, entry: T, cap: usize) {
    log.push(entry);
    if log.len() > cap {
        let excess = log.len() - cap;
        log.drain(..excess);
    }
}

/// Where [`LocalState`] lives between sessions.
pub trait LocalStore: Send + Sync + std::fmt::Debug {
    /// Stored state, or the default when nothing has been saved yet.
    fn load(&self) -> EngineResult<LocalState>;

    fn save(&self, state: &LocalState) -> EngineResult<()>;
}

/// Pretty-printed JSON on disk, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalStore for JsonFileStore {
    fn load(&self) -> EngineResult<LocalState> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LocalState::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &LocalState) -> EngineResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Process-local store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<LocalState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: LocalState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Copy of the last saved state.
    pub fn snapshot(&self) -> LocalState {
        self.state.lock().clone()
    }
}

impl LocalStore for MemoryStore {
    fn load(&self) -> EngineResult<LocalState> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &LocalState) -> EngineResult<()> {
        *self.state.lock() = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn sample_state() -> LocalState {
        LocalState {
            seen_breathing_nudge: true,
            last_mood_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            journal: vec![JournalEntry {
                id: "j-1".into(),
                prompt_key: "n-1".into(),
                content: "A slow morning with tea and rain on the window".into(),
                created_at: Utc::now(),
            }],
            queued: vec![Prompt::intro_breathing()],
            liked: vec!["n-1".into()],
            ..LocalState::default()
        }
    }

    #[test]
    fn test_logs_drop_oldest_entries_past_cap() {
        let mut state = LocalState::default();
        for i in 0..=MAX_COMPLETION_LOG {
            state.log_completion(CompletionEntry {
                prompt_key: format!("n-{i}"),
                title: "Smile".into(),
                category: "Self-Care".into(),
                interactive_type: InteractiveType::None,
                completed_at: Utc::now(),
            });
        }
        assert_eq!(state.completions.len(), MAX_COMPLETION_LOG);
        assert_eq!(state.completions[0].prompt_key, "n-1");
        assert_eq!(
            state.completions[MAX_COMPLETION_LOG - 1].prompt_key,
            format!("n-{MAX_COMPLETION_LOG}")
        );

        for _ in 0..MAX_PREFERENCE_LOG + 5 {
            state.log_preference(PreferenceEntry {
                prompt_key: "n-1".into(),
                category: "Self-Care".into(),
                action: PreferenceAction::Skipped,
                at: Utc::now(),
            });
        }
        assert_eq!(state.preferences.len(), MAX_PREFERENCE_LOG);
    }

    #[test]
    fn test_json_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("state.json"));

        assert_eq!(store.load().unwrap(), LocalState::default());

        let state = sample_state();
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_json_file_store_tolerates_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"seen_breathing_nudge": true}"#).unwrap();

        let state = JsonFileStore::new(&path).load().unwrap();
        assert!(state.seen_breathing_nudge);
        assert!(state.journal.is_empty());
    }

    #[test]
    fn test_json_file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(EngineError::Serialization(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(!store.load().unwrap().seen_breathing_nudge);
        store.save(&sample_state()).unwrap();
        assert_eq!(store.snapshot().liked, vec!["n-1".to_string()]);
    }
}
