//! The nudge state machine.
//!
//! `Idle` shows the current prompt. Engaging starts the matching
//! interaction (`Active`); finishing it celebrates for a moment, then the
//! next prompt is shown. Time only moves through [`NudgeEngine::tick`], so
//! dropping the engine leaves nothing running.
//!
//! Local state always advances first. Remote writes happen afterwards and
//! their failures are logged, never returned.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use crate::backend::{BackendSink, CompletionReport, GenerateRequest, NudgeSource};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventBus};
use crate::interaction::{
    BreathingPattern, BreathingSession, Checklist, CountdownTimer, DEFAULT_CYCLES,
    DEFAULT_HOLD_SECS, DEFAULT_TIMER_SECS, Interaction, MIN_REFLECTION_WORDS, ReflectionDraft,
};
use crate::playlist::Playlist;
use crate::prompt::{InteractiveType, Prompt};
use crate::settings::{AudioPreferences, AudioSettingsHub, Cue};
use crate::store::{
    CompletionEntry, JournalEntry, LocalState, LocalStore, PreferenceAction, PreferenceEntry,
};

/// Shown when a like could not be saved.
pub const LIKE_FAILED_NOTICE: &str = "Couldn't save your like. Please try again.";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Clamped to 2..=3.
    pub breathing_hold_secs: u64,
    pub breathing_cycles: u32,
    /// Used when a timed prompt carries no duration.
    pub default_timer_secs: u32,
    /// How long the affirmation stays up.
    pub celebration: Duration,
    pub checklist_items: Vec<String>,
    /// Ask the nudge source for a replacement after an explicit skip.
    pub generate_on_skip: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            breathing_hold_secs: DEFAULT_HOLD_SECS,
            breathing_cycles: DEFAULT_CYCLES,
            default_timer_secs: DEFAULT_TIMER_SECS,
            celebration: Duration::from_secs(3),
            checklist_items: [
                "Five things you can see",
                "Four things you can touch",
                "Three things you can hear",
                "Two things you can smell",
                "One thing you can taste",
            ]
            .map(String::from)
            .to_vec(),
            generate_on_skip: true,
        }
    }
}

/// Collaborators the engine talks to.
#[derive(Debug, Clone)]
pub struct EngineDeps {
    pub store: Arc<dyn LocalStore>,
    pub backend: Arc<dyn BackendSink>,
    pub source: Arc<dyn NudgeSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    Idle,
    Active(Interaction),
    Celebrating { remaining: Duration },
}

impl EngineState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active(_) => "active",
            Self::Celebrating { .. } => "celebrating",
        }
    }
}

#[derive(Debug)]
pub struct NudgeEngine {
    config: EngineConfig,
    playlist: Playlist,
    current: Prompt,
    state: EngineState,
    local: LocalState,
    deps: EngineDeps,
    audio: watch::Receiver<AudioPreferences>,
    events: EventBus,
}

impl NudgeEngine {
    /// Build an engine over a static rotation.
    ///
    /// Unreadable local state is replaced with a fresh one. A user who has
    /// never seen the breathing prompt gets it first, exactly once.
    pub fn new(
        rotation: Vec<Prompt>,
        deps: EngineDeps,
        audio: &AudioSettingsHub,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        if rotation.is_empty() {
            return Err(EngineError::EmptyPlaylist);
        }
        let mut playlist = Playlist::new(rotation);

        let mut local = deps.store.load().unwrap_or_else(|e| {
            tracing::warn!("⚠️ Local state unreadable, starting fresh: {}", e);
            LocalState::default()
        });

        for prompt in &local.queued {
            playlist.append(prompt.clone());
        }
        if !local.seen_breathing_nudge {
            let intro = playlist
                .find_breathing()
                .cloned()
                .unwrap_or_else(Prompt::intro_breathing);
            playlist.queue_front(intro);
            local.seen_breathing_nudge = true;
        }

        let current = playlist.advance().ok_or(EngineError::EmptyPlaylist)?;
        forget_queued(&mut local, &current);
        let engine = Self {
            config,
            playlist,
            current,
            state: EngineState::Idle,
            local,
            deps,
            audio: audio.subscribe(),
            events: EventBus::new(),
        };
        engine.persist();

        tracing::info!(
            "🌱 Nudge engine ready - first={}, type={}",
            engine.current.log_key(),
            engine.current.interactive_type
        );
        Ok(engine)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn current(&self) -> &Prompt {
        &self.current
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn interaction(&self) -> Option<&Interaction> {
        match &self.state {
            EngineState::Active(interaction) => Some(interaction),
            _ => None,
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn local_state(&self) -> &LocalState {
        &self.local
    }

    pub fn is_liked(&self, nudge_id: &str) -> bool {
        self.local.liked.iter().any(|id| id == nudge_id)
    }

    fn invalid(&self, action: &'static str) -> EngineError {
        EngineError::InvalidState {
            action,
            state: self.state.name(),
        }
    }

    /// Start the current prompt's interaction. Prompts without one, and
    /// interactions that are already done, complete on the spot.
    pub async fn engage(&mut self) -> EngineResult<()> {
        if self.state != EngineState::Idle {
            return Err(self.invalid("engage"));
        }

        let Some(interaction) = self.interaction_for(&self.current) else {
            self.finish(None).await;
            return Ok(());
        };

        self.events.emit(EngineEvent::InteractionStarted {
            prompt_key: self.current.log_key().to_string(),
            interactive_type: self.current.interactive_type,
        });
        if let Interaction::Breathing(session) = &interaction {
            if let Some(phase) = session.phase() {
                self.events
                    .emit(EngineEvent::BreathPhaseChanged { phase, cycle: 1 });
                self.cue(Cue::BreathingPhase);
            }
        }

        let done = interaction.is_complete();
        let duration = Self::duration_of(&interaction);
        self.state = EngineState::Active(interaction);
        if done {
            self.finish(duration).await;
        }
        Ok(())
    }

    fn interaction_for(&self, prompt: &Prompt) -> Option<Interaction> {
        match prompt.interactive_type {
            InteractiveType::Breathing => Some(Interaction::Breathing(BreathingSession::new(
                BreathingPattern::new(
                    self.config.breathing_hold_secs,
                    self.config.breathing_cycles,
                ),
            ))),
            InteractiveType::Timed => Some(Interaction::Timer(CountdownTimer::from_secs(
                prompt
                    .duration_seconds
                    .filter(|secs| *secs > 0)
                    .unwrap_or(self.config.default_timer_secs),
            ))),
            InteractiveType::Observational => Some(Interaction::Checklist(Checklist::new(
                self.config.checklist_items.iter().cloned(),
            ))),
            InteractiveType::Reflective => Some(Interaction::Reflection(ReflectionDraft::default())),
            InteractiveType::None => None,
        }
    }

    fn duration_of(interaction: &Interaction) -> Option<u32> {
        let duration = match interaction {
            Interaction::Breathing(session) => session.pattern().total(),
            Interaction::Timer(timer) => timer.duration(),
            Interaction::Checklist(_) | Interaction::Reflection(_) => return None,
        };
        u32::try_from(duration.as_secs()).ok()
    }

    /// Advance time by `elapsed`, as reported by the host's timer.
    pub async fn tick(&mut self, elapsed: Duration) {
        let mut finished = None;
        let mut celebration_over = false;
        let mut phase_change = None;

        match &mut self.state {
            EngineState::Active(Interaction::Breathing(session)) => {
                let before = (session.phase(), session.cycle());
                if session.advance(elapsed) {
                    finished = Some(u32::try_from(session.pattern().total().as_secs()).ok());
                } else if let Some(phase) = session.phase() {
                    // A long tick can land on the same phase one cycle later.
                    let now = (Some(phase), session.cycle());
                    if now != before {
                        phase_change = Some((phase, now.1));
                    }
                }
            }
            EngineState::Active(Interaction::Timer(timer)) => {
                if timer.advance(elapsed) {
                    finished = Some(u32::try_from(timer.duration().as_secs()).ok());
                }
            }
            EngineState::Celebrating { remaining } => {
                *remaining = remaining.saturating_sub(elapsed);
                celebration_over = remaining.is_zero();
            }
            EngineState::Idle | EngineState::Active(_) => {}
        }

        if let Some((phase, cycle)) = phase_change {
            self.events
                .emit(EngineEvent::BreathPhaseChanged { phase, cycle });
            self.cue(Cue::BreathingPhase);
        }
        if let Some(duration) = finished {
            self.finish(duration).await;
        }
        if celebration_over {
            self.show_next();
        }
    }

    /// Toggle a checklist item. Returns true when this toggle completed the
    /// list.
    pub async fn toggle_item(&mut self, index: usize) -> EngineResult<bool> {
        let EngineState::Active(Interaction::Checklist(list)) = &mut self.state else {
            return Err(self.invalid("toggle a checklist item"));
        };
        let completed = list.toggle(index)?;
        if completed {
            self.finish(None).await;
        }
        Ok(completed)
    }

    /// Replace the reflection text. Returns the new word count.
    pub fn set_reflection_text(&mut self, text: impl Into<String>) -> EngineResult<usize> {
        let EngineState::Active(Interaction::Reflection(draft)) = &mut self.state else {
            return Err(self.invalid("edit a reflection"));
        };
        draft.set_text(text);
        Ok(draft.word_count())
    }

    pub fn can_save_reflection(&self) -> bool {
        matches!(&self.state, EngineState::Active(Interaction::Reflection(draft)) if draft.can_save())
    }

    /// Journal the reflection locally, send it, and complete the prompt.
    pub async fn save_reflection(&mut self) -> EngineResult<()> {
        let EngineState::Active(Interaction::Reflection(draft)) = &self.state else {
            return Err(self.invalid("save a reflection"));
        };
        if !draft.can_save() {
            return Err(EngineError::ReflectionTooShort {
                required: MIN_REFLECTION_WORDS,
                actual: draft.word_count(),
            });
        }
        let content = draft.text().trim().to_string();

        self.local.journal.push(JournalEntry {
            id: uuid::Uuid::new_v4().to_string(),
            prompt_key: self.current.log_key().to_string(),
            content: content.clone(),
            created_at: Utc::now(),
        });
        self.persist();

        if let Err(e) = self.deps.backend.save_reflection(&content).await {
            tracing::warn!("⚠️ Reflection not synced - error={}", e);
        }

        self.finish(None).await;
        Ok(())
    }

    /// Skip the current prompt. When enabled, a replacement is requested
    /// for the skipped category and shown next, ahead of anything queued;
    /// if that fails the playlist simply continues.
    pub async fn skip(&mut self) -> EngineResult<()> {
        if matches!(self.state, EngineState::Celebrating { .. }) {
            return Err(self.invalid("skip"));
        }

        let skipped = self.current.clone();
        self.record_preference(&skipped, PreferenceAction::Skipped);
        self.persist();
        self.events.emit(EngineEvent::Skipped {
            prompt_key: skipped.log_key().to_string(),
            category: skipped.category.clone(),
        });
        tracing::info!(
            "⏭️ Nudge skipped - key={}, category={}",
            skipped.log_key(),
            skipped.category
        );

        if self.config.generate_on_skip {
            let request = GenerateRequest::after_skip(skipped.category.clone());
            match self.deps.source.generate(&request).await {
                Ok(prompt) => {
                    tracing::info!(
                        "✨ Generated nudge up next - title={}, category={}",
                        prompt.title,
                        prompt.category
                    );
                    self.playlist.queue_front(prompt);
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Replacement nudge unavailable, continuing rotation - error={}",
                        e
                    );
                }
            }
        }

        self.show_next();
        Ok(())
    }

    /// Flip the like on the current prompt right away, then sync it. A
    /// failed sync reverts the flip and posts a notice. Returns the final
    /// like state.
    pub async fn toggle_like(&mut self) -> EngineResult<bool> {
        let prompt = self.current.clone();
        let Some(nudge_id) = prompt.id.clone() else {
            return Err(EngineError::UnsyncedPrompt(prompt.title));
        };

        let liked = !self.is_liked(&nudge_id);
        self.set_liked(&nudge_id, liked);
        self.record_preference(
            &prompt,
            if liked {
                PreferenceAction::Liked
            } else {
                PreferenceAction::Unliked
            },
        );
        self.persist();

        match self.deps.backend.set_like(&nudge_id, liked).await {
            Ok(()) => Ok(liked),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Like not saved, reverting - nudge_id={}, error={}",
                    nudge_id,
                    e
                );
                self.set_liked(&nudge_id, !liked);
                self.persist();
                self.events.emit(EngineEvent::Notice {
                    message: LIKE_FAILED_NOTICE.to_string(),
                });
                Ok(!liked)
            }
        }
    }

    fn set_liked(&mut self, nudge_id: &str, liked: bool) {
        self.local.liked.retain(|id| id != nudge_id);
        if liked {
            self.local.liked.push(nudge_id.to_string());
        }
        self.events.emit(EngineEvent::LikeChanged {
            prompt_key: nudge_id.to_string(),
            liked,
        });
    }

    /// Put `prompt` ahead of everything else, remembered across sessions.
    pub fn queue(&mut self, prompt: Prompt) {
        self.local.queued.insert(0, prompt.clone());
        self.playlist.queue_front(prompt);
        self.persist();
    }

    /// Log today's mood once per day. Returns false if already logged.
    pub async fn log_mood(&mut self, mood: &str, today: NaiveDate) -> bool {
        if self.local.last_mood_date == Some(today) {
            return false;
        }
        self.local.last_mood_date = Some(today);
        self.persist();

        if let Err(e) = self.deps.backend.log_mood(mood, today).await {
            tracing::warn!("⚠️ Mood not synced - error={}", e);
        }
        true
    }

    /// Record the completion locally, start celebrating, then sync.
    async fn finish(&mut self, duration_seconds: Option<u32>) {
        let prompt = self.current.clone();
        self.local.log_completion(CompletionEntry {
            prompt_key: prompt.log_key().to_string(),
            title: prompt.title.clone(),
            category: prompt.category.clone(),
            interactive_type: prompt.interactive_type,
            completed_at: Utc::now(),
        });
        self.record_preference(&prompt, PreferenceAction::Completed);
        self.persist();

        self.state = EngineState::Celebrating {
            remaining: self.config.celebration,
        };
        self.events.emit(EngineEvent::Completed {
            prompt_key: prompt.log_key().to_string(),
            category: prompt.category.clone(),
        });
        self.cue(Cue::CompletionChime);
        tracing::info!(
            "✅ Nudge completed - key={}, type={}",
            prompt.log_key(),
            prompt.interactive_type
        );

        let Some(nudge_id) = prompt.id else {
            return;
        };
        let report = CompletionReport {
            nudge_id,
            duration_seconds,
            mood_at_completion: None,
        };
        if let Err(e) = self.deps.backend.record_completion(&report).await {
            tracing::warn!(
                "⚠️ Completion not synced - nudge_id={}, error={}",
                report.nudge_id,
                e
            );
            return;
        }
        match self.deps.backend.update_streak().await {
            Ok(streak) => self.events.emit(EngineEvent::StreakUpdated {
                current_streak_days: streak.current_streak_days,
                longest_streak_days: streak.longest_streak_days,
                is_new_record: streak.is_new_record,
            }),
            Err(e) => tracing::warn!("⚠️ Streak not updated - error={}", e),
        }
    }

    fn show_next(&mut self) {
        if let Some(prompt) = self.playlist.advance() {
            forget_queued(&mut self.local, &prompt);
            self.current = prompt;
        }
        self.state = EngineState::Idle;
        self.persist();
        self.events.emit(EngineEvent::PromptChanged {
            prompt: self.current.clone(),
        });
    }

    fn record_preference(&mut self, prompt: &Prompt, action: PreferenceAction) {
        self.local.log_preference(PreferenceEntry {
            prompt_key: prompt.log_key().to_string(),
            category: prompt.category.clone(),
            action,
            at: Utc::now(),
        });
    }

    fn cue(&self, cue: Cue) {
        let volume = self.audio.borrow().volume_for(cue);
        if volume > 0.0 {
            self.events.emit(EngineEvent::PlayCue { cue, volume });
        }
    }

    fn persist(&self) {
        if let Err(e) = self.deps.store.save(&self.local) {
            tracing::warn!("⚠️ Local state not saved - error={}", e);
        }
    }
}

/// Served prompts leave the persisted queue.
fn forget_queued(local: &mut LocalState, prompt: &Prompt) {
    if let Some(pos) = local.queued.iter().position(|q| q == prompt) {
        local.queued.remove(pos);
    }
}
