//! State machine behaviour with in-process fakes for the remote seams.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_test::{assert_err, assert_ok};

use nudge_engine::backend::{CompletionReport, StreakSnapshot};
use nudge_engine::engine::LIKE_FAILED_NOTICE;
use nudge_engine::interaction::BreathPhase;
use nudge_engine::prelude::*;
use nudge_engine::settings::Cue;
use nudge_engine::store::{LocalState, PreferenceAction};
use nudge_engine::{EngineError, EngineResult};

fn unavailable() -> EngineError {
    EngineError::Backend {
        status: 503,
        message: "offline".into(),
    }
}

#[derive(Debug, Default)]
struct FakeBackend {
    fail: bool,
    completions: Mutex<Vec<CompletionReport>>,
    reflections: Mutex<Vec<String>>,
    likes: Mutex<Vec<(String, bool)>>,
    moods: Mutex<Vec<(String, NaiveDate)>>,
}

impl FakeBackend {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> EngineResult<()> {
        if self.fail { Err(unavailable()) } else { Ok(()) }
    }
}

#[async_trait]
impl BackendSink for FakeBackend {
    async fn record_completion(&self, report: &CompletionReport) -> EngineResult<()> {
        self.check()?;
        self.completions.lock().push(report.clone());
        Ok(())
    }

    async fn save_reflection(&self, content: &str) -> EngineResult<()> {
        self.check()?;
        self.reflections.lock().push(content.to_string());
        Ok(())
    }

    async fn set_like(&self, nudge_id: &str, liked: bool) -> EngineResult<()> {
        self.check()?;
        self.likes.lock().push((nudge_id.to_string(), liked));
        Ok(())
    }

    async fn log_mood(&self, mood: &str, logged_on: NaiveDate) -> EngineResult<()> {
        self.check()?;
        self.moods.lock().push((mood.to_string(), logged_on));
        Ok(())
    }

    async fn update_streak(&self) -> EngineResult<StreakSnapshot> {
        self.check()?;
        Ok(StreakSnapshot {
            current_streak_days: 4,
            longest_streak_days: 9,
            is_new_record: false,
        })
    }
}

#[derive(Debug, Default)]
struct FakeSource {
    reply: Option<Prompt>,
    requests: Mutex<Vec<GenerateRequest>>,
}

#[async_trait]
impl NudgeSource for FakeSource {
    async fn generate(&self, request: &GenerateRequest) -> EngineResult<Prompt> {
        self.requests.lock().push(request.clone());
        self.reply.clone().ok_or(EngineError::Backend {
            status: 400,
            message: "Nudge generation request failed".into(),
        })
    }
}

fn stretch() -> Prompt {
    Prompt::new(
        "Desk Stretch",
        "Roll your shoulders back.",
        "Movement",
        InteractiveType::Timed,
    )
    .with_id("n-timed")
    .with_duration(30)
}

fn smile() -> Prompt {
    Prompt::new("Smile", "Smile at yourself.", "Self-Care", InteractiveType::None).with_id("n-none")
}

fn notice() -> Prompt {
    Prompt::new(
        "Notice",
        "Look around you.",
        "Mindfulness",
        InteractiveType::Observational,
    )
    .with_id("n-observe")
}

fn journal() -> Prompt {
    Prompt::new(
        "Journal",
        "Write what you noticed.",
        "Reflection",
        InteractiveType::Reflective,
    )
    .with_id("n-reflect")
}

fn breathe() -> Prompt {
    Prompt::new(
        "Breathe",
        "Follow the circle.",
        "Mindfulness",
        InteractiveType::Breathing,
    )
    .with_id("n-breathe")
}

fn returning_user() -> LocalState {
    LocalState {
        seen_breathing_nudge: true,
        ..LocalState::default()
    }
}

struct Fixture {
    engine: NudgeEngine,
    events: broadcast::Receiver<EngineEvent>,
    store: Arc<MemoryStore>,
    backend: Arc<FakeBackend>,
    source: Arc<FakeSource>,
    audio: AudioSettingsHub,
}

fn build(
    prompts: Vec<Prompt>,
    store: Arc<MemoryStore>,
    backend: FakeBackend,
    source: FakeSource,
    config: EngineConfig,
) -> Fixture {
    let backend = Arc::new(backend);
    let source = Arc::new(source);
    let audio = AudioSettingsHub::default();
    let deps = EngineDeps {
        store: Arc::clone(&store) as Arc<dyn LocalStore>,
        backend: Arc::clone(&backend) as Arc<dyn BackendSink>,
        source: Arc::clone(&source) as Arc<dyn NudgeSource>,
    };
    let engine = NudgeEngine::new(prompts, deps, &audio, config).unwrap();
    let events = engine.subscribe();
    Fixture {
        engine,
        events,
        store,
        backend,
        source,
        audio,
    }
}

fn returning(prompts: Vec<Prompt>) -> Fixture {
    build(
        prompts,
        Arc::new(MemoryStore::with_state(returning_user())),
        FakeBackend::default(),
        FakeSource::default(),
        EngineConfig::default(),
    )
}

fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[test]
fn test_empty_rotation_is_rejected() {
    let deps = EngineDeps {
        store: Arc::new(MemoryStore::new()),
        backend: Arc::new(FakeBackend::default()),
        source: Arc::new(FakeSource::default()),
    };
    let result = NudgeEngine::new(
        Vec::new(),
        deps,
        &AudioSettingsHub::default(),
        EngineConfig::default(),
    );
    assert!(matches!(result, Err(EngineError::EmptyPlaylist)));
}

#[tokio::test]
async fn test_first_time_user_breathes_first_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let fx = build(
        vec![stretch(), smile(), breathe()],
        Arc::clone(&store),
        FakeBackend::default(),
        FakeSource::default(),
        EngineConfig::default(),
    );
    assert_eq!(fx.engine.current().title, "Breathe");
    assert!(store.snapshot().seen_breathing_nudge);

    let again = build(
        vec![stretch(), smile(), breathe()],
        store,
        FakeBackend::default(),
        FakeSource::default(),
        EngineConfig::default(),
    );
    assert_eq!(again.engine.current().title, "Desk Stretch");
}

#[tokio::test]
async fn test_intro_breathing_is_built_in_when_rotation_has_none() {
    let fx = build(
        vec![stretch()],
        Arc::new(MemoryStore::new()),
        FakeBackend::default(),
        FakeSource::default(),
        EngineConfig::default(),
    );
    assert_eq!(fx.engine.current(), &Prompt::intro_breathing());
}

#[tokio::test]
async fn test_breathing_runs_all_cycles_then_celebrates() {
    let mut fx = build(
        vec![stretch(), breathe()],
        Arc::new(MemoryStore::new()),
        FakeBackend::default(),
        FakeSource::default(),
        EngineConfig::default(),
    );

    fx.engine.engage().await.unwrap();
    fx.engine.tick(secs(32)).await;
    assert!(matches!(fx.engine.state(), EngineState::Active(_)));

    fx.engine.tick(secs(1)).await;
    assert!(matches!(fx.engine.state(), EngineState::Celebrating { .. }));

    let events = drain(&mut fx.events);
    assert!(events.contains(&EngineEvent::BreathPhaseChanged {
        phase: BreathPhase::Inhale,
        cycle: 1
    }));
    assert!(events.contains(&EngineEvent::BreathPhaseChanged {
        phase: BreathPhase::Exhale,
        cycle: 3
    }));
    assert!(events.contains(&EngineEvent::StreakUpdated {
        current_streak_days: 4,
        longest_streak_days: 9,
        is_new_record: false
    }));

    let completions = fx.backend.completions.lock().clone();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].nudge_id, "n-breathe");
    assert_eq!(completions[0].duration_seconds, Some(33));

    // Celebration ends and the rotation starts from the top.
    fx.engine.tick(secs(3)).await;
    assert_eq!(fx.engine.state(), &EngineState::Idle);
    assert_eq!(fx.engine.current().title, "Desk Stretch");
}

#[tokio::test]
async fn test_breathing_reports_new_cycle_after_long_tick() {
    let mut fx = returning(vec![breathe(), smile()]);
    fx.engine.engage().await.unwrap();
    drain(&mut fx.events);

    // One full 4-3-4 cycle in a single tick lands on the next inhale.
    fx.engine.tick(secs(11)).await;

    let events = drain(&mut fx.events);
    assert_eq!(
        events,
        vec![
            EngineEvent::BreathPhaseChanged {
                phase: BreathPhase::Inhale,
                cycle: 2
            },
            EngineEvent::PlayCue {
                cue: Cue::BreathingPhase,
                volume: AudioPreferences::default().volume_for(Cue::BreathingPhase)
            },
        ]
    );
}

#[tokio::test]
async fn test_timer_completes_at_zero() {
    let mut fx = returning(vec![stretch(), smile()]);

    fx.engine.engage().await.unwrap();
    fx.engine.tick(secs(29)).await;
    match fx.engine.interaction() {
        Some(Interaction::Timer(timer)) => assert_eq!(timer.remaining(), secs(1)),
        other => panic!("unexpected interaction {other:?}"),
    }

    fx.engine.tick(secs(1)).await;
    assert!(matches!(fx.engine.state(), EngineState::Celebrating { .. }));
    assert_eq!(
        fx.backend.completions.lock()[0].duration_seconds,
        Some(30)
    );
}

#[tokio::test]
async fn test_plain_prompt_completes_on_engage() {
    let mut fx = returning(vec![smile(), stretch()]);
    fx.engine.engage().await.unwrap();

    assert!(matches!(fx.engine.state(), EngineState::Celebrating { .. }));
    assert_eq!(fx.store.snapshot().completions.len(), 1);
    assert!(matches!(
        fx.engine.engage().await,
        Err(EngineError::InvalidState {
            action: "engage",
            state: "celebrating"
        })
    ));
    assert_err!(fx.engine.skip().await);
}

#[tokio::test]
async fn test_checklist_completes_on_last_item() {
    let config = EngineConfig {
        checklist_items: vec!["sky".into(), "sound".into()],
        ..EngineConfig::default()
    };
    let mut fx = build(
        vec![notice(), smile()],
        Arc::new(MemoryStore::with_state(returning_user())),
        FakeBackend::default(),
        FakeSource::default(),
        config,
    );

    fx.engine.engage().await.unwrap();
    assert!(!fx.engine.toggle_item(0).await.unwrap());
    assert!(matches!(fx.engine.state(), EngineState::Active(_)));
    assert!(matches!(
        fx.engine.toggle_item(5).await,
        Err(EngineError::InvalidItem { index: 5, len: 2 })
    ));

    assert!(fx.engine.toggle_item(1).await.unwrap());
    assert!(matches!(fx.engine.state(), EngineState::Celebrating { .. }));
}

#[tokio::test]
async fn test_reflection_needs_ten_words() {
    let mut fx = returning(vec![journal(), smile()]);
    fx.engine.engage().await.unwrap();

    let nine = "the rain sounded soft against the window this morning";
    assert_eq!(fx.engine.set_reflection_text(nine).unwrap(), 9);
    assert!(!fx.engine.can_save_reflection());
    assert!(matches!(
        fx.engine.save_reflection().await,
        Err(EngineError::ReflectionTooShort {
            required: 10,
            actual: 9
        })
    ));

    let ten = format!("{nine} again");
    assert_eq!(fx.engine.set_reflection_text(ten.clone()).unwrap(), 10);
    assert!(fx.engine.can_save_reflection());
    fx.engine.save_reflection().await.unwrap();

    assert!(matches!(fx.engine.state(), EngineState::Celebrating { .. }));
    let journal = fx.store.snapshot().journal;
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].content, ten);
    assert_eq!(journal[0].prompt_key, "n-reflect");
    assert_eq!(*fx.backend.reflections.lock(), vec![ten]);
}

#[tokio::test]
async fn test_skip_shows_generated_replacement_next() {
    let generated = Prompt {
        is_ai_generated: true,
        ..Prompt::new(
            "Window Sky Watch",
            "Follow one cloud.",
            "Mindfulness",
            InteractiveType::None,
        )
        .with_id("ai-1")
    };
    let mut fx = build(
        vec![stretch(), smile()],
        Arc::new(MemoryStore::with_state(returning_user())),
        FakeBackend::default(),
        FakeSource {
            reply: Some(generated.clone()),
            ..FakeSource::default()
        },
        EngineConfig::default(),
    );

    assert_ok!(fx.engine.skip().await);

    assert_eq!(
        *fx.source.requests.lock(),
        vec![GenerateRequest::after_skip("Movement")]
    );
    assert_eq!(fx.engine.current(), &generated);
    assert_eq!(fx.engine.state(), &EngineState::Idle);

    let events = drain(&mut fx.events);
    assert!(events.contains(&EngineEvent::Skipped {
        prompt_key: "n-timed".into(),
        category: "Movement".into()
    }));

    // The rotation resumes after the generated prompt.
    fx.engine.engage().await.unwrap();
    fx.engine.tick(secs(3)).await;
    assert_eq!(fx.engine.current().title, "Smile");
}

#[tokio::test]
async fn test_skip_replacement_goes_ahead_of_queued_prompts() {
    let generated = Prompt::new("AI", "Fresh idea.", "Gratitude", InteractiveType::None)
        .with_id("ai-2");
    let mut fx = build(
        vec![stretch(), smile()],
        Arc::new(MemoryStore::with_state(returning_user())),
        FakeBackend::default(),
        FakeSource {
            reply: Some(generated.clone()),
            ..FakeSource::default()
        },
        EngineConfig::default(),
    );
    fx.engine.queue(journal());

    fx.engine.skip().await.unwrap();
    assert_eq!(fx.engine.current(), &generated);

    fx.engine.engage().await.unwrap();
    fx.engine.tick(secs(3)).await;
    assert_eq!(fx.engine.current(), &journal());
    assert!(fx.store.snapshot().queued.is_empty());
}

#[tokio::test]
async fn test_skip_continues_rotation_when_generation_fails() {
    let mut fx = returning(vec![stretch(), smile()]);
    fx.engine.engage().await.unwrap();
    fx.engine.skip().await.unwrap();

    assert_eq!(fx.engine.current().title, "Smile");
    assert_eq!(fx.source.requests.lock().len(), 1);

    let prefs = fx.store.snapshot().preferences;
    assert_eq!(prefs.len(), 1);
    assert_eq!(prefs[0].action, PreferenceAction::Skipped);
    assert_eq!(prefs[0].category, "Movement");
}

#[tokio::test]
async fn test_backend_failures_never_block_the_flow() {
    let mut fx = build(
        vec![smile(), stretch()],
        Arc::new(MemoryStore::with_state(returning_user())),
        FakeBackend::failing(),
        FakeSource::default(),
        EngineConfig::default(),
    );

    fx.engine.engage().await.unwrap();
    assert!(matches!(fx.engine.state(), EngineState::Celebrating { .. }));
    assert_eq!(fx.store.snapshot().completions.len(), 1);

    fx.engine.tick(secs(3)).await;
    assert_eq!(fx.engine.current().title, "Desk Stretch");
    assert!(
        !drain(&mut fx.events)
            .iter()
            .any(|e| matches!(e, EngineEvent::StreakUpdated { .. }))
    );
}

#[tokio::test]
async fn test_like_is_optimistic() {
    let mut fx = returning(vec![stretch()]);

    assert!(assert_ok!(fx.engine.toggle_like().await));
    assert!(fx.engine.is_liked("n-timed"));
    assert!(!assert_ok!(fx.engine.toggle_like().await));
    assert_eq!(
        *fx.backend.likes.lock(),
        vec![("n-timed".to_string(), true), ("n-timed".to_string(), false)]
    );
}

#[tokio::test]
async fn test_failed_like_reverts_with_notice() {
    let mut fx = build(
        vec![stretch()],
        Arc::new(MemoryStore::with_state(returning_user())),
        FakeBackend::failing(),
        FakeSource::default(),
        EngineConfig::default(),
    );

    // The failure is absorbed; the result is the reverted state.
    assert!(!assert_ok!(fx.engine.toggle_like().await));
    assert!(!fx.engine.is_liked("n-timed"));
    assert!(fx.store.snapshot().liked.is_empty());

    let events = drain(&mut fx.events);
    assert_eq!(
        events,
        vec![
            EngineEvent::LikeChanged {
                prompt_key: "n-timed".into(),
                liked: true
            },
            EngineEvent::LikeChanged {
                prompt_key: "n-timed".into(),
                liked: false
            },
            EngineEvent::Notice {
                message: LIKE_FAILED_NOTICE.into()
            },
        ]
    );
}

#[tokio::test]
async fn test_like_needs_a_server_id() {
    let mut fx = returning(vec![Prompt::new("Local", "", "Gratitude", InteractiveType::None)]);
    assert!(matches!(
        fx.engine.toggle_like().await,
        Err(EngineError::UnsyncedPrompt(title)) if title == "Local"
    ));
}

#[tokio::test]
async fn test_queued_prompt_survives_restart_and_is_served_once() {
    let store = Arc::new(MemoryStore::with_state(returning_user()));
    let mut fx = build(
        vec![stretch(), smile()],
        Arc::clone(&store),
        FakeBackend::default(),
        FakeSource::default(),
        EngineConfig::default(),
    );
    fx.engine.queue(journal());
    assert_eq!(store.snapshot().queued, vec![journal()]);
    drop(fx);

    let fx = build(
        vec![stretch(), smile()],
        Arc::clone(&store),
        FakeBackend::default(),
        FakeSource::default(),
        EngineConfig::default(),
    );
    assert_eq!(fx.engine.current(), &journal());
    assert!(store.snapshot().queued.is_empty());
}

#[tokio::test]
async fn test_mood_is_logged_once_per_day() {
    let mut fx = returning(vec![smile()]);
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let tomorrow = today.succ_opt().unwrap();

    assert!(fx.engine.log_mood("calm", today).await);
    assert!(!fx.engine.log_mood("tired", today).await);
    assert!(fx.engine.log_mood("hopeful", tomorrow).await);

    assert_eq!(fx.store.snapshot().last_mood_date, Some(tomorrow));
    assert_eq!(fx.backend.moods.lock().len(), 2);
}

#[tokio::test]
async fn test_completion_chime_follows_audio_settings() {
    let mut fx = returning(vec![smile()]);
    fx.audio.update(|p| p.sounds_enabled = false);

    fx.engine.engage().await.unwrap();
    assert!(
        !drain(&mut fx.events)
            .iter()
            .any(|e| matches!(e, EngineEvent::PlayCue { .. }))
    );

    fx.audio.update(|p| {
        p.sounds_enabled = true;
        p.master_volume = 0.5;
    });
    fx.engine.tick(secs(3)).await;
    fx.engine.engage().await.unwrap();
    assert!(drain(&mut fx.events).contains(&EngineEvent::PlayCue {
        cue: Cue::CompletionChime,
        volume: 0.5
    }));
}

#[tokio::test]
async fn test_json_store_keeps_journal_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("state.json")));
    let deps = || EngineDeps {
        store: Arc::clone(&store) as Arc<dyn LocalStore>,
        backend: Arc::new(FakeBackend::failing()),
        source: Arc::new(FakeSource::default()),
    };
    let audio = AudioSettingsHub::default();

    let mut engine =
        NudgeEngine::new(vec![journal()], deps(), &audio, EngineConfig::default()).unwrap();
    // First launch shows the built-in breathing intro; skip past it.
    engine.skip().await.unwrap();
    engine.engage().await.unwrap();
    engine
        .set_reflection_text("one two three four five six seven eight nine ten")
        .unwrap();
    engine.save_reflection().await.unwrap();
    drop(engine);

    let engine =
        NudgeEngine::new(vec![journal()], deps(), &audio, EngineConfig::default()).unwrap();
    assert_eq!(engine.local_state().journal.len(), 1);
    assert!(engine.local_state().seen_breathing_nudge);
    assert_eq!(engine.current().title, "Journal");
}
