//! Database schema definitions and the built-in nudge catalogue.

use crate::domain::{Category, InteractiveType, NewNudge};

/// SQLite schema.
///
/// Dates are stored as `YYYY-MM-DD` text, timestamps as RFC 3339 text and
/// enums by their wire names.
pub const SQLITE_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    username TEXT,
    current_streak_days INTEGER NOT NULL DEFAULT 0,
    longest_streak_days INTEGER NOT NULL DEFAULT 0,
    last_streak_update_date TEXT,
    last_active_at TEXT,
    selected_avatar_url TEXT,
    tutorial_seen BOOLEAN NOT NULL DEFAULT 0,
    subscription_status TEXT NOT NULL DEFAULT 'free',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS nudges (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    interactive_type TEXT NOT NULL,
    is_ai_generated BOOLEAN NOT NULL DEFAULT 0,
    duration_seconds INTEGER,
    created_by TEXT REFERENCES users(id),
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_nudges_created_by ON nudges(created_by);

CREATE TABLE IF NOT EXISTS user_nudges (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    nudge_id TEXT NOT NULL REFERENCES nudges(id),
    frequency TEXT NOT NULL,
    scheduled_times TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_user_nudges_user ON user_nudges(user_id);

CREATE TABLE IF NOT EXISTS nudge_completions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    nudge_id TEXT NOT NULL REFERENCES nudges(id),
    duration_seconds INTEGER,
    mood_at_completion TEXT,
    completed_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_completions_user_time ON nudge_completions(user_id, completed_at DESC);

CREATE TABLE IF NOT EXISTS reflections (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    completion_id TEXT REFERENCES nudge_completions(id),
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reflections_user ON reflections(user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS focus_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    duration_minutes INTEGER NOT NULL,
    break_minutes INTEGER NOT NULL,
    session_type TEXT NOT NULL,
    completed_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_focus_sessions_user ON focus_sessions(user_id, completed_at DESC);

CREATE TABLE IF NOT EXISTS mood_logs (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    mood TEXT NOT NULL,
    logged_on TEXT NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_nudge_likes (
    user_id TEXT NOT NULL REFERENCES users(id),
    nudge_id TEXT NOT NULL REFERENCES nudges(id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, nudge_id)
);

CREATE TABLE IF NOT EXISTS user_audio_settings (
    user_id TEXT PRIMARY KEY REFERENCES users(id),
    master_volume REAL NOT NULL,
    sounds_enabled BOOLEAN NOT NULL,
    breathing_cues_enabled BOOLEAN NOT NULL,
    completion_chime_enabled BOOLEAN NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    status TEXT NOT NULL,
    current_period_end TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_device_tokens (
    user_id TEXT NOT NULL REFERENCES users(id),
    token TEXT NOT NULL,
    platform TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, token)
);
";

/// One entry of the shared nudge catalogue.
#[derive(Debug, Clone, Copy)]
pub struct SeedNudge {
    pub title: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub interactive_type: InteractiveType,
    pub duration_seconds: Option<u32>,
}

impl SeedNudge {
    pub fn to_new_nudge(&self) -> NewNudge {
        NewNudge {
            title: self.title.to_string(),
            description: self.description.to_string(),
            category: self.category,
            interactive_type: self.interactive_type,
            is_ai_generated: false,
            duration_seconds: self.duration_seconds,
            created_by: None,
        }
    }
}

/// Catalogue inserted into an empty database.
pub const SEED_NUDGES: [SeedNudge; 8] = [
    SeedNudge {
        title: "Take a Mindful Breath",
        description: "Follow the circle: breathe in, hold gently, and let it all go.",
        category: Category::Mindfulness,
        interactive_type: InteractiveType::Breathing,
        duration_seconds: Some(33),
    },
    SeedNudge {
        title: "One Minute of Stillness",
        description: "Set everything down and simply sit for sixty seconds.",
        category: Category::Mindfulness,
        interactive_type: InteractiveType::Timed,
        duration_seconds: Some(60),
    },
    SeedNudge {
        title: "Notice Your Surroundings",
        description: "Find something you can see, hear, and feel right now.",
        category: Category::Mindfulness,
        interactive_type: InteractiveType::Observational,
        duration_seconds: None,
    },
    SeedNudge {
        title: "Three Good Things",
        description: "Write about three small things that went well today.",
        category: Category::Gratitude,
        interactive_type: InteractiveType::Reflective,
        duration_seconds: None,
    },
    SeedNudge {
        title: "Stretch It Out",
        description: "Stand up, reach for the ceiling, and roll your shoulders back.",
        category: Category::Movement,
        interactive_type: InteractiveType::Timed,
        duration_seconds: Some(45),
    },
    SeedNudge {
        title: "Send a Kind Message",
        description: "Text someone you care about and tell them why they matter.",
        category: Category::Connection,
        interactive_type: InteractiveType::None,
        duration_seconds: None,
    },
    SeedNudge {
        title: "Hydration Check",
        description: "Pour yourself a glass of water and drink it slowly.",
        category: Category::SelfCare,
        interactive_type: InteractiveType::None,
        duration_seconds: None,
    },
    SeedNudge {
        title: "Doodle Break",
        description: "Grab a pen and draw whatever comes to mind for two minutes.",
        category: Category::Creativity,
        interactive_type: InteractiveType::Timed,
        duration_seconds: Some(120),
    },
];
