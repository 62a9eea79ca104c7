//! Append-only activity records: completions, reflections, focus sessions,
//! mood logs, plus nudge schedules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::nudge::{Category, InteractiveType};
use super::ParseEnumError;

/// A user finishing a nudge instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NudgeCompletion {
    pub id: String,
    pub user_id: String,
    pub nudge_id: String,
    pub duration_seconds: Option<u32>,
    pub mood_at_completion: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Insert payload for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompletion {
    pub user_id: String,
    pub nudge_id: String,
    pub duration_seconds: Option<u32>,
    pub mood_at_completion: Option<String>,
}

/// A completion joined through to the nudge it completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionWithNudge {
    pub completion: NudgeCompletion,
    pub category: Category,
    pub interactive_type: InteractiveType,
}

/// Free-text reflection, optionally tied to a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    pub id: String,
    pub user_id: String,
    pub completion_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReflection {
    pub user_id: String,
    pub completion_id: Option<String>,
    pub content: String,
}

/// Kind of Pomodoro-style session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusSessionType {
    Focus,
    ShortBreak,
    LongBreak,
}

impl FocusSessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::ShortBreak => "short_break",
            Self::LongBreak => "long_break",
        }
    }
}

impl fmt::Display for FocusSessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FocusSessionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" => Ok(Self::Focus),
            "short_break" => Ok(Self::ShortBreak),
            "long_break" => Ok(Self::LongBreak),
            _ => Err(ParseEnumError::new("session_type", s)),
        }
    }
}

/// A finished focus-mode session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    pub user_id: String,
    pub duration_minutes: u32,
    pub break_minutes: u32,
    pub session_type: FocusSessionType,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFocusSession {
    pub user_id: String,
    pub duration_minutes: u32,
    pub break_minutes: u32,
    pub session_type: FocusSessionType,
}

/// One mood check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodLog {
    pub id: String,
    pub user_id: String,
    pub mood: String,
    pub logged_on: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMoodLog {
    pub user_id: String,
    pub mood: String,
    pub logged_on: NaiveDate,
    pub note: Option<String>,
}

/// How often a scheduled nudge repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleFrequency {
    Daily,
    Weekdays,
    Weekly,
    Custom,
}

impl ScheduleFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekdays => "weekdays",
            Self::Weekly => "weekly",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for ScheduleFrequency {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekdays" => Ok(Self::Weekdays),
            "weekly" => Ok(Self::Weekly),
            "custom" => Ok(Self::Custom),
            _ => Err(ParseEnumError::new("schedule_frequency", s)),
        }
    }
}

/// Binds a user to a nudge on a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserNudge {
    pub id: String,
    pub user_id: String,
    pub nudge_id: String,
    pub frequency: ScheduleFrequency,
    /// Local times of day, `HH:MM`.
    pub scheduled_times: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUserNudge {
    pub user_id: String,
    pub nudge_id: String,
    pub frequency: ScheduleFrequency,
    pub scheduled_times: Vec<String>,
}

/// Aggregate counters used by achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ActivityStats {
    pub total_completions: u64,
    pub reflections: u64,
    pub focus_sessions: u64,
    pub distinct_categories: u64,
}
