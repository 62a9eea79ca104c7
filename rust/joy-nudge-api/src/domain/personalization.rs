//! Signals used to personalize generated nudges.

use serde::Serialize;
use std::fmt;

use super::activity::CompletionWithNudge;
use super::nudge::{Category, InteractiveType};
use super::user::UserProfile;

/// How many of the most recent distinct categories / types to steer away from.
pub const RECENT_AVOID_WINDOW: usize = 2;

/// Coarse engagement level derived from total completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementTier {
    NewUser,
    Developing,
    Consistent,
}

impl EngagementTier {
    pub fn from_completion_count(total: u64) -> Self {
        match total {
            0..5 => Self::NewUser,
            5..=20 => Self::Developing,
            _ => Self::Consistent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewUser => "new_user",
            Self::Developing => "developing",
            Self::Consistent => "consistent",
        }
    }
}

impl fmt::Display for EngagementTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
    LateNight,
}

impl TimeOfDay {
    /// Bucket for an hour in `0..24`. Out-of-range hours wrap.
    pub fn from_hour(hour: u32) -> Self {
        match hour % 24 {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            21..=23 => Self::Night,
            _ => Self::LateNight,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::LateNight => "late_night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the prompt builder knows about the user.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalizationContext {
    pub display_name: Option<String>,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub total_completions: u64,
    pub engagement: EngagementTier,
    pub time_of_day: TimeOfDay,
    /// Distinct, most recent first.
    pub recent_categories: Vec<Category>,
    /// Distinct, most recent first.
    pub recent_types: Vec<InteractiveType>,
}

impl PersonalizationContext {
    /// `recent` must be ordered most recent first.
    pub fn build(
        profile: &UserProfile,
        recent: &[CompletionWithNudge],
        total_completions: u64,
        local_hour: u32,
    ) -> Self {
        Self {
            display_name: profile.display_name().map(str::to_string),
            current_streak_days: profile.current_streak_days,
            longest_streak_days: profile.longest_streak_days,
            total_completions,
            engagement: EngagementTier::from_completion_count(total_completions),
            time_of_day: TimeOfDay::from_hour(local_hour),
            recent_categories: distinct(recent.iter().map(|c| c.category)),
            recent_types: distinct(recent.iter().map(|c| c.interactive_type)),
        }
    }

    pub fn avoid_categories(&self) -> &[Category] {
        let n = self.recent_categories.len().min(RECENT_AVOID_WINDOW);
        &self.recent_categories[..n]
    }

    pub fn avoid_types(&self) -> &[InteractiveType] {
        let n = self.recent_types.len().min(RECENT_AVOID_WINDOW);
        &self.recent_types[..n]
    }
}

fn distinct<T: PartialEq>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
