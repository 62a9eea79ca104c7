//! User profile and streak counters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseEnumError;

/// Subscription state mirrored from the billing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Trialing,
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "trialing" => Ok(Self::Trialing),
            "active" => Ok(Self::Active),
            "past_due" => Ok(Self::PastDue),
            "canceled" => Ok(Self::Canceled),
            _ => Err(ParseEnumError::new("subscription_status", s)),
        }
    }
}

/// A user row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: Option<String>,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub last_streak_update_date: Option<NaiveDate>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub selected_avatar_url: Option<String>,
    pub tutorial_seen: bool,
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Streak counters as the policy sees them.
    pub fn streak_state(&self) -> StreakState {
        StreakState {
            current_streak_days: self.current_streak_days,
            longest_streak_days: self.longest_streak_days,
            last_update_date: self.last_streak_update_date,
        }
    }

    /// Name to address the user by in generated copy.
    pub fn display_name(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Signup payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub username: Option<String>,
}

impl NewUser {
    /// A fresh profile with zeroed counters.
    pub fn into_profile(self, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            username: self.username,
            current_streak_days: 0,
            longest_streak_days: 0,
            last_streak_update_date: None,
            last_active_at: None,
            selected_avatar_url: None,
            tutorial_seen: false,
            subscription_status: SubscriptionStatus::Free,
            created_at: now,
        }
    }
}

/// Streak counters read before an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakState {
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub last_update_date: Option<NaiveDate>,
}

/// Streak counters written after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub last_update_date: NaiveDate,
    pub last_active_at: DateTime<Utc>,
}
