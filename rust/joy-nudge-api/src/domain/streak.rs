//! Daily streak policy.
//!
//! A streak grows by one for each consecutive UTC day the user shows up.
//! Missing up to [`GRACE_PERIOD_DAYS`] days keeps the streak at its current
//! value rather than breaking it; anything longer resets it to 1.

use chrono::NaiveDate;
use serde::Serialize;

use super::user::StreakState;

/// Largest gap (in days) that still preserves the streak.
pub const GRACE_PERIOD_DAYS: i64 = 3;

/// What happened to the streak on this update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// First ever update.
    Started,
    /// Same day (or a last date in the future).
    Unchanged,
    /// Consecutive day.
    Extended,
    /// Gap inside the grace period.
    GracePreserved,
    /// Gap beyond the grace period.
    Reset,
}

/// Result of applying the policy to a stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakOutcome {
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub is_new_record: bool,
    #[serde(skip)]
    pub days_since_last: Option<i64>,
    #[serde(skip)]
    pub change: StreakChange,
}

/// Advance `state` to `today`.
pub fn advance(state: &StreakState, today: NaiveDate) -> StreakOutcome {
    let days_since_last = state
        .last_update_date
        .map(|last| today.signed_duration_since(last).num_days());

    let (current, change) = match days_since_last {
        None => (1, StreakChange::Started),
        Some(days) if days <= 0 => (state.current_streak_days, StreakChange::Unchanged),
        Some(1) => (
            state.current_streak_days.saturating_add(1),
            StreakChange::Extended,
        ),
        Some(days) if days <= GRACE_PERIOD_DAYS => {
            (state.current_streak_days, StreakChange::GracePreserved)
        }
        Some(_) => (1, StreakChange::Reset),
    };

    let longest = state.longest_streak_days.max(current);

    StreakOutcome {
        current_streak_days: current,
        longest_streak_days: longest,
        is_new_record: current == longest && longest > state.longest_streak_days,
        days_since_last,
        change,
    }
}
