//! Core domain models.
//!
//! Plain data types for users, nudges and activity, plus the pure policies
//! that run on them (streak advancement, garden unlocks, personalization).

pub mod activity;
pub mod garden;
pub mod nudge;
pub mod personalization;
pub mod preferences;
pub mod streak;
pub mod user;

pub use activity::*;
pub use nudge::*;
pub use preferences::*;
pub use user::*;

/// A stored or requested enum value that is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {value:?}")]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}
