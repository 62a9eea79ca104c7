//! Personalized nudge generation.
//!
//! One generation is: gather personalization signals, build a prompt, call
//! the LLM once, parse the draft strictly, coerce it into valid enum values
//! and persist it. Unparseable output is replaced with a fallback template.

pub mod fallback;
pub mod generator;
pub mod parse;
pub mod prompt;
pub mod validate;

pub use generator::{GeneratedNudge, NudgeGenerator, PersonalizationUsed};

use serde::Deserialize;

/// Context value sent by the client engine after an explicit skip.
pub const SKIPPED_CONTEXT: &str = "user_skipped_nudge";

const DEFAULT_MOOD: &str = "open";

/// Body of `POST /functions/v1/generate-nudge`. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateNudgeRequest {
    #[serde(default)]
    pub requested_category: Option<String>,
    #[serde(default)]
    pub requested_interactive_type: Option<String>,
    #[serde(default = "default_mood")]
    pub current_mood: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub skip_category: Option<String>,
    /// Client offset from UTC, used for the time-of-day bucket.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

fn default_mood() -> String {
    DEFAULT_MOOD.to_string()
}

impl Default for GenerateNudgeRequest {
    fn default() -> Self {
        Self {
            requested_category: None,
            requested_interactive_type: None,
            current_mood: default_mood(),
            context: None,
            skip_category: None,
            utc_offset_minutes: None,
        }
    }
}

impl GenerateNudgeRequest {
    /// Mood with blank values treated as the default.
    pub fn mood(&self) -> &str {
        let mood = self.current_mood.trim();
        if mood.is_empty() { DEFAULT_MOOD } else { mood }
    }

    pub fn is_skip(&self) -> bool {
        self.context.as_deref() == Some(SKIPPED_CONTEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_uses_defaults() {
        let req: GenerateNudgeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.mood(), "open");
        assert!(req.requested_category.is_none());
        assert!(!req.is_skip());
    }

    #[test]
    fn test_blank_mood_falls_back_to_open() {
        let req: GenerateNudgeRequest =
            serde_json::from_str(r#"{"current_mood":"  ","context":"user_skipped_nudge"}"#)
                .unwrap();
        assert_eq!(req.mood(), "open");
        assert!(req.is_skip());
    }
}
