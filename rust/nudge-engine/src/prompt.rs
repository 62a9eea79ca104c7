//! Prompts as the engine shows them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentation mode of a prompt. Matches the API's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractiveType {
    Breathing,
    Timed,
    Observational,
    Reflective,
    #[default]
    None,
}

impl InteractiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breathing => "BREATHING",
            Self::Timed => "TIMED",
            Self::Observational => "OBSERVATIONAL",
            Self::Reflective => "REFLECTIVE",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for InteractiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A nudge ready to be shown.
///
/// Deserializes directly from the API's nudge objects; unknown fields such
/// as `created_at` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Server id. Built-in prompts that never reached the server have none.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub interactive_type: InteractiveType,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub is_ai_generated: bool,
}

impl Prompt {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        interactive_type: InteractiveType,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            interactive_type,
            duration_seconds: None,
            is_ai_generated: false,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Introductory breathing exercise shown to first-time users.
    pub fn intro_breathing() -> Self {
        Self::new(
            "Take a Mindful Breath",
            "Follow the circle: breathe in, hold gently, and let it all go.",
            "Mindfulness",
            InteractiveType::Breathing,
        )
    }

    /// Key used in local logs: the server id, or the title for built-ins.
    pub fn log_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_from_api_nudge() {
        let json = r#"{
            "id": "n-1",
            "title": "Window Sky Watch",
            "description": "Follow one cloud.",
            "category": "Self-Care",
            "interactive_type": "OBSERVATIONAL",
            "is_ai_generated": true,
            "created_by": "user-1",
            "created_at": "2025-06-01T10:00:00Z"
        }"#;
        let prompt: Prompt = serde_json::from_str(json).unwrap();
        assert_eq!(prompt.id.as_deref(), Some("n-1"));
        assert_eq!(prompt.category, "Self-Care");
        assert_eq!(prompt.interactive_type, InteractiveType::Observational);
        assert_eq!(prompt.duration_seconds, None);
        assert!(prompt.is_ai_generated);
    }

    #[test]
    fn test_log_key_falls_back_to_title() {
        let prompt = Prompt::intro_breathing();
        assert_eq!(prompt.log_key(), "Take a Mindful Breath");
        assert_eq!(prompt.with_id("n-9").log_key(), "n-9");
    }
}
