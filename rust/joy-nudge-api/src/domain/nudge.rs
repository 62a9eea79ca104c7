//! Nudge catalogue types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseEnumError;

/// Presentation mode of a nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractiveType {
    /// Guided inhale / hold / exhale cycles.
    Breathing,
    /// Single countdown timer.
    Timed,
    /// Checklist of things to notice.
    Observational,
    /// Free-text reflection.
    Reflective,
    /// Plain prompt with a "Complete" button.
    None,
}

impl InteractiveType {
    /// Types the generator is allowed to produce.
    pub const GENERATABLE: [Self; 4] = [
        Self::Breathing,
        Self::Timed,
        Self::Observational,
        Self::Reflective,
    ];

    /// Database / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breathing => "BREATHING",
            Self::Timed => "TIMED",
            Self::Observational => "OBSERVATIONAL",
            Self::Reflective => "REFLECTIVE",
            Self::None => "NONE",
        }
    }

    /// Whether the generator may emit this type.
    pub fn is_generatable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for InteractiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractiveType {
    type Err = ParseEnumError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BREATHING" => Ok(Self::Breathing),
            "TIMED" => Ok(Self::Timed),
            "OBSERVATIONAL" => Ok(Self::Observational),
            "REFLECTIVE" => Ok(Self::Reflective),
            "NONE" => Ok(Self::None),
            _ => Err(ParseEnumError::new("interactive_type", s)),
        }
    }
}

/// Wellness category of a nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Mindfulness,
    Gratitude,
    Movement,
    Connection,
    #[serde(rename = "Self-Care")]
    SelfCare,
    Reflection,
    Creativity,
}

impl Category {
    /// Every valid category, in display order.
    pub const ALL: [Self; 7] = [
        Self::Mindfulness,
        Self::Gratitude,
        Self::Movement,
        Self::Connection,
        Self::SelfCare,
        Self::Reflection,
        Self::Creativity,
    ];

    /// Database / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mindfulness => "Mindfulness",
            Self::Gratitude => "Gratitude",
            Self::Movement => "Movement",
            Self::Connection => "Connection",
            Self::SelfCare => "Self-Care",
            Self::Reflection => "Reflection",
            Self::Creativity => "Creativity",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    /// Case-insensitive, and tolerant of "self care" / "self_care" spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "mindfulness" => Ok(Self::Mindfulness),
            "gratitude" => Ok(Self::Gratitude),
            "movement" => Ok(Self::Movement),
            "connection" => Ok(Self::Connection),
            "selfcare" => Ok(Self::SelfCare),
            "reflection" => Ok(Self::Reflection),
            "creativity" => Ok(Self::Creativity),
            _ => Err(ParseEnumError::new("category", s)),
        }
    }
}

/// A persisted nudge. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nudge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub interactive_type: InteractiveType,
    pub is_ai_generated: bool,
    /// Suggested duration for timed activities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    /// Owner of an AI-generated nudge; `None` for the shared catalogue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Nudge {
    /// Catalogue nudges are shared; AI nudges belong to whoever generated them.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.created_by.as_deref().is_none_or(|owner| owner == user_id)
    }
}

/// Insert payload for a nudge.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNudge {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub interactive_type: InteractiveType,
    pub is_ai_generated: bool,
    pub duration_seconds: Option<u32>,
    pub created_by: Option<String>,
}

impl NewNudge {
    /// Materialize with a fresh id and timestamp.
    pub fn into_nudge(self, now: DateTime<Utc>) -> Nudge {
        Nudge {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title,
            description: self.description,
            category: self.category,
            interactive_type: self.interactive_type,
            is_ai_generated: self.is_ai_generated,
            duration_seconds: self.duration_seconds,
            created_by: self.created_by,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_type_parses_case_insensitively() {
        assert_eq!(
            " breathing ".parse::<InteractiveType>().unwrap(),
            InteractiveType::Breathing
        );
        assert_eq!(
            "Reflective".parse::<InteractiveType>().unwrap(),
            InteractiveType::Reflective
        );
        assert!("DANCING".parse::<InteractiveType>().is_err());
    }

    #[test]
    fn test_none_is_not_generatable() {
        assert!(!InteractiveType::None.is_generatable());
        assert!(InteractiveType::GENERATABLE.iter().all(InteractiveType::is_generatable));
    }

    #[test]
    fn test_category_accepts_self_care_spellings() {
        for raw in ["Self-Care", "self care", "SELF_CARE", "selfcare"] {
            assert_eq!(raw.parse::<Category>().unwrap(), Category::SelfCare, "{raw}");
        }
        assert!("Productivity".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_with_hyphen() {
        let json = serde_json::to_string(&Category::SelfCare).unwrap();
        assert_eq!(json, "\"Self-Care\"");
        let json = serde_json::to_string(&InteractiveType::Timed).unwrap();
        assert_eq!(json, "\"TIMED\"");
    }

    #[test]
    fn test_ai_nudges_are_private() {
        let shared = NewNudge {
            title: "Stretch".into(),
            description: "Reach up".into(),
            category: Category::Movement,
            interactive_type: InteractiveType::Timed,
            is_ai_generated: false,
            duration_seconds: Some(60),
            created_by: None,
        }
        .into_nudge(Utc::now());
        assert!(shared.is_visible_to("anyone"));

        let private = Nudge {
            is_ai_generated: true,
            created_by: Some("u1".into()),
            ..shared
        };
        assert!(private.is_visible_to("u1"));
        assert!(!private.is_visible_to("u2"));
    }
}
