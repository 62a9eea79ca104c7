//! Strict parsing of the model's raw text into a nudge draft.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// First `{` through last `}`; models often wrap JSON in prose or fences.
static JSON_OBJECT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").ok());

/// Longest duration accepted from a draft.
const MAX_DURATION_SECONDS: u32 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    /// The text held no JSON object, or the object did not match the draft shape.
    #[error("invalid upstream response: {0}")]
    InvalidUpstreamResponse(String),
    /// Well-formed draft without a required field.
    #[error("generated nudge is missing required field `{0}`")]
    MissingField(&'static str),
}

/// Draft exactly as the model produced it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NudgeDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub interactive_type: Option<String>,
    #[serde(default, alias = "duration")]
    pub duration_seconds: Option<DurationHint>,
}

/// Models emit durations as numbers or as text such as `"60 seconds"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DurationHint {
    Number(f64),
    Text(String),
}

impl DurationHint {
    /// Positive whole seconds, capped; `None` when unusable.
    pub fn seconds(&self) -> Option<u32> {
        let raw = match self {
            Self::Number(n) => *n,
            Self::Text(text) => {
                let digits: String = text
                    .trim()
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .collect();
                digits.parse::<f64>().ok()?
            }
        };
        if !raw.is_finite() || raw < 1.0 {
            return None;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "clamped into u32 range first"
        )]
        let secs = raw.min(f64::from(MAX_DURATION_SECONDS)).round() as u32;
        Some(secs)
    }
}

/// Required draft fields, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftFields {
    pub title: String,
    pub description: String,
    pub category: String,
    pub interactive_type: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl NudgeDraft {
    /// Check required fields. Blank strings count as missing.
    pub fn into_fields(self) -> Result<DraftFields, DraftError> {
        fn required(value: Option<String>, name: &'static str) -> Result<String, DraftError> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(DraftError::MissingField(name))
        }

        Ok(DraftFields {
            title: required(self.title, "title")?,
            description: required(self.description, "description")?,
            category: required(self.category, "category")?,
            interactive_type: self
                .interactive_type
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            duration_seconds: self.duration_seconds.as_ref().and_then(DurationHint::seconds),
        })
    }
}

/// Extract and deserialize the first JSON object in `text`.
pub fn parse_draft(text: &str) -> Result<NudgeDraft, DraftError> {
    let regex = JSON_OBJECT
        .as_ref()
        .ok_or_else(|| DraftError::InvalidUpstreamResponse("extractor unavailable".into()))?;

    let json = regex
        .find(text)
        .ok_or_else(|| DraftError::InvalidUpstreamResponse("no JSON object in response".into()))?;

    serde_json::from_str(json.as_str())
        .map_err(|e| DraftError::InvalidUpstreamResponse(format!("draft schema mismatch: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_object_from_fenced_prose() {
        let text = "Sure! Here you go:\n```json\n{\n  \"title\": \"Cloud Watch\",\n  \"description\": \"Find a window and watch the sky.\",\n  \"category\": \"Mindfulness\",\n  \"interactive_type\": \"timed\",\n  \"duration_seconds\": 90\n}\n```\nEnjoy!";
        let draft = parse_draft(text).unwrap();
        assert_eq!(draft.title.as_deref(), Some("Cloud Watch"));
        assert_eq!(draft.interactive_type.as_deref(), Some("timed"));

        let fields = draft.into_fields().unwrap();
        assert_eq!(fields.duration_seconds, Some(90));
    }

    #[test]
    fn test_plain_text_is_invalid_upstream() {
        let err = parse_draft("I'm sorry, I can't help with that.").unwrap_err();
        assert!(matches!(err, DraftError::InvalidUpstreamResponse(_)));
    }

    #[test]
    fn test_broken_json_is_invalid_upstream() {
        let err = parse_draft("{\"title\": \"Oops\", }").unwrap_err();
        assert!(matches!(err, DraftError::InvalidUpstreamResponse(_)));
    }

    #[test]
    fn test_wrong_field_type_is_invalid_upstream() {
        let err = parse_draft(r#"{"title": 42, "description": "x", "category": "Movement"}"#)
            .unwrap_err();
        assert!(matches!(err, DraftError::InvalidUpstreamResponse(_)));
    }

    #[test]
    fn test_blank_required_field_is_missing() {
        let draft =
            parse_draft(r#"{"title": "  ", "description": "Do a thing", "category": "Movement"}"#)
                .unwrap();
        assert_eq!(draft.into_fields().unwrap_err(), DraftError::MissingField("title"));

        let draft = parse_draft(r#"{"title": "Walk", "description": "Do a thing"}"#).unwrap();
        assert_eq!(draft.into_fields().unwrap_err(), DraftError::MissingField("category"));
    }

    #[test]
    fn test_duration_hints() {
        assert_eq!(DurationHint::Text("45 seconds".into()).seconds(), Some(45));
        assert_eq!(DurationHint::Number(59.6).seconds(), Some(60));
        assert_eq!(DurationHint::Number(0.0).seconds(), None);
        assert_eq!(DurationHint::Number(99_999.0).seconds(), Some(MAX_DURATION_SECONDS));
        assert_eq!(DurationHint::Text("about a minute".into()).seconds(), None);
    }
}
