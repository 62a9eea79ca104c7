//! Remote seams: where completions go and where fresh nudges come from.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::prompt::Prompt;
use crate::settings::AudioPreferences;

/// `context` sent when the user explicitly skips a prompt.
pub const SKIP_CONTEXT: &str = "user_skipped_nudge";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub nudge_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_at_completion: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StreakSnapshot {
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub is_new_record: bool,
}

/// Body of a `generate-nudge` call. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_interactive_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

impl GenerateRequest {
    pub fn after_skip(category: impl Into<String>) -> Self {
        Self {
            context: Some(SKIP_CONTEXT.to_string()),
            skip_category: Some(category.into()),
            ..Self::default()
        }
    }
}

/// Remote writes. The engine treats every one of them as best-effort.
#[async_trait]
pub trait BackendSink: Send + Sync + std::fmt::Debug {
    async fn record_completion(&self, report: &CompletionReport) -> EngineResult<()>;

    async fn save_reflection(&self, content: &str) -> EngineResult<()>;

    async fn set_like(&self, nudge_id: &str, liked: bool) -> EngineResult<()>;

    async fn log_mood(&self, mood: &str, logged_on: NaiveDate) -> EngineResult<()>;

    async fn update_streak(&self) -> EngineResult<StreakSnapshot>;
}

/// Source of freshly generated nudges.
#[async_trait]
pub trait NudgeSource: Send + Sync + std::fmt::Debug {
    async fn generate(&self, request: &GenerateRequest) -> EngineResult<Prompt>;
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Deserialize)]
struct StreakEnvelope {
    streak: StreakSnapshot,
}

#[derive(Deserialize)]
struct GenerateEnvelope {
    nudge: Prompt,
}

/// Client for the Joy Nudge API, authenticated with a user's bearer token.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> EngineResult<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send with auth and decode the body, mapping error envelopes to
    /// [`EngineError::Backend`].
    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> EngineResult<R> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message =
                serde_json::from_str::<ErrorEnvelope>(&text).map_or(text, |body| body.error);
            return Err(EngineError::Backend {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn fetch_audio_settings(&self) -> EngineResult<AudioPreferences> {
        let envelope: DataEnvelope<AudioPreferences> = self
            .send(self.client.get(self.url("/api/v1/audio-settings")))
            .await?;
        Ok(envelope.data)
    }

    /// Store `prefs` remotely and return what the server kept.
    pub async fn save_audio_settings(
        &self,
        prefs: &AudioPreferences,
    ) -> EngineResult<AudioPreferences> {
        let envelope: DataEnvelope<AudioPreferences> = self
            .send(self.client.put(self.url("/api/v1/audio-settings")).json(prefs))
            .await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl BackendSink for HttpBackend {
    async fn record_completion(&self, report: &CompletionReport) -> EngineResult<()> {
        let _: DataEnvelope<IgnoredAny> = self
            .send(self.client.post(self.url("/api/v1/completions")).json(report))
            .await?;
        Ok(())
    }

    async fn save_reflection(&self, content: &str) -> EngineResult<()> {
        let _: DataEnvelope<IgnoredAny> = self
            .send(
                self.client
                    .post(self.url("/api/v1/reflections"))
                    .json(&serde_json::json!({ "content": content })),
            )
            .await?;
        Ok(())
    }

    async fn set_like(&self, nudge_id: &str, liked: bool) -> EngineResult<()> {
        let url = self.url(&format!("/api/v1/nudges/{nudge_id}/like"));
        let request = if liked {
            self.client.post(url)
        } else {
            self.client.delete(url)
        };
        let _: DataEnvelope<IgnoredAny> = self.send(request).await?;
        Ok(())
    }

    async fn log_mood(&self, mood: &str, logged_on: NaiveDate) -> EngineResult<()> {
        let _: DataEnvelope<IgnoredAny> = self
            .send(
                self.client
                    .post(self.url("/api/v1/moods"))
                    .json(&serde_json::json!({ "mood": mood, "logged_on": logged_on })),
            )
            .await?;
        Ok(())
    }

    async fn update_streak(&self) -> EngineResult<StreakSnapshot> {
        let envelope: StreakEnvelope = self
            .send(self.client.post(self.url("/functions/v1/update-streak")))
            .await?;
        Ok(envelope.streak)
    }
}

#[async_trait]
impl NudgeSource for HttpBackend {
    async fn generate(&self, request: &GenerateRequest) -> EngineResult<Prompt> {
        let envelope: GenerateEnvelope = self
            .send(
                self.client
                    .post(self.url("/functions/v1/generate-nudge"))
                    .json(request),
            )
            .await?;
        Ok(envelope.nudge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_request_shape() {
        let body = serde_json::to_value(GenerateRequest::after_skip("Movement")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "context": "user_skipped_nudge", "skip_category": "Movement" })
        );
    }

    #[test]
    fn test_base_url_is_normalized() {
        let backend = HttpBackend::new("http://localhost:8080/", "t").unwrap();
        assert_eq!(
            backend.url("/api/v1/me"),
            "http://localhost:8080/api/v1/me"
        );
        assert!(!format!("{backend:?}").contains("\"t\""));
    }
}
