//! Google Gemini `generateContent` driver.

use crate::llm::{LlmDriver, LlmRequest, LlmResponse, LlmSettings, Provider, Usage, build_http_client};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Gemini driver. Supports top-k sampling.
#[derive(Debug, Clone)]
pub struct GoogleDriver {
    settings: LlmSettings,
    client: Client,
}

impl GoogleDriver {
    /// Create a new Gemini driver.
    pub fn new(settings: LlmSettings) -> anyhow::Result<Self> {
        let client = build_http_client(&settings)?;
        Ok(Self { settings, client })
    }

    fn api_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl LlmDriver for GoogleDriver {
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<LlmResponse> {
        let model = req.model.as_deref().unwrap_or(&self.settings.model);

        let mut generation_config = serde_json::json!({
            "temperature": req.temperature.unwrap_or(self.settings.temperature),
            "topP": self.settings.top_p,
            "maxOutputTokens": req.max_tokens.unwrap_or(self.settings.max_tokens),
        });
        if let Some(top_k) = self.settings.top_k {
            generation_config["topK"] = serde_json::Value::from(top_k);
        }

        let mut body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": req.prompt }] }],
            "generationConfig": generation_config,
        });
        if let Some(ref system) = req.system {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }

        let api_key = self
            .settings
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Gemini API key required"))?;

        let response = self
            .client
            .post(self.api_url(model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, text);
        }

        let parsed: GeminiResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            model: parsed.model_version,
            usage: parsed.usage_metadata.map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
        })
    }

    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_complete_sends_sampling_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": { "topK": 40 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "```json\n{}\n```" }] } }],
                "usageMetadata": { "promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5 },
                "modelVersion": "gemini-test"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let driver = GoogleDriver::new(LlmSettings {
            base_url: server.uri(),
            api_key: Some("g-key".into()),
            model: "gemini-test".into(),
            provider: Provider::Google,
            top_k: Some(40),
            ..LlmSettings::default()
        })
        .unwrap();

        let resp = driver.complete(LlmRequest::new("hi")).await.unwrap();
        assert_eq!(resp.text, "```json\n{}\n```");
        assert_eq!(resp.model.as_deref(), Some("gemini-test"));
        assert_eq!(resp.usage.unwrap().total_tokens, 5);
    }
}
