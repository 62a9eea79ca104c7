//! OpenAI and OpenAI-compatible provider driver.

use crate::llm::{LlmDriver, LlmRequest, LlmResponse, LlmSettings, Provider, Usage, build_http_client};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// OpenAI-compatible chat completions driver.
#[derive(Debug, Clone)]
pub struct OpenAiDriver {
    settings: LlmSettings,
    client: Client,
}

impl OpenAiDriver {
    /// Create a new OpenAI driver.
    pub fn new(settings: LlmSettings) -> anyhow::Result<Self> {
        let client = build_http_client(&settings)?;
        Ok(Self { settings, client })
    }

    /// Build the API URL.
    fn api_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn build_body(&self, req: &LlmRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = req.system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": req.prompt }));

        serde_json::json!({
            "model": req.model.as_ref().unwrap_or(&self.settings.model),
            "messages": messages,
            "temperature": req.temperature.unwrap_or(self.settings.temperature),
            "top_p": self.settings.top_p,
            "max_tokens": req.max_tokens.unwrap_or(self.settings.max_tokens),
        })
    }
}

#[async_trait]
impl LlmDriver for OpenAiDriver {
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<LlmResponse> {
        let body = self.build_body(&req);
        let mut request = self.client.post(self.api_url()).json(&body);

        if let Some(ref api_key) = self.settings.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, text);
        }

        let parsed: OpenAiResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            model: parsed.model,
            usage: parsed.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }

    fn provider(&self) -> Provider {
        self.settings.provider
    }

    fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String) -> LlmSettings {
        LlmSettings {
            base_url,
            api_key: Some("sk-test".into()),
            model: "gpt-4o-mini".into(),
            provider: Provider::OpenAi,
            ..LlmSettings::default()
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "choices": [{ "message": { "role": "assistant", "content": "{\"title\":\"Hi\"}" } }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
            })))
            .mount(&server)
            .await;

        let driver = OpenAiDriver::new(settings(server.uri())).unwrap();
        let resp = driver
            .complete(LlmRequest::new("hello").with_system("be kind"))
            .await
            .unwrap();

        assert_eq!(resp.text, "{\"title\":\"Hi\"}");
        assert_eq!(resp.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let driver = OpenAiDriver::new(settings(server.uri())).unwrap();
        let err = driver.complete(LlmRequest::new("hello")).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
