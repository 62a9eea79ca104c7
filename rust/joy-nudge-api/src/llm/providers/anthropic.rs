//! Anthropic Claude API driver.

use crate::llm::{LlmDriver, LlmRequest, LlmResponse, LlmSettings, Provider, Usage, build_http_client};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Anthropic messages API driver.
#[derive(Debug, Clone)]
pub struct AnthropicDriver {
    settings: LlmSettings,
    client: Client,
}

impl AnthropicDriver {
    /// Create a new Anthropic driver.
    pub fn new(settings: LlmSettings) -> anyhow::Result<Self> {
        let client = build_http_client(&settings)?;
        Ok(Self { settings, client })
    }

    /// Build the API URL.
    fn api_url(&self) -> String {
        format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmDriver for AnthropicDriver {
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<LlmResponse> {
        let mut body = serde_json::json!({
            "model": req.model.as_ref().unwrap_or(&self.settings.model),
            "messages": [{ "role": "user", "content": req.prompt }],
            "max_tokens": req.max_tokens.unwrap_or(self.settings.max_tokens),
            "temperature": req.temperature.unwrap_or(self.settings.temperature),
            "top_p": self.settings.top_p,
        });

        if let Some(system) = req.system {
            body["system"] = serde_json::Value::String(system);
        }
        if let Some(top_k) = self.settings.top_k {
            body["top_k"] = serde_json::Value::from(top_k);
        }

        let api_key = self
            .settings
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Anthropic API key required"))?;

        let response = self
            .client
            .post(self.api_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error ({}): {}", status, text);
        }

        let parsed: AnthropicResponse = response.json().await?;
        let text = parsed
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<String>();

        Ok(LlmResponse {
            text,
            model: parsed.model,
            usage: parsed.usage.map(|u| Usage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
        })
    }

    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    model: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
