//! LLM driver traits and implementations.
//!
//! Nudge generation needs exactly one non-streaming completion per request,
//! so the [`LlmDriver`] trait is a single `complete` call returning the full
//! response text. Sampling parameters come from [`LlmSettings`] and can be
//! overridden per request.
//!
//! # Drivers
//!
//! - [`providers::GoogleDriver`]: Google Gemini `generateContent`
//! - [`providers::OpenAiDriver`]: OpenAI and compatible chat completions
//! - [`providers::AnthropicDriver`]: Anthropic messages API

pub mod providers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// LLM connection and model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Base URL for the LLM API.
    pub base_url: String,
    /// API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Provider type.
    pub provider: Provider,
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for sampling.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Nucleus sampling mass.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Top-k sampling. Only honoured by providers that support it.
    #[serde(default)]
    pub top_k: Option<u32>,
    /// HTTP client timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.9
}

fn default_top_p() -> f32 {
    0.95
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: Provider::Google.default_base_url().to_string(),
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            provider: Provider::Google,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: Some(40),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini.
    #[default]
    Google,
    /// OpenAI and compatible APIs.
    OpenAi,
    /// Anthropic Claude.
    Anthropic,
    /// Custom OpenAI-compatible endpoint.
    Custom,
}

impl Provider {
    /// Get the default base URL for this provider.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Google => "https://generativelanguage.googleapis.com",
            Self::OpenAi => "https://api.openai.com",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Custom => "",
        }
    }

    /// Detect provider from base URL.
    pub fn from_base_url(url: &str) -> Self {
        if url.contains("googleapis.com") || url.contains("google.com") {
            Self::Google
        } else if url.contains("openai.com") {
            Self::OpenAi
        } else if url.contains("anthropic.com") {
            Self::Anthropic
        } else {
            Self::Custom
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Custom => "custom",
        }
    }
}

/// A single-turn completion request.
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    /// System instruction.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
    /// Model to use (overrides settings).
    pub model: Option<String>,
    /// Temperature (overrides settings).
    pub temperature: Option<f32>,
    /// Max tokens (overrides settings).
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Create a new request for a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Attach a system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Full response from a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    /// Concatenated text parts.
    pub text: String,
    /// Model reported by the provider, if any.
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

/// Trait for LLM completion drivers.
#[async_trait]
pub trait LlmDriver: Send + Sync {
    /// Run one completion and return the whole response.
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<LlmResponse>;

    /// Get the provider type.
    fn provider(&self) -> Provider;

    /// Get the current settings.
    fn settings(&self) -> &LlmSettings;
}

/// Shared HTTP client construction for the provider drivers.
pub(crate) fn build_http_client(settings: &LlmSettings) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_base_url() {
        assert_eq!(
            Provider::from_base_url("https://generativelanguage.googleapis.com"),
            Provider::Google
        );
        assert_eq!(Provider::from_base_url("https://api.openai.com"), Provider::OpenAi);
        assert_eq!(
            Provider::from_base_url("https://api.anthropic.com"),
            Provider::Anthropic
        );
        assert_eq!(Provider::from_base_url("http://localhost:11434"), Provider::Custom);
    }

    #[test]
    fn test_provider_deserializes_lowercase() {
        let provider: Provider = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(provider, Provider::OpenAi);
    }
}
