//! LLM provider implementations.

mod anthropic;
mod google;
mod openai;

pub use anthropic::AnthropicDriver;
pub use google::GoogleDriver;
pub use openai::OpenAiDriver;

use super::{LlmDriver, LlmSettings, Provider};
use std::sync::Arc;

/// Create a driver for the given settings.
pub fn create_driver(settings: LlmSettings) -> anyhow::Result<Arc<dyn LlmDriver>> {
    Ok(match settings.provider {
        Provider::Google => Arc::new(GoogleDriver::new(settings)?),
        Provider::OpenAi | Provider::Custom => Arc::new(OpenAiDriver::new(settings)?),
        Provider::Anthropic => Arc::new(AnthropicDriver::new(settings)?),
    })
}
