//! Configuration management for the Joy Nudge API.
//!
//! Configuration is layered, later sources winning:
//!
//! 1. Built-in defaults
//! 2. An optional config file (`config/joy-nudge.{toml,yaml,json}` or a path
//!    given on the command line)
//! 3. `JOY_NUDGE__*` environment variables (`JOY_NUDGE__SERVER__PORT=9000`)
//! 4. Well-known variables such as `JWT_SECRET` and `GEMINI_API_KEY`
//!
//! ```rust,ignore
//! use joy_nudge_api::config::{AppConfig, ConfigValidator};
//!
//! let config = AppConfig::load_unchecked()?;
//! ConfigValidator::validate(&config)?;
//! ```

pub mod error;
pub mod validator;

pub use error::{ConfigResult, ConfigurationError};
pub use validator::ConfigValidator;

use serde::{Deserialize, Serialize};

use crate::llm::{LlmSettings, Provider};

/// Default config file, resolved relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config/joy-nudge";

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Gateway configuration (auth, rate limiting).
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Persistence configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// LLM provider credentials.
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Model and sampling settings for nudge generation.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load and validate configuration from the default sources.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(None)
    }

    /// Load and validate configuration, reading `path` instead of the
    /// default config file when given.
    pub fn load_from(path: Option<&str>) -> anyhow::Result<Self> {
        let config = Self::load_unchecked_from(path)?;

        ConfigValidator::validate(&config)
            .map_err(|e| anyhow::anyhow!("Configuration validation failed:\n\n{e}"))?;

        Ok(config)
    }

    /// Load configuration without validation.
    pub fn load_unchecked() -> anyhow::Result<Self> {
        Self::load_unchecked_from(None)
    }

    /// Load configuration without validation from an explicit file.
    pub fn load_unchecked_from(path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("llm.model", default_model())?
            .set_default("llm.max_tokens", default_max_tokens())?
            .set_default("llm.temperature", f64::from(default_temperature()))?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("JOY_NUDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.apply_env_overrides();
        Ok(app_config)
    }

    /// Apply the well-known environment variables on top of loaded values.
    fn apply_env_overrides(&mut self) {
        if let Some(secret) = first_env(&["JWT_SECRET", "SUPABASE_JWT_SECRET"]) {
            self.gateway.jwt_secret = Some(secret);
        }
        if let Some(key) = first_env(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]) {
            self.providers.google.api_key = Some(key);
        }
        if let Some(key) = first_env(&["OPENAI_API_KEY"]) {
            self.providers.openai.api_key = Some(key);
        }
        if let Some(key) = first_env(&["ANTHROPIC_API_KEY"]) {
            self.providers.anthropic.api_key = Some(key);
        }
        if let Some(path) = first_env(&["DATABASE_PATH"]) {
            self.database.path = path;
        }
    }
}

/// First non-empty value among `names`.
fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// API port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    90
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HS256 secret shared with the identity provider.
    pub jwt_secret: Option<String>,
    /// Expected `aud` claim. Audience is not checked when unset.
    #[serde(default)]
    pub jwt_audience: Option<String>,
    /// Nudge generations allowed per user per minute.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    /// Rate limit burst size.
    #[serde(default = "default_rate_burst")]
    pub rate_limit_burst: u32,
}

fn default_rate_limit() -> u32 {
    30
}

fn default_rate_burst() -> u32 {
    5
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_audience: None,
            rate_limit_per_minute: default_rate_limit(),
            rate_limit_burst: default_rate_burst(),
        }
    }
}

/// Storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// File-backed SQLite.
    #[default]
    Sqlite,
    /// Volatile in-process store.
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// SQLite file path.
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Insert the shared nudge catalogue into an empty store.
    #[serde(default = "default_true")]
    pub seed_catalogue: bool,
}

fn default_database_path() -> String {
    "data/joy-nudge.sqlite".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            path: default_database_path(),
            seed_catalogue: true,
        }
    }
}

/// LLM provider credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub google: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
}

impl ProvidersConfig {
    /// Credentials for `provider`. Custom endpoints share the OpenAI entry.
    pub fn for_provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Google => &self.google,
            Provider::OpenAi | Provider::Custom => &self.openai,
            Provider::Anthropic => &self.anthropic,
        }
    }
}

/// Individual provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Base URL override.
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn has_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Model and sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Only sent to providers that support it.
    #[serde(default = "default_top_k")]
    pub top_k: Option<u32>,
    /// Outbound HTTP timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
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

#[allow(clippy::unnecessary_wraps, reason = "serde default for an optional field")]
fn default_top_k() -> Option<u32> {
    Some(40)
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    /// Resolve driver settings for the configured provider.
    pub fn settings(&self, providers: &ProvidersConfig) -> LlmSettings {
        let credentials = providers.for_provider(self.provider);
        let base_url = credentials
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_base_url().to_string());

        LlmSettings {
            base_url,
            api_key: credentials.api_key.clone(),
            model: self.model.clone(),
            provider: self.provider,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const OVERRIDE_VARS: [&str; 7] = [
        "JWT_SECRET",
        "SUPABASE_JWT_SECRET",
        "GEMINI_API_KEY",
        "GOOGLE_API_KEY",
        "OPENAI_API_KEY",
        "ANTHROPIC_API_KEY",
        "DATABASE_PATH",
    ];

    fn clear_env() {
        for name in OVERRIDE_VARS {
            // SAFETY: serial tests, no other thread reads the environment.
            unsafe { std::env::remove_var(name) };
        }
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.gateway.rate_limit_per_minute, 30);
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
        assert!(config.database.seed_catalogue);
        assert_eq!(config.llm.provider, Provider::Google);
        assert_eq!(config.llm.top_k, Some(40));
    }

    #[test]
    fn test_settings_resolve_provider_credentials() {
        let mut providers = ProvidersConfig::default();
        providers.anthropic.api_key = Some("sk-ant".into());

        let llm = LlmConfig {
            provider: Provider::Anthropic,
            model: "claude-haiku".into(),
            ..LlmConfig::default()
        };
        let settings = llm.settings(&providers);
        assert_eq!(settings.base_url, "https://api.anthropic.com");
        assert_eq!(settings.api_key.as_deref(), Some("sk-ant"));
        assert_eq!(settings.model, "claude-haiku");

        providers.openai.base_url = Some("http://localhost:11434".into());
        let custom = LlmConfig {
            provider: Provider::Custom,
            ..LlmConfig::default()
        };
        assert_eq!(custom.settings(&providers).base_url, "http://localhost:11434");
    }

    #[test]
    #[serial]
    fn test_env_overrides_take_precedence() {
        clear_env();
        // SAFETY: serial test.
        unsafe {
            std::env::set_var("SUPABASE_JWT_SECRET", "from-supabase");
            std::env::set_var("GOOGLE_API_KEY", "g-key");
            std::env::set_var("DATABASE_PATH", "/tmp/joy.sqlite");
        }

        let mut config = AppConfig::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.gateway.jwt_secret.as_deref(), Some("from-supabase"));
        assert_eq!(config.providers.google.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.database.path, "/tmp/joy.sqlite");
        assert!(config.providers.openai.api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_load_from_explicit_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[database]\ndriver = \"memory\"\n\n[llm]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\n\n[gateway]\njwt_secret = \"file-secret\""
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config = AppConfig::load_unchecked_from(Some(&path)).unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.database.driver, DatabaseDriver::Memory);
        assert_eq!(config.llm.provider, Provider::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.gateway.jwt_secret.as_deref(), Some("file-secret"));
    }
}
