//! Startup validation of the loaded configuration.

use super::error::{ConfigResult, ConfigurationError};
use super::{AppConfig, DatabaseDriver};

/// Checks the configuration before the server starts.
///
/// | Check                     | Outcome       |
/// |---------------------------|---------------|
/// | JWT secret missing        | error         |
/// | temperature outside 0..=2 | error         |
/// | top_p outside 0..=1       | error         |
/// | rate limit of zero        | error         |
/// | sqlite path empty         | error         |
/// | no key for the provider   | warning only  |
#[derive(Debug)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire application configuration, collecting every error.
    pub fn validate(config: &AppConfig) -> ConfigResult<()> {
        let checks = [
            Self::validate_gateway(config),
            Self::validate_sampling(config),
            Self::validate_database(config),
        ];

        let errors: Vec<_> = checks
            .into_iter()
            .filter_map(Result::err)
            .flat_map(|e| match e {
                ConfigurationError::Multiple(errs) => errs,
                e => vec![e],
            })
            .collect();

        Self::warn_missing_llm_key(config);

        match ConfigurationError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Bearer tokens cannot be verified without a secret.
    pub fn validate_gateway(config: &AppConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        let has_secret = config
            .gateway
            .jwt_secret
            .as_ref()
            .is_some_and(|s| !s.trim().is_empty());
        if !has_secret {
            errors.push(ConfigurationError::missing_required(
                "JWT secret",
                "Validating bearer tokens on every authenticated endpoint",
                "JWT_SECRET or SUPABASE_JWT_SECRET",
            ));
        }

        if config.gateway.rate_limit_per_minute == 0 || config.gateway.rate_limit_burst == 0 {
            errors.push(ConfigurationError::invalid(
                "gateway rate limit must be greater than zero",
                "Set JOY_NUDGE__GATEWAY__RATE_LIMIT_PER_MINUTE and \
                JOY_NUDGE__GATEWAY__RATE_LIMIT_BURST to positive integers",
            ));
        }

        ConfigurationError::collect(errors).map_or(Ok(()), Err)
    }

    /// Sampling parameters must be in the ranges every provider accepts.
    pub fn validate_sampling(config: &AppConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();
        let llm = &config.llm;

        if !(0.0..=2.0).contains(&llm.temperature) {
            errors.push(ConfigurationError::invalid(
                format!("llm.temperature is {}", llm.temperature),
                "Set JOY_NUDGE__LLM__TEMPERATURE to a value between 0.0 and 2.0",
            ));
        }
        if !(0.0..=1.0).contains(&llm.top_p) {
            errors.push(ConfigurationError::invalid(
                format!("llm.top_p is {}", llm.top_p),
                "Set JOY_NUDGE__LLM__TOP_P to a value between 0.0 and 1.0",
            ));
        }
        if llm.top_k == Some(0) {
            errors.push(ConfigurationError::invalid(
                "llm.top_k is 0",
                "Remove JOY_NUDGE__LLM__TOP_K or set it to a positive integer",
            ));
        }
        if llm.max_tokens == 0 {
            errors.push(ConfigurationError::invalid(
                "llm.max_tokens is 0",
                "Set JOY_NUDGE__LLM__MAX_TOKENS to a positive integer",
            ));
        }

        ConfigurationError::collect(errors).map_or(Ok(()), Err)
    }

    pub fn validate_database(config: &AppConfig) -> ConfigResult<()> {
        if config.database.driver == DatabaseDriver::Sqlite && config.database.path.trim().is_empty()
        {
            return Err(ConfigurationError::missing_required(
                "SQLite database path",
                "Persisting profiles, nudges and activity",
                "DATABASE_PATH or JOY_NUDGE__DATABASE__PATH",
            ));
        }
        Ok(())
    }

    /// A missing key is not fatal: generation requests fail, everything else works.
    pub fn warn_missing_llm_key(config: &AppConfig) -> bool {
        let provider = config.llm.provider;
        let has_key = config.providers.for_provider(provider).has_key();
        if !has_key {
            tracing::warn!(
                provider = provider.as_str(),
                "No API key configured for the LLM provider; nudge generation will fail. \
                Set GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY"
            );
        }
        has_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.gateway.jwt_secret = Some("test-secret".into());
        config.providers.google.api_key = Some("key".into());
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(ConfigValidator::validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_jwt_secret_fails() {
        let mut config = valid_config();
        config.gateway.jwt_secret = Some("   ".into());
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_sampling_ranges() {
        let mut config = valid_config();
        config.llm.temperature = 2.5;
        config.llm.top_p = 1.5;
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(err.count(), 2);

        config.llm.temperature = 0.0;
        config.llm.top_p = 1.0;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_errors_are_aggregated_across_sections() {
        let mut config = AppConfig::default();
        config.gateway.rate_limit_per_minute = 0;
        config.llm.max_tokens = 0;
        config.database.path = String::new();

        let err = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(err.count(), 4);
    }

    #[test]
    fn test_memory_driver_needs_no_path() {
        let mut config = valid_config();
        config.database.driver = DatabaseDriver::Memory;
        config.database.path = String::new();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_missing_llm_key_is_only_a_warning() {
        let mut config = valid_config();
        config.llm.provider = Provider::Anthropic;
        assert!(!ConfigValidator::warn_missing_llm_key(&config));
        assert!(ConfigValidator::validate(&config).is_ok());
    }
}
