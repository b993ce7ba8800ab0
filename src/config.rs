use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Med Conversation Assistant (Demo)";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_MODEL_NAME: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medassist=info,medassist_lib=info,tower_http=info"
}

/// Which model backend answers triage requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions over HTTP.
    OpenAi,
    /// Canned offline reply, no network.
    Mock,
}

impl LlmProvider {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown LLM_PROVIDER '{0}' (expected 'openai' or 'mock')")]
    UnknownProvider(String),

    #[error("Invalid LLM_TIMEOUT_SECS '{0}'")]
    InvalidTimeout(String),

    #[error("Invalid MEDASSIST_ADDR '{0}'")]
    InvalidAddress(String),
}

/// Process-wide configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_name: String,
    pub provider: LlmProvider,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Shared secret for `/chat`. `None` means no secret is required.
    pub demo_password: Option<String>,
    /// Opt-in diagnostic log of redacted messages. Off by default.
    pub allow_logging: bool,
    pub llm_timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = match non_empty("LLM_PROVIDER") {
            Some(raw) => LlmProvider::parse(&raw)?,
            None => LlmProvider::OpenAi,
        };

        let llm_timeout = match non_empty("LLM_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        };

        let addr_raw = non_empty("MEDASSIST_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = addr_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddress(addr_raw.clone()))?;

        Ok(Self {
            model_name: non_empty("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            provider,
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            demo_password: non_empty("DEMO_PASSWORD"),
            allow_logging: lookup("ALLOW_LOGGING").is_some_and(|v| is_truthy(&v)),
            llm_timeout,
            bind_addr,
        })
    }

    /// Offline configuration: mock provider, no secret, no diagnostic logging.
    pub fn offline() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            provider: LlmProvider::Mock,
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            demo_password: None,
            allow_logging: false,
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }

    pub fn require_password(&self) -> bool {
        self.demo_password.is_some()
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.model_name, "gpt-4o-mini");
        assert_eq!(config.provider, LlmProvider::OpenAi);
        assert!(config.demo_password.is_none());
        assert!(!config.require_password());
        assert!(!config.allow_logging);
        assert_eq!(config.llm_timeout, Duration::from_secs(60));
        assert_eq!(config.bind_addr.port(), 8000);
    }

    #[test]
    fn mock_provider_case_insensitive() {
        let config = config_from(&[("LLM_PROVIDER", " MOCK ")]).unwrap();
        assert_eq!(config.provider, LlmProvider::Mock);
    }

    #[test]
    fn unknown_provider_rejected() {
        let err = config_from(&[("LLM_PROVIDER", "carrier-pigeon")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(ref p) if p == "carrier-pigeon"));
    }

    #[test]
    fn blank_password_means_no_secret() {
        let config = config_from(&[("DEMO_PASSWORD", "   ")]).unwrap();
        assert!(!config.require_password());

        let config = config_from(&[("DEMO_PASSWORD", " hunter2 ")]).unwrap();
        assert_eq!(config.demo_password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn allow_logging_truthy_values() {
        for value in ["1", "true", "YES", "y", " on "] {
            let config = config_from(&[("ALLOW_LOGGING", value)]).unwrap();
            assert!(config.allow_logging, "expected truthy: {value:?}");
        }
        for value in ["0", "false", "no", "", "maybe"] {
            let config = config_from(&[("ALLOW_LOGGING", value)]).unwrap();
            assert!(!config.allow_logging, "expected falsy: {value:?}");
        }
    }

    #[test]
    fn invalid_timeout_rejected() {
        assert!(matches!(
            config_from(&[("LLM_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::InvalidTimeout(_))
        ));
        assert!(matches!(
            config_from(&[("LLM_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidTimeout(_))
        ));
        let config = config_from(&[("LLM_TIMEOUT_SECS", "5")]).unwrap();
        assert_eq!(config.llm_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_address_rejected() {
        assert!(matches!(
            config_from(&[("MEDASSIST_ADDR", "not-an-addr")]),
            Err(ConfigError::InvalidAddress(_))
        ));
    }

    #[test]
    fn offline_config_uses_mock() {
        let config = AppConfig::offline();
        assert_eq!(config.provider, LlmProvider::Mock);
        assert!(!config.require_password());
    }
}
