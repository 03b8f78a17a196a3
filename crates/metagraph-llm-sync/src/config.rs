//! LLM configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const OLLAMA_HOST_ENV: &str = "METAGRAPH_OLLAMA_HOST";
pub const OLLAMA_HOST_FALLBACK_ENV: &str = "OLLAMA_HOST";
pub const MODEL_ENV: &str = "METAGRAPH_LLM_MODEL";
pub const TIMEOUT_SECS_ENV: &str = "METAGRAPH_LLM_TIMEOUT_SECS";
pub const RETRIES_ENV: &str = "METAGRAPH_LLM_RETRIES";
pub const RETRY_DELAY_MS_ENV: &str = "METAGRAPH_LLM_RETRY_DELAY_MS";

pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}={value:?} ({expected})")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Base URL of the Ollama server, without a trailing slash.
    pub host: String,
    pub model: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            retry: RetryPolicy::default(),
        }
    }
}

impl LlmConfig {
    /// Load from environment variables; unset or blank variables keep defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get(OLLAMA_HOST_ENV).or_else(|| get(OLLAMA_HOST_FALLBACK_ENV)) {
            config.host = normalize_host(&host);
        }
        if let Some(model) = get(MODEL_ENV) {
            config.model = model.trim().to_string();
        }
        if let Some(secs) = get(TIMEOUT_SECS_ENV) {
            config.timeout = timeout_from_secs(parse_number(
                TIMEOUT_SECS_ENV,
                &secs,
                "integer seconds; 0 disables",
            )?);
        }
        if let Some(retries) = get(RETRIES_ENV) {
            config.retry.retries = parse_number(RETRIES_ENV, &retries, "non-negative integer")?;
        }
        if let Some(ms) = get(RETRY_DELAY_MS_ENV) {
            config.retry.delay =
                Duration::from_millis(parse_number(RETRY_DELAY_MS_ENV, &ms, "integer milliseconds")?);
        }
        Ok(config)
    }
}

/// `0` disables the timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs != 0).then(|| Duration::from_secs(secs))
}

/// Add a scheme when missing and drop trailing slashes; blank means default.
pub fn normalize_host(host: &str) -> String {
    let mut host = host.trim().to_string();
    if host.is_empty() {
        host = DEFAULT_OLLAMA_HOST.to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("http://{host}");
    }
    host.trim_end_matches('/').to_string()
}

fn parse_number<N: FromStr>(
    var: &'static str,
    value: &str,
    expected: &'static str,
) -> Result<N, ConfigError> {
    value.trim().parse::<N>().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
        expected,
    })
}
