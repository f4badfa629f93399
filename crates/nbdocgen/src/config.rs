//! Configuration for description generation

use crate::error::{DocgenError, Result};
use std::env;
use std::time::Duration;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the API base URL
pub const API_BASE_ENV: &str = "OPENAI_API_BASE";
/// Environment variable holding the log filter
pub const LOG_LEVEL_ENV: &str = "LOGLEVEL";

/// API base URL used when `OPENAI_API_BASE` is unset
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Chat model every request is sent to
pub const CHAT_MODEL: &str = "gpt-3.5-turbo";
/// Instruction placed before each code cell
pub const DEFAULT_BASE_PROMPT: &str =
    "Please generate a two sentence markdown documentation for the given Python code.";
/// Log filter used when `LOGLEVEL` is unset
pub const DEFAULT_LOG_LEVEL: &str = "error";

/// Sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Nucleus sampling probability mass
pub const DEFAULT_TOP_P: f32 = 1.0;
/// Completion length cap, in tokens
pub const DEFAULT_MAX_TOKENS: u32 = 256;
/// Per-request timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Retries on transient failures
pub const DEFAULT_RETRIES: u32 = 2;
/// Upper bound accepted for `--retries`
pub const MAX_RETRIES: u32 = 10;

/// Pause after every generation request, to stay under the rate limit.
pub const REQUEST_PAUSE: Duration = Duration::from_secs(1);

/// Prompt and sampling parameters for one generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Instruction placed before the fenced code
    pub base_prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling probability mass
    pub top_p: f32,
    /// Maximum tokens in the completion
    pub max_tokens: u32,
}

impl Default for GeneratorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            base_prompt: DEFAULT_BASE_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Connection settings for the chat completions endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Bearer credential
    pub api_key: String,
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Extra attempts on transient failures
    pub retries: u32,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .finish()
    }
}

impl ClientConfig {
    /// Create a client configuration with the default endpoint
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `OPENAI_API_KEY`: API key (required, non-empty)
    /// - `OPENAI_API_BASE`: Base URL (default: `https://api.openai.com/v1`)
    ///
    /// # Errors
    ///
    /// Returns `Authentication` if `OPENAI_API_KEY` is unset or empty.
    pub fn from_env() -> Result<Self> {
        let api_key = api_key_from_env()?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = env::var(API_BASE_ENV) {
            if !base_url.is_empty() {
                config.base_url = base_url.trim_end_matches('/').to_string();
            }
        }
        Ok(config)
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of retries on transient failures
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Full URL of the chat completions endpoint
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Read the API key from `OPENAI_API_KEY`.
///
/// # Errors
///
/// Returns `Authentication` if the variable is unset or empty.
pub fn api_key_from_env() -> Result<String> {
    match env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(DocgenError::Authentication(format!(
            "{API_KEY_ENV} is not set"
        ))),
    }
}
