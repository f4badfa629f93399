//! `OpenAI` chat completions client for code cell descriptions.
//!
//! One request per code cell: a single user message holding the base prompt
//! followed by the code fenced as a Python block. Sampling parameters come
//! from [`GeneratorConfig`]; `frequency_penalty` and `presence_penalty` are
//! always zero.
//!
//! ## Failure handling
//!
//! Connect errors, timeouts, HTTP 429 and HTTP 5xx are retried with
//! exponential backoff (1s, 2s, 4s, ...) up to `ClientConfig::retries` extra
//! attempts. Anything else fails on the first attempt.
//!
//! ## Example
//!
//! ```no_run
//! use nbdocgen::{ClientConfig, GeneratorConfig, OpenAIClient};
//!
//! # async fn example() -> nbdocgen::Result<()> {
//! let client = OpenAIClient::new(ClientConfig::from_env()?, GeneratorConfig::default())?;
//! let text = client.describe_code("print(1)").await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

use crate::annotate::Describe;
use crate::config::{ClientConfig, GeneratorConfig, CHAT_MODEL};
use crate::error::{DocgenError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// `OpenAI` chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

/// `OpenAI` chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Outcome of a single failed attempt
#[derive(Debug)]
struct AttemptError {
    message: String,
    transient: bool,
}

impl AttemptError {
    fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }

    fn from_reqwest(e: &reqwest::Error) -> Self {
        Self {
            message: format!("Failed to send request to OpenAI: {e}"),
            transient: e.is_timeout() || e.is_connect(),
        }
    }
}

/// HTTP client for `OpenAI` chat completions
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    /// Reqwest HTTP client
    http_client: Client,
    /// Endpoint, credential and retry settings
    config: ClientConfig,
    /// Prompt and sampling parameters
    generation: GeneratorConfig,
}

impl OpenAIClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `GenerationService` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, generation: GeneratorConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DocgenError::GenerationService(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            config,
            generation,
        })
    }

    /// Request a description of `code`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationService` if every attempt fails, the service answers
    /// with a non-retryable status, or the response has no content.
    pub async fn describe_code(&self, code: &str) -> Result<String> {
        let prompt = build_prompt(&self.generation.base_prompt, code);
        self.chat_completion(prompt).await
    }

    /// Send one user message and return the first choice's text.
    ///
    /// # Errors
    ///
    /// See [`OpenAIClient::describe_code`].
    pub async fn chat_completion(&self, prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
            top_p: self.generation.top_p,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        let attempts = total_attempts(self.config.retries);
        let mut attempt = 1;
        loop {
            let start = Instant::now();
            match self.send_once(&request).await {
                Ok(content) => {
                    debug!(
                        "OpenAI responded in {}ms ({} chars)",
                        start.elapsed().as_millis(),
                        content.len()
                    );
                    return Ok(content);
                }
                Err(e) if e.transient && attempt < attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "Attempt {attempt}/{attempts} failed: {}; retrying in {delay:?}",
                        e.message
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(DocgenError::GenerationService(e.message)),
            }
        }
    }

    async fn send_once(
        &self,
        request: &ChatRequest<'_>,
    ) -> std::result::Result<String, AttemptError> {
        let response = self
            .http_client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AttemptError::from_reqwest(&e))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AttemptError::from_reqwest(&e))?;

        if !status.is_success() {
            return Err(AttemptError {
                message: format!("OpenAI API error ({status}): {response_text}"),
                transient: is_transient_status(status),
            });
        }

        parse_response(&response_text).map_err(AttemptError::fatal)
    }
}

impl Describe for OpenAIClient {
    async fn describe(&self, code: &str) -> Result<String> {
        self.describe_code(code).await
    }
}

/// Build the user message for one code cell.
#[must_use]
pub fn build_prompt(base_prompt: &str, code: &str) -> String {
    format!("{base_prompt}\n```python\n{code}\n```\n")
}

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s, ...
#[must_use]
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// First attempt plus `retries` retries
#[must_use]
pub const fn total_attempts(retries: u32) -> u32 {
    retries.saturating_add(1)
}

/// Whether an HTTP status is worth retrying
#[must_use]
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Extract the first choice's text from a response body.
fn parse_response(body: &str) -> std::result::Result<String, String> {
    let chat_response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| format!("Failed to parse OpenAI response: {e}"))?;

    let content = chat_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| "No choices in OpenAI response".to_string())?
        .message
        .content
        .ok_or_else(|| "No content in OpenAI response".to_string())?;

    if content.trim().is_empty() {
        return Err("Empty content in OpenAI response".to_string());
    }
    Ok(content)
}
