//! OpenAI-compatible chat completions client with bounded retry.
//!
//! Every call asks for a JSON object response. Failed attempts are retried
//! with exponential backoff; terminal client errors abort immediately.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use questionbuilder_shared::{AppConfig, QuestionBuilderError, Result, RetryPolicy};

/// User-Agent string for LLM requests.
const USER_AGENT: &str = concat!("questionbuilder/", env!("CARGO_PKG_VERSION"));

/// Maximum number of error-body characters kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/// One system + user exchange.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub temperature: f32,
    pub system: &'a str,
    pub user: &'a str,
}

/// A successful completion.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    /// Trimmed message content (never empty).
    pub content: String,
    pub total_tokens: u64,
    /// Attempts used, including the successful one.
    pub attempts: u32,
    pub latency_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u64,
}

/// Chat completions client.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl ChatClient {
    /// Create a client for `<base_url>/chat/completions`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/chat/completions")).map_err(|e| {
            QuestionBuilderError::config(format!("invalid LLM base URL '{base_url}': {e}"))
        })?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| QuestionBuilderError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            api_key: api_key.into(),
            retry,
        })
    }

    /// Create a client from the application config.
    pub fn from_config(config: &AppConfig, api_key: impl Into<String>) -> Result<Self> {
        Self::new(
            &config.openai.base_url,
            api_key,
            Duration::from_secs(config.openai.timeout_secs),
            RetryPolicy::from(&config.retry),
        )
    }

    /// Send the request, retrying transient failures.
    pub async fn complete_json(&self, request: &ChatRequest<'_>) -> Result<ChatCompletion> {
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.send_once(request).await {
                Ok((content, total_tokens)) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    info!(
                        model = request.model,
                        duration_ms = latency_ms,
                        tokens = total_tokens,
                        attempt,
                        "chat completion done"
                    );
                    return Ok(ChatCompletion {
                        content,
                        total_tokens,
                        attempts: attempt,
                        latency_ms,
                    });
                }
                Err(e) if e.is_terminal() => {
                    warn!(attempt, error = %e, "chat completion aborted");
                    return Err(e);
                }
                Err(e) if attempt >= self.retry.max_attempts => {
                    warn!(attempt, error = %e, "chat completion failed, retries exhausted");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "retrying chat completion"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// A single HTTP round trip. Returns the trimmed content and token usage.
    async fn send_once(&self, request: &ChatRequest<'_>) -> Result<(String, u64)> {
        let body = serde_json::json!({
            "model": request.model,
            "temperature": request.temperature,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "response_format": { "type": "json_object" },
        });

        debug!(endpoint = %self.endpoint, model = request.model, "sending chat completion");

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| QuestionBuilderError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| QuestionBuilderError::Network(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(QuestionBuilderError::Api {
                status: status.as_u16(),
                message: truncate(&text, MAX_ERROR_BODY),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            QuestionBuilderError::parse(format!("invalid chat completion response: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(QuestionBuilderError::parse("empty output from LLM"));
        }

        let tokens = parsed.usage.map_or(0, |u| u.total_tokens);
        Ok((content, tokens))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
