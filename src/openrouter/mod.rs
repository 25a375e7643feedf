#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::Config;
use crate::history::Message;
use crate::retrieval::Embedder;

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Client for an OpenAI-compatible API (OpenRouter by default), covering
/// both chat completions and embeddings.
///
/// Constructed once per session and reused for every call; the underlying
/// agent holds the connection pool. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    base_url: Url,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    batch_size: u32,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

/// One parsed server-sent-events line from a streaming completion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StreamEvent {
    /// A text fragment to append to the reply.
    Delta(String),
    /// End-of-stream marker.
    Done,
}

impl OpenRouterClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .openrouter
            .endpoint_url()
            .context("Failed to parse API base URL from config")?;

        let api_key = std::env::var(&config.openrouter.api_key_env).with_context(|| {
            format!(
                "API key not found; set the {} environment variable",
                config.openrouter.api_key_env
            )
        })?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key,
            chat_model: config.openrouter.chat_model.clone(),
            embedding_model: config.openrouter.embedding_model.clone(),
            batch_size: config.openrouter.batch_size,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Check that the API endpoint is reachable with the configured key.
    #[inline]
    pub fn ping(&self) -> Result<()> {
        let url = self.endpoint("models")?;
        debug!("Pinging API at {}", url);

        self.request_with_retry(|| {
            self.agent
                .get(url.as_str())
                .header("Authorization", format!("Bearer {}", self.api_key))
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Failed to reach API endpoint")?;

        debug!("API ping successful");
        Ok(())
    }

    /// Run a chat completion and return the full reply at once.
    #[inline]
    pub fn complete(&self, messages: &[Message]) -> Result<String> {
        debug!(
            "Requesting completion from {} ({} messages)",
            self.chat_model,
            messages.len()
        );

        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            stream: false,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;
        let url = self.endpoint("chat/completions")?;

        let response_text = self
            .request_with_retry(|| {
                self.post_json(&url, &request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Chat completion request failed")?;

        let response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("Chat response contained no choices")
    }

    /// Run a streaming chat completion, forwarding each text fragment to
    /// `on_delta` as it arrives. Returns the accumulated full reply.
    #[inline]
    pub fn stream_chat<F>(&self, messages: &[Message], mut on_delta: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        debug!(
            "Requesting streamed completion from {} ({} messages)",
            self.chat_model,
            messages.len()
        );

        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            stream: true,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;
        let url = self.endpoint("chat/completions")?;

        let mut response = self
            .post_json(&url, &request_json)
            .context("Streaming chat completion request failed")?;

        let reader = BufReader::new(response.body_mut().as_reader());
        let mut full_reply = String::new();

        for line in reader.lines() {
            let line = line.context("Failed to read completion stream")?;
            match parse_stream_line(&line) {
                Some(StreamEvent::Done) => break,
                Some(StreamEvent::Delta(fragment)) => {
                    on_delta(&fragment);
                    full_reply.push_str(&fragment);
                }
                None => {}
            }
        }

        debug!("Streamed reply complete ({} chars)", full_reply.len());
        Ok(full_reply)
    }

    /// Generate embeddings for multiple texts, splitting the request into
    /// server-sized batches. Output order matches input order.
    #[inline]
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size as usize) {
            let batch_vectors = self
                .embed_single_batch(batch)
                .with_context(|| format!("Failed to embed batch of {} texts", batch.len()))?;
            vectors.extend(batch_vectors);
        }

        debug!("Generated {} embeddings total", vectors.len());
        Ok(vectors)
    }

    fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embeddings request")?;
        let url = self.endpoint("embeddings")?;

        let response_text = self
            .request_with_retry(|| {
                self.post_json(&url, &request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Embeddings request failed")?;

        let mut response: EmbeddingsResponse =
            serde_json::from_str(&response_text).context("Failed to parse embeddings response")?;

        if response.data.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.data.len()
            ));
        }

        // The API may return rows out of order; the index field is canonical.
        response.data.sort_by_key(|row| row.index);

        Ok(response.data.into_iter().map(|row| row.embedding).collect())
    }

    fn post_json(
        &self,
        url: &Url,
        body: &str,
    ) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        self.agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send(body)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .with_context(|| format!("Failed to build endpoint URL for {path}"))
    }

    fn request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow::anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false
                        }
                    };

                    if !should_retry {
                        return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow::anyhow!("Request error: {}", error));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.base_url);

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }
}

impl Embedder for OpenRouterClient {
    #[inline]
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_batch(texts)
    }
}

/// Parse one line of a server-sent-events completion stream.
///
/// Lines look like `data: {json}`, with `data: [DONE]` terminating the
/// stream. Blank lines, comments, and undecodable payloads are skipped; a
/// malformed fragment degrades the reply rather than aborting it.
fn parse_stream_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix("data:")?.trim();

    if payload == "[DONE]" {
        return Some(StreamEvent::Done);
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(StreamEvent::Delta),
        Err(e) => {
            warn!("Skipping undecodable stream fragment: {}", e);
            None
        }
    }
}
