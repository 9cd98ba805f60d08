//! # Embeddings Provider
//!
//! Turns text into fixed-length vectors by calling an external embeddings API.
//! OpenAI-compatible endpoints are the default; Gemini endpoints are detected
//! from the URL. Transient failures are retried with exponential backoff.

use crate::{
    constants::{
        DEFAULT_EMBEDDING_BASE_DELAY_MS, DEFAULT_EMBEDDING_MAX_ATTEMPTS,
        DEFAULT_EMBEDDING_MAX_DELAY_MS,
    },
    errors::PromptError,
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};
use tracing::{debug, warn};

/// Anything that can embed a piece of text.
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptError>;
}

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize, Debug)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

// --- Gemini-specific request and response structures ---

#[derive(Serialize, Debug)]
struct GeminiEmbeddingRequest<'a> {
    model: String,
    content: GeminiEmbeddingContent<'a>,
}

#[derive(Serialize, Debug)]
struct GeminiEmbeddingContent<'a> {
    parts: Vec<GeminiEmbeddingPart<'a>>,
}

#[derive(Serialize, Debug)]
struct GeminiEmbeddingPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct GeminiEmbeddingResponse {
    embedding: GeminiEmbeddingValue,
}

#[derive(Deserialize, Debug)]
struct GeminiEmbeddingValue {
    values: Vec<f32>,
}

/// The payload shape an endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    OpenAi,
    Gemini,
}

impl Dialect {
    fn for_url(api_url: &str) -> Self {
        if api_url.contains("generativelanguage.googleapis.com") {
            Dialect::Gemini
        } else {
            Dialect::OpenAi
        }
    }
}

/// Exponential backoff settings for transient embedding failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_EMBEDDING_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_EMBEDDING_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_EMBEDDING_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// The pause before retry number `attempt` (1-based), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// An [`Embedder`] backed by an HTTP embeddings endpoint.
#[derive(Clone, Debug)]
pub struct HttpEmbedder {
    client: ReqwestClient,
    dialect: Dialect,
    api_url: String,
    model: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl HttpEmbedder {
    pub fn new(
        api_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            dialect: Dialect::for_url(&api_url),
            api_url,
            model,
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, PromptError> {
        let key = self.api_key.as_deref().filter(|k| !k.is_empty());
        let mut request_builder = self.client.post(&self.api_url);
        match self.dialect {
            Dialect::OpenAi => {
                request_builder = request_builder.json(&EmbeddingRequest {
                    model: &self.model,
                    input: text,
                });
                if let Some(key) = key {
                    request_builder = request_builder.bearer_auth(key);
                }
            }
            Dialect::Gemini => {
                // Gemini wants the model prefixed with "models/" in the payload.
                let model = if self.model.starts_with("models/") {
                    self.model.clone()
                } else {
                    format!("models/{}", self.model)
                };
                request_builder = request_builder.json(&GeminiEmbeddingRequest {
                    model,
                    content: GeminiEmbeddingContent {
                        parts: vec![GeminiEmbeddingPart { text }],
                    },
                });
                if let Some(key) = key {
                    request_builder = request_builder.header("x-goog-api-key", key);
                }
            }
        }

        let response = request_builder
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi {
                status: status.as_u16(),
                body,
            });
        }

        let embedding = match self.dialect {
            Dialect::OpenAi => response
                .json::<EmbeddingResponse>()
                .await
                .map_err(PromptError::AiDeserialization)?
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding),
            Dialect::Gemini => Some(
                response
                    .json::<GeminiEmbeddingResponse>()
                    .await
                    .map_err(PromptError::AiDeserialization)?
                    .embedding
                    .values,
            ),
        };

        embedding
            .filter(|embedding| !embedding.is_empty())
            .ok_or(PromptError::EmptyEmbedding)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.embed_once(text).await {
                Ok(embedding) => {
                    debug!(dimension = embedding.len(), attempt, "Embedding generated");
                    return Ok(embedding);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        ?delay,
                        "Embedding request failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
