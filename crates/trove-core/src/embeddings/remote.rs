//! Remote Sentence-Embedding Provider
//!
//! Talks to a separately deployed embedding service over HTTP. The first
//! call tolerates a cold model (long timeout); once a call has succeeded
//! the deadline tightens so a stalled backend degrades the request quickly
//! instead of stalling it.
//!
//! A failure here is always RECOVERABLE: the orchestrator falls back to the
//! deterministic provider for the request and the product keeps its
//! not-yet-embedded state until a later batch run succeeds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Embedder, Embedding, EmbeddingError, EMBEDDING_DIMENSIONS};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Timeout for the first call, while the model may still be loading
pub const DEFAULT_COLD_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout once the service has answered at least once
pub const DEFAULT_WARM_TIMEOUT: Duration = Duration::from_secs(2);

/// Model tag persisted for audit when this provider produced the vector
const REMOTE_MODEL_TAG: &str = "sentence-transformer-384";

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

// ============================================================================
// REMOTE EMBEDDER
// ============================================================================

/// HTTP client for the sentence-embedding service
pub struct RemoteEmbedder {
    client: reqwest::Client,
    endpoint: String,
    cold_timeout: Duration,
    warm_timeout: Duration,
    warmed: AtomicBool,
}

impl RemoteEmbedder {
    /// Create a client against the service base URL (e.g. the value of
    /// `EMBEDDING_SERVICE_URL`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/embed", base.trim_end_matches('/')),
            cold_timeout: DEFAULT_COLD_TIMEOUT,
            warm_timeout: DEFAULT_WARM_TIMEOUT,
            warmed: AtomicBool::new(false),
        }
    }

    /// Override the cold/warm timeouts (tests, operator tuning)
    pub fn with_timeouts(mut self, cold: Duration, warm: Duration) -> Self {
        self.cold_timeout = cold;
        self.warm_timeout = warm;
        self
    }

    /// Whether at least one call has succeeded
    pub fn is_warm(&self) -> bool {
        self.warmed.load(Ordering::Relaxed)
    }

    fn current_timeout(&self) -> Duration {
        if self.is_warm() {
            self.warm_timeout
        } else {
            self.cold_timeout
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.current_timeout())
            .json(&EmbedRequest { texts })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::ServiceUnavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ServiceUnavailable(format!(
                "embedding service returned {}",
                response.status()
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::BadResponse(e.to_string()))?;

        if body.embeddings.len() != texts.len() {
            return Err(EmbeddingError::BadResponse(format!(
                "asked for {} embeddings, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }

        let mut embeddings = Vec::with_capacity(body.embeddings.len());
        for vector in body.embeddings {
            if vector.len() != EMBEDDING_DIMENSIONS {
                return Err(EmbeddingError::BadResponse(format!(
                    "expected {} dimensions, got {}",
                    EMBEDDING_DIMENSIONS,
                    vector.len()
                )));
            }
            // The index requires unit vectors regardless of what the service returns
            let mut embedding = Embedding::new(vector);
            embedding.normalize();
            embeddings.push(embedding);
        }

        self.warmed.store(true, Ordering::Relaxed);
        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("text cannot be empty".to_string()));
        }
        let texts = [text.to_string()];
        let mut embeddings = self.request(&texts).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::BadResponse("empty embedding list".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.request(texts).await
    }

    fn model_tag(&self) -> &str {
        REMOTE_MODEL_TAG
    }
}

// ============================================================================
// TESTS
// ============================================================================
