//! Deterministic Fallback Embedder
//!
//! A pure text → vector map used in development and whenever the remote
//! model is unreachable or a product lacks a stored vector at query time.
//!
//! Properties:
//! - Stable: same input yields the same output across restarts and processes
//! - Unit-length output of the configured dimension
//! - O(|text| · D)
//!
//! The cosine scores it produces are far weaker than real sentence
//! embeddings; the ranker compensates with feature scores and the keyword
//! boost.

use async_trait::async_trait;

use super::{Embedder, Embedding, EmbeddingError, EMBEDDING_DIMENSIONS};

/// Model tag persisted for audit when this provider produced the vector
pub const DETERMINISTIC_MODEL_TAG: &str = "deterministic-v1";

// ============================================================================
// DETERMINISTIC EMBEDDER
// ============================================================================

/// Pure-function embedding provider
#[derive(Debug, Clone)]
pub struct DeterministicEmbedder {
    dimensions: usize,
}

impl Default for DeterministicEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeterministicEmbedder {
    /// Create a provider with the reference dimensionality
    pub fn new() -> Self {
        Self {
            dimensions: EMBEDDING_DIMENSIONS,
        }
    }

    /// Create a provider with a custom dimensionality (tests, experiments)
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Embed a text synchronously.
    ///
    /// For each output index i: v_i = tanh(0.001 · Σ_j cp(t_j) · sin(0.01 · (i+1) · (j+1)))
    /// over the lowercased codepoints, then L2-normalize.
    pub fn embed_text(&self, text: &str) -> Embedding {
        let lowered = text.to_lowercase();
        let codepoints: Vec<f64> = lowered.chars().map(|c| c as u32 as f64).collect();

        let mut vector = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut sum = 0.0_f64;
            for (j, cp) in codepoints.iter().enumerate() {
                sum += cp * (0.01 * (i as f64 + 1.0) * (j as f64 + 1.0)).sin();
            }
            vector.push((0.001 * sum).tanh() as f32);
        }

        let mut embedding = Embedding::new(vector);
        embedding.normalize();
        embedding
    }
}

#[async_trait]
impl Embedder for DeterministicEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("text cannot be empty".to_string()));
        }
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn model_tag(&self) -> &str {
        DETERMINISTIC_MODEL_TAG
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ============================================================================
// TESTS
// ============================================================================
