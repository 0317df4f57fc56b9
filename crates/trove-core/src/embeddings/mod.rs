//! Semantic Embeddings Module
//!
//! Maps text to fixed-dimension unit vectors so cosine reduces to a dot
//! product. Two providers are supported:
//! - Remote sentence-embedding service (primary, reference dimension 384)
//! - Deterministic pure-function fallback for development and degraded mode
//!
//! Vectors are persisted as JSON arrays of floats; that array format is the
//! only serialization the core commits to.

mod deterministic;
mod remote;

pub use deterministic::DeterministicEmbedder;
pub use remote::{RemoteEmbedder, DEFAULT_COLD_TIMEOUT, DEFAULT_WARM_TIMEOUT};

use async_trait::async_trait;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Embedding dimensions in the reference deployment
pub const EMBEDDING_DIMENSIONS: usize = 384;

/// Maximum query length in Unicode characters
pub const MAX_QUERY_CHARS: usize = 500;

/// Tolerance for the unit-norm invariant on stored vectors
pub const UNIT_NORM_EPSILON: f32 = 1e-6;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Embedding error types
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum EmbeddingError {
    /// The embedding backend could not be reached
    ServiceUnavailable(String),
    /// The embedding call exceeded its deadline
    Timeout,
    /// The backend answered with something unusable
    BadResponse(String),
    /// Invalid input (empty, over-length)
    InvalidInput(String),
}

impl std::fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingError::ServiceUnavailable(e) => write!(f, "Embedding service unavailable: {}", e),
            EmbeddingError::Timeout => write!(f, "Embedding call timed out"),
            EmbeddingError::BadResponse(e) => write!(f, "Bad embedding response: {}", e),
            EmbeddingError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
        }
    }
}

impl std::error::Error for EmbeddingError {}

// ============================================================================
// EMBEDDING TYPE
// ============================================================================

/// A semantic embedding vector
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector
    pub vector: Vec<f32>,
    /// Dimensions of the vector
    pub dimensions: usize,
}

impl Embedding {
    /// Create a new embedding from a vector
    pub fn new(vector: Vec<f32>) -> Self {
        let dimensions = vector.len();
        Self { vector, dimensions }
    }

    /// Compute cosine similarity with another embedding
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        cosine_similarity(&self.vector, &other.vector)
    }

    /// Normalize the embedding vector to unit length
    pub fn normalize(&mut self) {
        let norm = self.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut self.vector {
                *x /= norm;
            }
        }
    }

    /// Check the unit-norm invariant (|v| = 1 ± 1e-6)
    pub fn is_unit_length(&self) -> bool {
        let norm = self.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        (norm - 1.0).abs() <= UNIT_NORM_EPSILON * 10.0 + f32::EPSILON * self.dimensions as f32
    }

    /// Serialize to the persisted JSON-array format
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.vector).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse from the persisted JSON-array format
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str::<Vec<f32>>(json).ok().map(Self::new)
    }
}

// ============================================================================
// EMBEDDING PROVIDER
// ============================================================================

/// Pluggable text → unit-vector provider.
///
/// Both implementations return L2-normalized vectors of [`EMBEDDING_DIMENSIONS`]
/// floats. The remote provider can fail or time out; the deterministic one
/// cannot.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Embed a batch of texts, preserving order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Identifier persisted alongside stored vectors for audit
    fn model_tag(&self) -> &str;

    /// Output dimensionality
    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }
}

// ============================================================================
// SIMILARITY FUNCTIONS
// ============================================================================

/// Compute cosine similarity between two vectors.
///
/// Dimension-mismatched or zero-norm inputs yield 0, never an error.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator > 0.0 {
        dot_product / denominator
    } else {
        0.0
    }
}

/// Compute dot product between two vectors
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![1.0, 2.0, 3.0];
        let zero = vec![0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch_is_zero() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&b, &a), 0.0);
    }

    #[test]
    fn test_embedding_normalize() {
        let mut emb = Embedding::new(vec![3.0, 4.0]);
        emb.normalize();
        assert!(emb.is_unit_length());
        assert!((emb.vector[0] - 0.6).abs() < 1e-5);
        assert!((emb.vector[1] - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_embedding_json_roundtrip() {
        let original = Embedding::new(vec![0.25, -0.5, 0.75]);
        let json = original.to_json();
        assert!(json.starts_with('['));
        let restored = Embedding::from_json(&json).unwrap();
        assert_eq!(original.vector, restored.vector);
        assert!(Embedding::from_json("not json").is_none());
    }
}
