//! Test Harness
//!
//! Temp-database lifecycle management for journey tests. Each harness owns
//! its own SQLite file inside a TempDir so tests are fully isolated and
//! parallel-safe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use trove_core::embeddings::{Embedder, Embedding, EmbeddingError};
use trove_core::{DeterministicEmbedder, RemoteEmbedder, SearchEngine, Storage};

/// An isolated database plus the shared handles journey tests need
pub struct TestDb {
    /// Shared repository
    pub storage: Arc<Storage>,
    _dir: TempDir,
}

impl TestDb {
    /// Create a fresh database in a temp directory
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let storage = Arc::new(
            Storage::new(Some(dir.path().join("e2e.db"))).expect("open storage"),
        );
        Self {
            storage,
            _dir: dir,
        }
    }

    /// Engine whose primary provider is the healthy stand-in model
    pub fn engine(&self) -> SearchEngine {
        SearchEngine::new(self.storage.clone(), Arc::new(StubModelEmbedder::new()))
    }

    /// Engine whose primary provider is unreachable, forcing every search
    /// onto the degraded deterministic path
    pub fn engine_with_dead_embedder(&self) -> SearchEngine {
        let remote = RemoteEmbedder::new("http://127.0.0.1:1")
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(200));
        SearchEngine::new(self.storage.clone(), Arc::new(remote))
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}

/// Stands in for the remote sentence model: deterministic, but
/// distinguishable from the degraded fallback because it embeds a
/// namespaced variant of the text.
pub struct StubModelEmbedder {
    inner: DeterministicEmbedder,
}

impl StubModelEmbedder {
    pub fn new() -> Self {
        Self {
            inner: DeterministicEmbedder::new(),
        }
    }

    /// Synchronous form used by fixtures when seeding stored vectors
    pub fn embed_text(&self, text: &str) -> Embedding {
        self.inner.embed_text(&format!("model::{text}"))
    }
}

impl Default for StubModelEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for StubModelEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("text cannot be empty".into()));
        }
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn model_tag(&self) -> &str {
        "stub-model-v1"
    }
}
