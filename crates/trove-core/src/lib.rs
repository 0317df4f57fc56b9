//! # Trove Core
//!
//! Explainable product discovery engine:
//!
//! - **Semantic Search**: query/product embeddings over a pluggable provider
//!   (remote sentence-embedding service with a deterministic fallback)
//! - **Explainable Ranking**: a linear re-ranker combining semantic
//!   similarity with rating, price, stock and recency features under
//!   operator-tunable weights, with a per-result score decomposition and
//!   matched-term justification
//! - **Recommendations**: session-affinity, item-similar and trending
//!   algorithms over an anonymous interaction store
//! - **IR Evaluation**: offline nDCG/Recall/Precision/MRR/AP with an
//!   automatic relevance-judgment synthesizer for unlabelled queries
//! - **Auditability**: every executed query persists its embedding, scores
//!   and explanations, and can be replayed bit-for-bit
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trove_core::{RemoteEmbedder, SearchEngine, SearchRequest, Storage};
//!
//! let storage = Arc::new(Storage::new(None)?);
//! let embedder = Arc::new(RemoteEmbedder::new("http://127.0.0.1:8089"));
//! let engine = SearchEngine::new(storage, embedder);
//!
//! let response = engine
//!     .search(&SearchRequest {
//!         query: "wireless bluetooth headphones".into(),
//!         session_id: None,
//!         filters: Default::default(),
//!         limit: 10,
//!     })
//!     .await?;
//! ```
//!
//! The HTTP transport, authentication and the admin UI live outside this
//! crate; it is consumed as a library behind them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod catalog;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod eval;
pub mod ranking;
pub mod recommend;
pub mod search;
pub mod session;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Catalog types
pub use catalog::{
    Availability, CatalogStats, CatalogUploadJob, Interaction, InteractionInput, InteractionKind,
    JobStatus, Product, ProductInput, ProductPatch, SearchFilters, Session, SESSION_TTL_DAYS,
};

// Configuration
pub use config::{Config, ConfigError, DEFAULT_EMBEDDING_SERVICE_URL};

// Embeddings
pub use embeddings::{
    cosine_similarity, dot_product, DeterministicEmbedder, Embedder, Embedding, EmbeddingError,
    RemoteEmbedder, EMBEDDING_DIMENSIONS, MAX_QUERY_CHARS,
};

// Errors
pub use error::{EngineError, Result};

// Evaluation
pub use eval::{
    evaluate, evaluate_with_threshold, synthesize_judgments, IrMetrics, Judgment, MetricKind,
    ResultEntry,
};

// Ranking
pub use ranking::{
    rank, RankCandidate, RankOptions, RankedResult, RankingWeights, SubScores, WeightsUpdate,
    DEFAULT_MIN_SCORE, RANKING_FORMULA,
};

// Recommendations
pub use recommend::{Recommendation, Recommender};

// Search
pub use search::{
    CancelFlag, EngineConfig, MetricsSummary, ScanFilter, SearchEngine, SearchRequest,
    SearchResponse, VectorIndex, MAX_SEARCH_LIMIT,
};

// Session tracking
pub use session::SessionTracker;

// Storage layer
pub use storage::{
    EvaluationMetric, NewMetric, NewSearchLog, SearchLog, SearchResultExplanation, Storage,
    StorageError,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Availability, EngineError, InteractionInput, InteractionKind, Product, ProductInput,
        RankedResult, RankingWeights, Recommendation, Recommender, Result, SearchEngine,
        SearchFilters, SearchRequest, SearchResponse, Session, SessionTracker, Storage,
    };

    pub use crate::{DeterministicEmbedder, Embedder, Embedding, RemoteEmbedder};
}
