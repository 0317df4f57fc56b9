//! Search Module
//!
//! The query-time machinery:
//! - Linear-scan cosine vector index with attribute filters
//! - Keyword fallback for queries the ranker cannot serve
//! - The orchestrator gluing embed → rank → log → explain

mod engine;
mod keyword;
mod vector;

pub use vector::{
    IndexAttrs, ScanFilter, VectorIndex, VectorIndexError, VectorIndexStats,
};

pub use keyword::{has_searchable_terms, keyword_search, KEYWORD_FALLBACK_SCORE};

pub use engine::{
    CancelFlag, EngineConfig, MetricsSummary, SearchEngine, SearchRequest, SearchResponse,
    EMBED_BATCH_SIZE, MAX_SEARCH_LIMIT,
};
