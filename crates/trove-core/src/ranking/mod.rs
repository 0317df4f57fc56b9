//! Ranking Module
//!
//! The explainable linear re-ranker and its supporting pieces:
//! - Feature normalizers (rating, price, stock, recency), all in [0, 1]
//! - Matched-term extraction and the keyword boost
//! - The weight tuple, its persistence invariants and the short-TTL cache

mod normalizers;
mod ranker;
mod weights;

pub use normalizers::{
    price_bounds, price_score, rating_score, recency_score, round6, stock_score, SubScores,
};
pub use ranker::{
    matched_terms, query_terms, rank, synthesize_explanation, RankCandidate, RankOptions,
    RankedResult, DEFAULT_MIN_SCORE, MIN_TERM_CHARS,
};
pub use weights::{
    RankingWeights, WeightsCache, WeightsUpdate, DEFAULT_WEIGHT_TUPLE, RANKING_FORMULA,
    WEIGHTS_CACHE_TTL,
};
