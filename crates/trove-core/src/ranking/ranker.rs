//! Explainable Linear Re-Ranker
//!
//! Combines boosted semantic similarity with rating, price, stock and
//! recency sub-scores under the active weight tuple, and synthesizes a
//! per-result justification from the numbers it just produced.
//!
//! The ranker is pure: same query, vectors, candidates, weights and clock
//! yield byte-identical scores, which is what makes logged queries
//! replayable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::{Availability, Product};
use crate::embeddings::{cosine_similarity, DeterministicEmbedder};
use crate::ranking::normalizers::{
    price_bounds, price_score, rating_score, recency_score, stock_score, round6, SubScores,
};
use crate::ranking::weights::RankingWeights;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default minimum final score θ; candidates below it are dropped
pub const DEFAULT_MIN_SCORE: f64 = 0.1;

/// Query tokens this short carry no signal and are dropped
pub const MIN_TERM_CHARS: usize = 3;

/// Matched-term share is worth at most this much additive semantic boost
const KEYWORD_BOOST_FACTOR: f64 = 0.5;

// ============================================================================
// TYPES
// ============================================================================

/// A candidate entering the ranker: the product row plus its stored vector,
/// if one exists
#[derive(Debug, Clone)]
pub struct RankCandidate {
    /// The product record
    pub product: Product,
    /// Stored embedding; absent products are embedded on the fly with the
    /// deterministic fallback
    pub vector: Option<Vec<f32>>,
}

/// Ranker options
#[derive(Debug, Clone)]
pub struct RankOptions {
    /// Minimum final score θ
    pub min_score: f64,
    /// Result limit k
    pub limit: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            limit: 10,
        }
    }
}

/// A ranked, explained search result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    /// The product record
    pub product: Product,
    /// Weighted final score; comparable within this query only
    pub final_score: f64,
    /// Score decomposition at six decimal places
    pub sub_scores: SubScores,
    /// Query terms found in the product text, deduplicated in query order
    pub matched_terms: Vec<String>,
    /// Human-readable justification
    pub explanation: String,
    /// 1-based rank
    pub rank: usize,
}

// ============================================================================
// TERM EXTRACTION
// ============================================================================

/// Tokenize a query: split on whitespace, drop tokens of fewer than
/// [`MIN_TERM_CHARS`] characters, lowercase.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TERM_CHARS)
        .map(|token| token.to_lowercase())
        .collect()
}

/// Retain the terms appearing as substrings of the (lowercased) product
/// text, deduplicated in query order.
pub fn matched_terms(terms: &[String], product_text_lower: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .iter()
        .filter(|term| product_text_lower.contains(term.as_str()))
        .filter(|term| seen.insert(term.as_str()))
        .cloned()
        .collect()
}

// ============================================================================
// RANKING
// ============================================================================

/// Rank a candidate set against a query.
///
/// `now` is threaded through explicitly so a logged query can be replayed
/// with its original clock and reproduce identical recency sub-scores.
pub fn rank(
    query: &str,
    query_vector: &[f32],
    candidates: &[RankCandidate],
    weights: &RankingWeights,
    options: &RankOptions,
    now: DateTime<Utc>,
) -> Vec<RankedResult> {
    if candidates.is_empty() {
        return vec![];
    }

    let terms = query_terms(query);
    let bounds = price_bounds(candidates.iter().map(|c| Some(c.product.price)));
    let fallback = DeterministicEmbedder::new();

    let mut results: Vec<RankedResult> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let product = &candidate.product;

        // Semantic sub-score against the stored vector, or an on-the-fly
        // deterministic embedding when the product was never embedded
        let raw_cosine = match &candidate.vector {
            Some(vector) => cosine_similarity(query_vector, vector),
            None => {
                let vector = fallback.embed_text(&product.fallback_embedding_text());
                cosine_similarity(query_vector, &vector.vector)
            }
        };
        let semantic = (raw_cosine as f64).max(0.0);

        let text_lower = product.searchable_text();
        let matched = matched_terms(&terms, &text_lower);
        let boost = if terms.is_empty() {
            0.0
        } else {
            KEYWORD_BOOST_FACTOR * matched.len() as f64 / terms.len() as f64
        };
        let boosted = (semantic + boost).clamp(0.0, 1.0);

        let sub_scores = SubScores {
            semantic: boosted,
            rating: rating_score(product.rating),
            price: price_score(Some(product.price), bounds),
            stock: stock_score(product.availability, product.stock_quantity),
            recency: recency_score(product.created_at, now),
        }
        .rounded();

        let final_score = round6(
            weights.semantic * sub_scores.semantic
                + weights.rating * sub_scores.rating
                + weights.price * sub_scores.price
                + weights.stock * sub_scores.stock
                + weights.recency * sub_scores.recency,
        );

        if final_score < options.min_score {
            continue;
        }

        let explanation = synthesize_explanation(
            sub_scores.semantic,
            &matched,
            product.rating,
            sub_scores.price,
            product.availability,
        );

        results.push(RankedResult {
            product: product.clone(),
            final_score,
            sub_scores,
            matched_terms: matched,
            explanation,
            rank: 0,
        });
    }

    results.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.product.id.cmp(&b.product.id))
    });
    results.truncate(options.limit);

    for (index, result) in results.iter_mut().enumerate() {
        result.rank = index + 1;
    }
    results
}

// ============================================================================
// EXPLANATION SYNTHESIS
// ============================================================================

/// Build the human-readable justification from applicable fragments,
/// joined with " • ". Falls back to a generic line when nothing applies.
pub fn synthesize_explanation(
    semantic: f64,
    matched: &[String],
    rating: Option<f64>,
    price_sub_score: f64,
    availability: Availability,
) -> String {
    let mut fragments: Vec<String> = Vec::new();

    let percent = (semantic * 100.0).round() as i64;
    if semantic > 0.5 {
        fragments.push(format!("High semantic match ({percent}%)"));
    } else if semantic > 0.3 {
        fragments.push(format!("Moderate semantic match ({percent}%)"));
    }

    if !matched.is_empty() {
        let shown: Vec<&str> = matched.iter().take(3).map(String::as_str).collect();
        fragments.push(format!("Matches: {}", shown.join(", ")));
    }

    if let Some(rating) = rating {
        if rating >= 4.0 {
            fragments.push(format!("Highly rated ({rating:.1}★)"));
        }
    }

    if price_sub_score > 0.7 {
        fragments.push("Great value".to_string());
    }

    if availability == Availability::InStock {
        fragments.push("In stock".to_string());
    }

    if fragments.is_empty() {
        "Relevant to your search".to_string()
    } else {
        fragments.join(" • ")
    }
}

// ============================================================================
// TESTS
// ============================================================================
