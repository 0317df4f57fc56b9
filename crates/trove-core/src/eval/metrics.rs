//! Offline IR Metrics
//!
//! nDCG@k, Recall@k, Precision@k, MRR and AP over a ranked result list and
//! a set of graded relevance judgments. All functions are pure; the caller
//! decides where the judgments come from and labels the numbers accordingly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Judgments at or above this grade count as "relevant" for the binary
/// metrics (recall, precision, MRR, AP)
pub const DEFAULT_RELEVANCE_THRESHOLD: u8 = 1;

/// Highest admissible relevance grade
pub const MAX_RELEVANCE: u8 = 3;

// ============================================================================
// TYPES
// ============================================================================

/// One entry of a ranked result list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    /// Ranked product
    pub product_id: i64,
    /// 1-based position
    pub position: usize,
    /// Final score the ranker assigned
    pub final_score: f64,
}

/// A graded (query, product) relevance judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Judgment {
    /// Judged product
    pub product_id: i64,
    /// Relevance grade in {0, 1, 2, 3}
    pub relevance: u8,
}

/// The metric bundle for one evaluated query (or an aggregate)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrMetrics {
    /// Normalized discounted cumulative gain at k
    pub ndcg: f64,
    /// Share of relevant items retrieved in the top k
    pub recall: f64,
    /// Share of the top k that is relevant
    pub precision: f64,
    /// Reciprocal rank of the first relevant result
    pub mrr: f64,
    /// Average precision over the full result list
    pub ap: f64,
}

/// Persisted metric kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// nDCG at cutoff 10
    NdcgAt10,
    /// Recall at cutoff 10
    RecallAt10,
    /// Precision at cutoff 10
    PrecisionAt10,
    /// Mean reciprocal rank
    Mrr,
    /// Anything else; disambiguated by the note field
    Custom,
}

impl MetricKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::NdcgAt10 => "ndcg@10",
            MetricKind::RecallAt10 => "recall@10",
            MetricKind::PrecisionAt10 => "precision@10",
            MetricKind::Mrr => "mrr",
            MetricKind::Custom => "custom",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ndcg@10" => Some(MetricKind::NdcgAt10),
            "recall@10" => Some(MetricKind::RecallAt10),
            "precision@10" => Some(MetricKind::PrecisionAt10),
            "mrr" => Some(MetricKind::Mrr),
            "custom" => Some(MetricKind::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// GAIN FUNCTIONS
// ============================================================================

/// DCG over a relevance sequence: Σ (2^rel_i − 1) / log₂(i + 2)
pub fn dcg_at_k(relevances: &[u8], k: usize) -> f64 {
    relevances
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, &rel)| {
            let gain = (1_u64 << rel.min(MAX_RELEVANCE)) as f64 - 1.0;
            gain / ((i + 2) as f64).log2()
        })
        .sum()
}

/// Ideal DCG: the same judgments sorted by relevance descending
pub fn idcg_at_k(judgments: &[Judgment], k: usize) -> f64 {
    let mut relevances: Vec<u8> = judgments.iter().map(|j| j.relevance).collect();
    relevances.sort_unstable_by(|a, b| b.cmp(a));
    dcg_at_k(&relevances, k)
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Evaluate a ranked result list with the default relevance threshold
pub fn evaluate(results: &[ResultEntry], judgments: &[Judgment], k: usize) -> IrMetrics {
    evaluate_with_threshold(results, judgments, k, DEFAULT_RELEVANCE_THRESHOLD)
}

/// Evaluate a ranked result list against graded judgments.
///
/// Unjudged products count as relevance 0. With zero relevant items every
/// metric is 0 rather than undefined.
pub fn evaluate_with_threshold(
    results: &[ResultEntry],
    judgments: &[Judgment],
    k: usize,
    threshold: u8,
) -> IrMetrics {
    let grades: HashMap<i64, u8> = judgments
        .iter()
        .map(|j| (j.product_id, j.relevance.min(MAX_RELEVANCE)))
        .collect();
    let grade_of = |product_id: i64| grades.get(&product_id).copied().unwrap_or(0);
    let threshold = threshold.max(1);

    // nDCG@k
    let retrieved_relevances: Vec<u8> = results.iter().map(|r| grade_of(r.product_id)).collect();
    let dcg = dcg_at_k(&retrieved_relevances, k);
    let idcg = idcg_at_k(judgments, k);
    let ndcg = if idcg > 0.0 { dcg / idcg } else { 0.0 };

    // Binary relevance sets
    let total_relevant = grades.values().filter(|&&g| g >= threshold).count();
    let relevant_in_top_k = results
        .iter()
        .take(k)
        .filter(|r| grade_of(r.product_id) >= threshold)
        .count();

    let recall = if total_relevant > 0 {
        relevant_in_top_k as f64 / total_relevant as f64
    } else {
        0.0
    };

    let denominator = k.min(results.len());
    let precision = if denominator > 0 {
        relevant_in_top_k as f64 / denominator as f64
    } else {
        0.0
    };

    // MRR over the full list
    let mrr = results
        .iter()
        .enumerate()
        .find(|(_, r)| grade_of(r.product_id) >= threshold)
        .map(|(i, _)| 1.0 / (i + 1) as f64)
        .unwrap_or(0.0);

    // AP over the full list
    let ap = if total_relevant > 0 {
        let mut hits = 0_usize;
        let mut precision_sum = 0.0;
        for (i, result) in results.iter().enumerate() {
            if grade_of(result.product_id) >= threshold {
                hits += 1;
                precision_sum += hits as f64 / (i + 1) as f64;
            }
        }
        precision_sum / total_relevant as f64
    } else {
        0.0
    };

    IrMetrics { ndcg, recall, precision, mrr, ap }
}

// ============================================================================
// TESTS
// ============================================================================
