//! Offline IR Evaluation Module
//!
//! Grades logged queries with classic information-retrieval metrics:
//! - nDCG@k, Recall@k, Precision@k, MRR, AP
//! - An automatic relevance-judgment synthesizer for unlabelled queries

mod judgments;
mod metrics;

pub use judgments::synthesize_judgments;
pub use metrics::{
    dcg_at_k, evaluate, evaluate_with_threshold, idcg_at_k, IrMetrics, Judgment, MetricKind,
    ResultEntry, DEFAULT_RELEVANCE_THRESHOLD, MAX_RELEVANCE,
};
