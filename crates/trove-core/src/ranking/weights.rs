//! Ranking Weights
//!
//! The five coefficients of the linear re-ranker, persisted with exactly one
//! active row at a time, plus the short-TTL cache the orchestrator reads
//! through on every search.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default weight tuple (semantic, rating, price, stock, recency)
pub const DEFAULT_WEIGHT_TUPLE: (f64, f64, f64, f64, f64) = (0.50, 0.20, 0.15, 0.10, 0.05);

/// The active row is cached at most this long before being re-read
pub const WEIGHTS_CACHE_TTL: Duration = Duration::from_secs(5);

/// The public, versioned ranking formula. Surfaced in the admin UI and kept
/// in lockstep with the ranker implementation.
pub const RANKING_FORMULA: &str = "score = α·max(0, cos(vq,vp) + 0.5·|matched|/|queryTerms|) \
     + β·rating/5 + γ·priceNorm + δ·stockNorm + ε·recencyNorm";

// ============================================================================
// RANKING WEIGHTS
// ============================================================================

/// A named weight tuple (α, β, γ, δ, ε)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingWeights {
    /// Row id (0 until persisted)
    pub id: i64,
    /// Operator-facing name
    pub name: String,
    /// α: semantic similarity weight
    pub semantic: f64,
    /// β: rating weight
    pub rating: f64,
    /// γ: price weight
    pub price: f64,
    /// δ: stock weight
    pub stock: f64,
    /// ε: recency weight
    pub recency: f64,
    /// Whether this is the single active row
    pub active: bool,
    /// When the row was created
    pub created_at: DateTime<Utc>,
    /// When the row was last modified
    pub updated_at: DateTime<Utc>,
}

impl Default for RankingWeights {
    fn default() -> Self {
        let (semantic, rating, price, stock, recency) = DEFAULT_WEIGHT_TUPLE;
        let now = Utc::now();
        Self {
            id: 0,
            name: "default".to_string(),
            semantic,
            rating,
            price,
            stock,
            recency,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl RankingWeights {
    /// Build an unsaved row from a raw tuple
    pub fn from_tuple(name: impl Into<String>, tuple: (f64, f64, f64, f64, f64)) -> Self {
        let (semantic, rating, price, stock, recency) = tuple;
        Self {
            name: name.into(),
            semantic,
            rating,
            price,
            stock,
            recency,
            ..Default::default()
        }
    }

    /// Sum of the five coefficients
    pub fn sum(&self) -> f64 {
        self.semantic + self.rating + self.price + self.stock + self.recency
    }

    /// Validate non-negativity. Weights are not required to sum to 1; scores
    /// stay comparable within a single query either way.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (label, value) in [
            ("semantic", self.semantic),
            ("rating", self.rating),
            ("price", self.price),
            ("stock", self.stock),
            ("recency", self.recency),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{label} weight must be a non-negative number"));
            }
        }
        Ok(())
    }

    /// Warn (once, at update time) when the tuple does not sum to 1. The
    /// operator is warned, never blocked.
    pub fn warn_if_unnormalized(&self) {
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-9 {
            tracing::warn!(
                weights = %self.name,
                sum,
                "ranking weights do not sum to 1; scores remain comparable only within a query"
            );
        }
    }
}

/// Admin update for the active weight row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WeightsUpdate {
    /// New name; keeps the old one when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// α: semantic similarity weight
    pub semantic: f64,
    /// β: rating weight
    pub rating: f64,
    /// γ: price weight
    pub price: f64,
    /// δ: stock weight
    pub stock: f64,
    /// ε: recency weight
    pub recency: f64,
}

// ============================================================================
// WEIGHTS CACHE
// ============================================================================

/// Short-TTL cache for the active weight row.
///
/// Read on every search, invalidated on admin update.
pub struct WeightsCache {
    slot: Mutex<Option<(Instant, RankingWeights)>>,
    ttl: Duration,
}

impl Default for WeightsCache {
    fn default() -> Self {
        Self::new(WEIGHTS_CACHE_TTL)
    }
}

impl WeightsCache {
    /// Create a cache with a custom TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    /// Return the cached row if fresh, otherwise load, cache and return.
    pub fn get_or_load<E>(
        &self,
        loader: impl FnOnce() -> std::result::Result<RankingWeights, E>,
    ) -> std::result::Result<RankingWeights, E> {
        if let Ok(slot) = self.slot.lock() {
            if let Some((at, weights)) = slot.as_ref() {
                if at.elapsed() < self.ttl {
                    tracing::debug!(weights = %weights.name, "weights cache hit");
                    return Ok(weights.clone());
                }
            }
        }

        let weights = loader()?;
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some((Instant::now(), weights.clone()));
        }
        Ok(weights)
    }

    /// Drop the cached row; the next read goes to the repository.
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuple() {
        let weights = RankingWeights::default();
        assert_eq!(weights.semantic, 0.50);
        assert_eq!(weights.rating, 0.20);
        assert_eq!(weights.price, 0.15);
        assert_eq!(weights.stock, 0.10);
        assert_eq!(weights.recency, 0.05);
        assert!(weights.active);
        assert!((weights.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_negative_and_nan() {
        let mut weights = RankingWeights::default();
        assert!(weights.validate().is_ok());

        weights.price = -0.1;
        assert!(weights.validate().is_err());

        weights.price = f64::NAN;
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_unnormalized_sum_is_allowed() {
        let weights = RankingWeights::from_tuple("heavy", (1.0, 1.0, 1.0, 1.0, 1.0));
        assert!(weights.validate().is_ok());
        assert_eq!(weights.sum(), 5.0);
    }

    #[test]
    fn test_cache_serves_within_ttl() {
        let cache = WeightsCache::new(Duration::from_secs(60));
        let mut loads = 0;

        for _ in 0..3 {
            let loaded: std::result::Result<_, ()> = cache.get_or_load(|| {
                loads += 1;
                Ok(RankingWeights::default())
            });
            assert!(loaded.is_ok());
        }
        assert_eq!(loads, 1);
    }

    #[test]
    fn test_cache_invalidate_forces_reload() {
        let cache = WeightsCache::new(Duration::from_secs(60));
        let mut loads = 0;

        let _: std::result::Result<RankingWeights, ()> = cache.get_or_load(|| {
            loads += 1;
            Ok(RankingWeights::default())
        });
        cache.invalidate();
        let _: std::result::Result<RankingWeights, ()> = cache.get_or_load(|| {
            loads += 1;
            Ok(RankingWeights::default())
        });
        assert_eq!(loads, 2);
    }

    #[test]
    fn test_cache_zero_ttl_always_reloads() {
        let cache = WeightsCache::new(Duration::ZERO);
        let mut loads = 0;
        for _ in 0..2 {
            let _: std::result::Result<RankingWeights, ()> = cache.get_or_load(|| {
                loads += 1;
                Ok(RankingWeights::default())
            });
        }
        assert_eq!(loads, 2);
    }

    #[test]
    fn test_cache_does_not_cache_errors() {
        let cache = WeightsCache::new(Duration::from_secs(60));
        let failed: std::result::Result<RankingWeights, &str> = cache.get_or_load(|| Err("db down"));
        assert!(failed.is_err());

        let mut loads = 0;
        let ok: std::result::Result<_, &str> = cache.get_or_load(|| {
            loads += 1;
            Ok(RankingWeights::default())
        });
        assert!(ok.is_ok());
        assert_eq!(loads, 1);
    }
}
