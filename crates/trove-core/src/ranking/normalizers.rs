//! Feature Normalizers
//!
//! Rating, price, stock and recency sub-scores, all clamped to [0, 1].
//! Every policy here is reproducible from the persisted product row alone,
//! so an auditor can replay any logged query and land on identical numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Availability;

// ============================================================================
// SUB-SCORES
// ============================================================================

/// Per-result score decomposition
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    /// Boosted semantic similarity σ̂
    pub semantic: f64,
    /// Rating sub-score ρ
    pub rating: f64,
    /// Price sub-score π (query-local min-max)
    pub price: f64,
    /// Stock sub-score τ
    pub stock: f64,
    /// Recency sub-score φ
    pub recency: f64,
}

impl SubScores {
    /// Round every component to six decimal places, the persisted precision
    pub fn rounded(&self) -> SubScores {
        SubScores {
            semantic: round6(self.semantic),
            rating: round6(self.rating),
            price: round6(self.price),
            stock: round6(self.stock),
            recency: round6(self.recency),
        }
    }
}

/// Round to six decimal places
#[inline]
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

// ============================================================================
// NORMALIZER POLICIES
// ============================================================================

/// Rating sub-score: rating/5, or 0.5 when the product has no rating yet
#[inline]
pub fn rating_score(rating: Option<f64>) -> f64 {
    match rating {
        Some(r) => (r / 5.0).clamp(0.0, 1.0),
        None => 0.5,
    }
}

/// Price bounds over the candidate set of the current query.
///
/// Unknown prices participate as 0 so a shortlist of one priced and one
/// unpriced product still yields a usable range.
pub fn price_bounds<I>(prices: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut bounds: Option<(f64, f64)> = None;
    for price in prices {
        let value = price.unwrap_or(0.0);
        bounds = Some(match bounds {
            None => (value, value),
            Some((min, max)) => (min.min(value), max.max(value)),
        });
    }
    bounds
}

/// Price sub-score: min-max inverted over the query's shortlist, so "cheap"
/// is relative to what this query surfaced. Degenerate ranges and unknown
/// prices score 0.5.
#[inline]
pub fn price_score(price: Option<f64>, bounds: Option<(f64, f64)>) -> f64 {
    let Some(price) = price else { return 0.5 };
    let Some((min, max)) = bounds else { return 0.5 };
    if max <= min {
        return 0.5;
    }
    (1.0 - (price - min) / (max - min)).clamp(0.0, 1.0)
}

/// Stock sub-score. In-stock products get a depth bonus that saturates at
/// 500 units.
#[inline]
pub fn stock_score(availability: Availability, stock_quantity: i64) -> f64 {
    match availability {
        Availability::OutOfStock => 0.0,
        Availability::LowStock => 0.5,
        Availability::InStock => {
            let quantity = stock_quantity.max(0) as f64;
            (0.7 + 0.3 * quantity / 500.0).min(1.0)
        }
    }
}

/// Recency sub-score, piecewise linear in days since creation:
/// 1.0 up to 30 days, 0.1 from 365 days, linear in between.
#[inline]
pub fn recency_score(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - created_at).num_seconds() as f64 / 86_400.0;
    if days <= 30.0 {
        1.0
    } else if days >= 365.0 {
        0.1
    } else {
        1.0 - 0.9 * (days - 30.0) / 335.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_rating_score_policy() {
        assert_eq!(rating_score(None), 0.5);
        assert_eq!(rating_score(Some(0.0)), 0.0);
        assert_eq!(rating_score(Some(5.0)), 1.0);
        assert!((rating_score(Some(4.8)) - 0.96).abs() < 1e-12);
    }

    #[test]
    fn test_price_score_inverts_min_max() {
        let bounds = price_bounds([Some(10.0), Some(20.0), Some(30.0)]);
        assert_eq!(bounds, Some((10.0, 30.0)));
        assert_eq!(price_score(Some(10.0), bounds), 1.0);
        assert_eq!(price_score(Some(30.0), bounds), 0.0);
        assert!((price_score(Some(20.0), bounds) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_price_score_degenerate_range_is_half() {
        // 1-element candidate set: min == max
        let bounds = price_bounds([Some(42.0)]);
        assert_eq!(price_score(Some(42.0), bounds), 0.5);
    }

    #[test]
    fn test_price_score_unknown_price() {
        // Unknown prices participate in min-max as 0 but score 0.5 themselves
        let bounds = price_bounds([None, Some(100.0)]);
        assert_eq!(bounds, Some((0.0, 100.0)));
        assert_eq!(price_score(None, bounds), 0.5);
        assert_eq!(price_score(Some(100.0), bounds), 0.0);
    }

    #[test]
    fn test_stock_score_policy() {
        assert_eq!(stock_score(Availability::OutOfStock, 0), 0.0);
        assert_eq!(stock_score(Availability::OutOfStock, 999), 0.0);
        assert_eq!(stock_score(Availability::LowStock, 3), 0.5);
        assert_eq!(stock_score(Availability::InStock, 0), 0.7);
        assert!((stock_score(Availability::InStock, 250) - 0.85).abs() < 1e-12);
        assert_eq!(stock_score(Availability::InStock, 500), 1.0);
        // Saturates past 500 units
        assert_eq!(stock_score(Availability::InStock, 10_000), 1.0);
    }

    #[test]
    fn test_recency_score_plateaus() {
        let now = Utc::now();
        assert_eq!(recency_score(now, now), 1.0);
        assert_eq!(recency_score(now - Duration::days(30), now), 1.0);
        assert_eq!(recency_score(now - Duration::days(365), now), 0.1);
        assert_eq!(recency_score(now - Duration::days(3650), now), 0.1);
    }

    #[test]
    fn test_recency_score_linear_between() {
        let now = Utc::now();
        // Midpoint of the ramp: 30 + 335/2 = 197.5 days → 0.55
        let mid = now - Duration::seconds((197.5 * 86_400.0) as i64);
        assert!((recency_score(mid, now) - 0.55).abs() < 1e-6);
        // Future timestamps clamp to the fresh plateau
        assert_eq!(recency_score(now + Duration::days(2), now), 1.0);
    }

    #[test]
    fn test_recency_bounds_on_random_ages() {
        let now = Utc::now();
        for days in [0, 1, 29, 31, 100, 200, 300, 364, 366, 1000] {
            let score = recency_score(now - Duration::days(days), now);
            assert!((0.1..=1.0).contains(&score), "day {days} gave {score}");
        }
    }

    #[test]
    fn test_round6() {
        assert_eq!(round6(0.123_456_789), 0.123_457);
        assert_eq!(round6(1.0), 1.0);
        let scores = SubScores {
            semantic: 0.987_654_321,
            ..Default::default()
        };
        assert_eq!(scores.rounded().semantic, 0.987_654);
    }
}
