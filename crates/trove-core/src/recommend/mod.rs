//! Recommender Module
//!
//! Session-based, item-similar and trending recommendations over the
//! interaction store and the vector index:
//! - Session affinity: interaction-weighted cosine against recent history
//! - Similar products: cosine scan from a target product's vector
//! - Trending / cold start: the featured list, rating-ordered
//!
//! All paths are read-only; trending is session-independent and cacheable.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{InteractionKind, Product};
use crate::embeddings::cosine_similarity;
use crate::error::Result;
use crate::search::ScanFilter;
use crate::storage::Storage;

// ============================================================================
// CONSTANTS
// ============================================================================

/// How many recent interactions feed the affinity model
pub const SESSION_HISTORY_LIMIT: usize = 20;

/// Candidates below this affinity are dropped
pub const MIN_AFFINITY: f64 = 0.1;

/// Similar-product pairs below this cosine are dropped
pub const MIN_SIMILARITY: f64 = 0.3;

/// Positional decay of the trending score: 1 − 0.05·i
const TRENDING_DECAY: f64 = 0.05;

// ============================================================================
// TYPES
// ============================================================================

/// A recommended product with its reason
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// The recommended product
    pub product: Product,
    /// Affinity / similarity / positional score, depending on the algorithm
    pub score: f64,
    /// Human-readable reason
    pub reason: String,
}

/// The interaction that contributed most to a candidate's affinity; its
/// kind and raw cosine drive the reason wording
struct BestMatch {
    kind: InteractionKind,
    raw_cosine: f64,
    contribution: f64,
}

// ============================================================================
// RECOMMENDER
// ============================================================================

/// Recommendation algorithms over the shared repository
pub struct Recommender {
    storage: Arc<Storage>,
}

impl Recommender {
    /// Create a recommender over the shared repository
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Session-based recommendations.
    ///
    /// Weighs the session's recent interactions (purchase > cart > search
    /// click > click > view, with a recency boost), scores every embedded
    /// candidate by weighted cosine affinity and keeps those above
    /// [`MIN_AFFINITY`]. Sessions with no usable history fall through to
    /// the cold-start featured list, as do expired sessions.
    pub fn for_session(
        &self,
        session_id: &str,
        limit: usize,
        exclude: &[i64],
    ) -> Result<Vec<Recommendation>> {
        match self.storage.get_session(session_id) {
            Ok(Some(session)) if session.is_expired() => {
                tracing::debug!(session_id, "expired session; serving cold start");
                return self.cold_start(limit);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("session lookup failed ({}); serving cold start", e);
                return self.cold_start(limit);
            }
        }

        let interactions = match self
            .storage
            .recent_interactions(session_id, SESSION_HISTORY_LIMIT)
        {
            Ok(interactions) => interactions,
            Err(e) => {
                tracing::warn!("interaction fetch failed ({}); serving cold start", e);
                return self.cold_start(limit);
            }
        };
        if interactions.is_empty() {
            return self.cold_start(limit);
        }

        // Weight each interacted product: base weight times recency boost
        // 1 + (n − i)/n over the most-recent-first list; a product keeps
        // the maximum across its interactions.
        let n = interactions.len() as f64;
        let mut weighted: HashMap<i64, (f64, InteractionKind)> = HashMap::new();
        for (i, interaction) in interactions.iter().enumerate() {
            let boost = 1.0 + (n - i as f64) / n;
            let weight = interaction.kind.base_weight() * boost;
            match weighted.get(&interaction.product_id) {
                Some((existing, _)) if *existing >= weight => {}
                _ => {
                    weighted.insert(interaction.product_id, (weight, interaction.kind));
                }
            }
        }

        let interacted: HashSet<i64> = weighted.keys().copied().collect();
        let mut profile: Vec<(i64, f64, InteractionKind, Vec<f32>)> = Vec::new();
        for (&product_id, &(weight, kind)) in &weighted {
            if let Some(vector) = self.storage.lookup_vector(product_id)? {
                profile.push((product_id, weight, kind, vector));
            }
        }
        // Fixed iteration order keeps affinity sums reproducible
        profile.sort_by_key(|entry| entry.0);
        if profile.is_empty() {
            // Nothing in the history ever got embedded
            return self.cold_start(limit);
        }
        let embedded_count = profile.len() as f64;

        let excluded: HashSet<i64> = exclude.iter().copied().collect();
        let mut scored: Vec<(i64, f64, BestMatch)> = Vec::new();
        for (candidate_id, candidate_vector) in self.storage.all_embeddings()? {
            if excluded.contains(&candidate_id) || interacted.contains(&candidate_id) {
                continue;
            }

            let mut affinity_sum = 0.0;
            let mut best: Option<BestMatch> = None;
            for (_, weight, kind, vector) in &profile {
                let raw_cosine = cosine_similarity(&candidate_vector, vector) as f64;
                let contribution = weight * raw_cosine;
                affinity_sum += contribution;
                if best.as_ref().is_none_or(|b| contribution > b.contribution) {
                    best = Some(BestMatch {
                        kind: *kind,
                        raw_cosine,
                        contribution,
                    });
                }
            }

            let affinity = affinity_sum / embedded_count;
            if affinity > MIN_AFFINITY {
                if let Some(best) = best {
                    scored.push((candidate_id, affinity, best));
                }
            }
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(limit);

        let ids: Vec<i64> = scored.iter().map(|(id, _, _)| *id).collect();
        let products: HashMap<i64, Product> = self
            .storage
            .get_products(&ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut recommendations = Vec::with_capacity(scored.len());
        for (product_id, affinity, best) in scored {
            let Some(product) = products.get(&product_id) else {
                continue;
            };
            recommendations.push(Recommendation {
                product: product.clone(),
                score: affinity,
                reason: session_reason(&best),
            });
        }
        Ok(recommendations)
    }

    /// Products similar to a target, by cosine over stored vectors. Targets
    /// without an embedding fall back to the rating-ordered category
    /// shelf.
    pub fn similar(&self, product_id: i64, limit: usize) -> Result<Vec<Recommendation>> {
        let product = self
            .storage
            .get_product(product_id)?
            .ok_or_else(|| crate::error::EngineError::NotFound(format!("product {product_id}")))?;

        let Some(vector) = self.storage.lookup_vector(product_id)? else {
            let shelf = self
                .storage
                .products_in_category(&product.category, product_id, limit)?;
            return Ok(shelf
                .into_iter()
                .enumerate()
                .map(|(i, p)| Recommendation {
                    product: p,
                    score: 1.0 - TRENDING_DECAY * i as f64,
                    reason: format!("More from {}", product.category),
                })
                .collect());
        };

        // The target itself comes back at cosine 1, hence the +1
        let hits = self
            .storage
            .scan_embeddings(&vector, &ScanFilter::none(), limit + 1)?;
        let kept: Vec<(i64, f32)> = hits
            .into_iter()
            .filter(|(id, similarity)| *id != product_id && (*similarity as f64) > MIN_SIMILARITY)
            .take(limit)
            .collect();

        let ids: Vec<i64> = kept.iter().map(|(id, _)| *id).collect();
        let products: HashMap<i64, Product> = self
            .storage
            .get_products(&ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(kept
            .into_iter()
            .filter_map(|(id, similarity)| {
                products.get(&id).map(|p| Recommendation {
                    product: p.clone(),
                    score: similarity as f64,
                    reason: format!("{}% similar", (similarity as f64 * 100.0).round() as i64),
                })
            })
            .collect())
    }

    /// Trending products: the featured list ordered by rating, with a
    /// positional score. Session-independent and cacheable.
    pub fn trending(&self, limit: usize) -> Result<Vec<Recommendation>> {
        let featured = self.storage.featured_products(limit)?;
        Ok(featured
            .into_iter()
            .enumerate()
            .map(|(i, product)| Recommendation {
                product,
                score: 1.0 - TRENDING_DECAY * i as f64,
                reason: "Trending now".to_string(),
            })
            .collect())
    }

    /// Cold start: top featured products, flat score
    fn cold_start(&self, limit: usize) -> Result<Vec<Recommendation>> {
        let featured = self.storage.featured_products(limit)?;
        Ok(featured
            .into_iter()
            .map(|product| Recommendation {
                product,
                score: 1.0,
                reason: "Popular product".to_string(),
            })
            .collect())
    }
}

/// Reason wording for a session recommendation, driven by the interaction
/// that contributed most
fn session_reason(best: &BestMatch) -> String {
    match best.kind {
        InteractionKind::Purchase => "Based on your purchase".to_string(),
        InteractionKind::AddToCart => "Similar to items in your cart".to_string(),
        _ => {
            if best.raw_cosine > 0.8 {
                "Very similar to items you viewed".to_string()
            } else if best.raw_cosine > 0.6 {
                "Similar to your interests".to_string()
            } else if best.raw_cosine > 0.4 {
                "Related to your browsing".to_string()
            } else {
                "You might like this".to_string()
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InteractionInput, ProductInput, Session};
    use crate::embeddings::{Embedding, EMBEDDING_DIMENSIONS};
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn recommender() -> (Recommender, Arc<Storage>, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(Some(dir.path().join("test.db"))).unwrap());
        (Recommender::new(storage.clone()), storage, dir)
    }

    fn seed(storage: &Storage, title: &str, rating: f64, featured: bool) -> i64 {
        storage
            .upsert_product(&ProductInput {
                title: title.to_string(),
                category: "Electronics".to_string(),
                price: 50.0,
                rating: Some(rating),
                featured,
                ..Default::default()
            })
            .unwrap()
            .id
    }

    /// Pad a few leading components out to the index dimensionality
    fn vec_n(components: &[f32]) -> Embedding {
        let mut vector = vec![0.0_f32; EMBEDDING_DIMENSIONS];
        vector[..components.len()].copy_from_slice(components);
        Embedding::new(vector)
    }

    fn put_vector(storage: &Storage, product_id: i64, components: &[f32]) {
        storage
            .upsert_embedding(product_id, &vec_n(components), "test", "test-model")
            .unwrap();
    }

    fn interact(storage: &Storage, session: &str, product_id: i64, kind: InteractionKind, offset: i64) {
        storage
            .record_interaction(
                &InteractionInput {
                    session_id: session.to_string(),
                    product_id,
                    kind,
                    query: None,
                    position: None,
                },
                Utc::now() + Duration::seconds(offset),
            )
            .unwrap();
    }

    #[test]
    fn test_cold_start_serves_featured_by_rating() {
        let (recommender, storage, _dir) = recommender();
        seed(&storage, "Filler", 2.0, false);
        let ids = [
            seed(&storage, "Top", 4.9, true),
            seed(&storage, "Second", 4.7, true),
            seed(&storage, "Third", 4.5, true),
            seed(&storage, "Fourth", 4.3, true),
            seed(&storage, "Fifth", 4.1, true),
        ];

        let recommendations = recommender
            .for_session(&Session::issue_id(), 4, &[])
            .unwrap();
        assert_eq!(recommendations.len(), 4);
        let got: Vec<i64> = recommendations.iter().map(|r| r.product.id).collect();
        assert_eq!(got, ids[..4].to_vec());
        for r in &recommendations {
            assert_eq!(r.reason, "Popular product");
            assert_eq!(r.score, 1.0);
        }
    }

    #[test]
    fn test_session_affinity_weighs_cart_over_view() {
        let (recommender, storage, _dir) = recommender();
        let p1 = seed(&storage, "Viewed Headphones", 4.0, false);
        let p2 = seed(&storage, "Carted Speaker", 4.0, false);
        let cx = seed(&storage, "Candidate X", 4.0, false);
        let cy = seed(&storage, "Candidate Y", 4.0, false);

        // cos(p1,cX)=0.9, cos(p2,cX)=0.6, cos(p1,cY)=0.1, cos(p2,cY)=0.1
        put_vector(&storage, p1, &[0.9, 0.435_889_9, 0.0, 0.0]);
        put_vector(&storage, p2, &[0.6, 0.8, 0.0, 0.0]);
        put_vector(&storage, cx, &[1.0, 0.0, 0.0, 0.0]);
        put_vector(&storage, cy, &[0.079_419_3, 0.065_435_6, 0.994_690_6, 0.0]);

        let session = Session::issue_id();
        // Most-recent-first history must read {view: p1, add_to_cart: p2}
        interact(&storage, &session, p2, InteractionKind::AddToCart, 0);
        interact(&storage, &session, p1, InteractionKind::View, 1);

        let recommendations = recommender.for_session(&session, 10, &[]).unwrap();
        assert_eq!(recommendations.len(), 2);

        // a_cX = (2·0.9 + 6·0.6)/2 = 2.7 ; a_cY = (0.2 + 0.6)/2 = 0.4
        assert_eq!(recommendations[0].product.id, cx);
        assert!((recommendations[0].score - 2.7).abs() < 1e-3);
        assert_eq!(recommendations[1].product.id, cy);
        assert!((recommendations[1].score - 0.4).abs() < 1e-3);

        // The add-to-cart interaction contributes most (6·0.6 > 2·0.9)
        assert_eq!(recommendations[0].reason, "Similar to items in your cart");
    }

    #[test]
    fn test_session_results_never_include_history_or_excluded() {
        let (recommender, storage, _dir) = recommender();
        let viewed = seed(&storage, "Viewed", 4.0, false);
        let other = seed(&storage, "Other", 4.0, false);
        let banned = seed(&storage, "Banned", 4.0, false);

        put_vector(&storage, viewed, &[1.0, 0.0]);
        put_vector(&storage, other, &[0.9, 0.435_889_9]);
        put_vector(&storage, banned, &[0.95, 0.312_249_9]);

        let session = Session::issue_id();
        interact(&storage, &session, viewed, InteractionKind::Purchase, 0);

        let recommendations = recommender.for_session(&session, 10, &[banned]).unwrap();
        let ids: Vec<i64> = recommendations.iter().map(|r| r.product.id).collect();
        assert!(!ids.contains(&viewed));
        assert!(!ids.contains(&banned));
        assert_eq!(ids, vec![other]);
        assert_eq!(recommendations[0].reason, "Based on your purchase");
    }

    #[test]
    fn test_session_without_embedded_history_falls_back() {
        let (recommender, storage, _dir) = recommender();
        let bare = seed(&storage, "Bare", 4.0, false);
        let featured = seed(&storage, "Featured", 4.8, true);

        let session = Session::issue_id();
        interact(&storage, &session, bare, InteractionKind::View, 0);

        let recommendations = recommender.for_session(&session, 4, &[]).unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].product.id, featured);
        assert_eq!(recommendations[0].reason, "Popular product");
    }

    #[test]
    fn test_similar_by_cosine() {
        let (recommender, storage, _dir) = recommender();
        let target = seed(&storage, "Target", 4.0, false);
        let close = seed(&storage, "Close", 4.0, false);
        let medium = seed(&storage, "Medium", 4.0, false);
        let far = seed(&storage, "Far", 4.0, false);

        put_vector(&storage, target, &[1.0, 0.0]);
        put_vector(&storage, close, &[0.9, 0.435_889_9]);
        put_vector(&storage, medium, &[0.5, 0.866_025_4]);
        put_vector(&storage, far, &[0.1, 0.994_987_4]);

        let recommendations = recommender.similar(target, 10).unwrap();
        let ids: Vec<i64> = recommendations.iter().map(|r| r.product.id).collect();
        // Similarity 0.1 falls under the 0.3 floor; the target is excluded
        assert_eq!(ids, vec![close, medium]);
        assert_eq!(recommendations[0].reason, "90% similar");
        assert!((recommendations[0].score - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_similar_without_embedding_uses_category_shelf() {
        let (recommender, storage, _dir) = recommender();
        let target = seed(&storage, "Target", 4.0, false);
        let sibling_hi = seed(&storage, "Sibling Hi", 4.9, false);
        let sibling_lo = seed(&storage, "Sibling Lo", 3.1, false);

        let recommendations = recommender.similar(target, 10).unwrap();
        let ids: Vec<i64> = recommendations.iter().map(|r| r.product.id).collect();
        assert_eq!(ids, vec![sibling_hi, sibling_lo]);
        assert_eq!(recommendations[0].reason, "More from Electronics");
    }

    #[test]
    fn test_similar_unknown_product_is_not_found() {
        let (recommender, _storage, _dir) = recommender();
        assert!(matches!(
            recommender.similar(404, 5),
            Err(crate::error::EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_trending_positional_scores() {
        let (recommender, storage, _dir) = recommender();
        seed(&storage, "First", 4.9, true);
        seed(&storage, "Second", 4.5, true);
        seed(&storage, "Hidden", 5.0, false);

        let recommendations = recommender.trending(10).unwrap();
        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0].score, 1.0);
        assert_eq!(recommendations[1].score, 0.95);
        for r in &recommendations {
            assert_eq!(r.reason, "Trending now");
        }
    }
}
