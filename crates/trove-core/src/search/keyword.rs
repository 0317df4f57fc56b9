//! Keyword Fallback Search
//!
//! Last-resort path when the ranker surfaces nothing: a plain substring
//! match of the whole query against title/description/category, scored at
//! a flat 0.5 with fixed sub-scores so results stay auditable.

use crate::catalog::{Availability, Product};
use crate::ranking::{
    matched_terms, query_terms, rating_score, synthesize_explanation, RankedResult, SubScores,
};

/// Flat final score assigned to keyword-fallback results
pub const KEYWORD_FALLBACK_SCORE: f64 = 0.5;

// ============================================================================
// FALLBACK SEARCH
// ============================================================================

/// Whether the query qualifies for the keyword fallback at all: it must
/// contain at least one non-trivial token.
pub fn has_searchable_terms(query: &str) -> bool {
    !query_terms(query).is_empty()
}

/// Run the keyword fallback over a candidate list.
///
/// Retains products whose title/description/category contain the whole
/// (trimmed, lowercased) query as a substring. Results carry the flat
/// fallback score with sub-scores {rating/5, 0.5, stock, 0.5}; ties are
/// broken by product id ascending like everywhere else.
pub fn keyword_search(query: &str, products: &[Product], limit: usize) -> Vec<RankedResult> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return vec![];
    }
    let terms = query_terms(query);

    let mut results: Vec<RankedResult> = products
        .iter()
        .filter(|product| product.searchable_text().contains(&needle))
        .map(|product| {
            let matched = matched_terms(&terms, &product.searchable_text());
            let sub_scores = SubScores {
                semantic: 0.0,
                rating: rating_score(product.rating),
                price: 0.5,
                stock: flat_stock_score(product.availability),
                recency: 0.5,
            };
            let explanation = synthesize_explanation(
                sub_scores.semantic,
                &matched,
                product.rating,
                sub_scores.price,
                product.availability,
            );
            RankedResult {
                product: product.clone(),
                final_score: KEYWORD_FALLBACK_SCORE,
                sub_scores,
                matched_terms: matched,
                explanation,
                rank: 0,
            }
        })
        .collect();

    results.sort_by(|a, b| a.product.id.cmp(&b.product.id));
    results.truncate(limit);
    for (index, result) in results.iter_mut().enumerate() {
        result.rank = index + 1;
    }
    results
}

/// The fallback path does not consult stock depth; it maps availability
/// straight to {1, 0.5, 0}.
fn flat_stock_score(availability: Availability) -> f64 {
    match availability {
        Availability::InStock => 1.0,
        Availability::LowStock => 0.5,
        Availability::OutOfStock => 0.0,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, title: &str) -> Product {
        Product {
            id,
            title: title.to_string(),
            description: "soft and cuddly".to_string(),
            category: "Toys".to_string(),
            rating: Some(4.5),
            availability: Availability::InStock,
            ..Default::default()
        }
    }

    #[test]
    fn test_substring_match_on_title() {
        let products = vec![
            product(1, "Unicorn Plush Toy"),
            product(2, "Garden Hose"),
        ];
        let results = keyword_search("unicorn plush", &products, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].product.id, 1);
        assert_eq!(results[0].final_score, KEYWORD_FALLBACK_SCORE);
        assert_eq!(results[0].rank, 1);
    }

    #[test]
    fn test_fixed_sub_scores() {
        let products = vec![product(1, "Unicorn Plush Toy")];
        let results = keyword_search("unicorn plush", &products, 10);
        let scores = &results[0].sub_scores;
        assert_eq!(scores.semantic, 0.0);
        assert!((scores.rating - 0.9).abs() < 1e-12);
        assert_eq!(scores.price, 0.5);
        assert_eq!(scores.stock, 1.0);
        assert_eq!(scores.recency, 0.5);
        assert_eq!(results[0].matched_terms, vec!["unicorn", "plush"]);
    }

    #[test]
    fn test_query_must_match_as_a_whole() {
        // Individual terms match but not the contiguous query
        let products = vec![product(1, "Plush Pink Unicorn")];
        let results = keyword_search("unicorn plush", &products, 10);
        assert!(results.is_empty());
    }

    #[test]
    fn test_has_searchable_terms() {
        assert!(has_searchable_terms("unicorn plush"));
        assert!(!has_searchable_terms("a b"));
        assert!(!has_searchable_terms(""));
    }

    #[test]
    fn test_results_ordered_by_id_and_limited() {
        let products = vec![
            product(5, "Unicorn Plush Large"),
            product(2, "Unicorn Plush Small"),
            product(9, "Unicorn Plush Giant"),
        ];
        let results = keyword_search("unicorn plush", &products, 2);
        let ids: Vec<i64> = results.iter().map(|r| r.product.id).collect();
        assert_eq!(ids, vec![2, 5]);
    }
}
