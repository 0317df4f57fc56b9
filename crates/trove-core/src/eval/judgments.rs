//! Automatic Relevance Judgments
//!
//! Synthesizes graded judgments from term overlap when no human labels
//! exist. This is an acknowledged weak signal; metrics computed from it
//! must be labelled as auto-judged by the caller.

use crate::catalog::Product;
use crate::eval::metrics::Judgment;
use crate::ranking::query_terms;

// ============================================================================
// SYNTHESIS
// ============================================================================

/// Grade every product in `products` against `query`.
///
/// Grading rules over the non-trivial query tokens:
/// - ≥80% of tokens match AND a token appears in the title → 3
/// - ≥50% of tokens match OR a token appears in the title → 2
/// - any token matches → 1
/// - otherwise → 0
///
/// Deterministic: running this twice over the same inputs returns equal
/// judgments.
pub fn synthesize_judgments(query: &str, products: &[Product]) -> Vec<Judgment> {
    let terms = query_terms(query);

    products
        .iter()
        .map(|product| Judgment {
            product_id: product.id,
            relevance: grade(&terms, product),
        })
        .collect()
}

fn grade(terms: &[String], product: &Product) -> u8 {
    if terms.is_empty() {
        return 0;
    }

    let product_text = product.searchable_text();
    let title_lower = product.title.to_lowercase();

    let matches = terms
        .iter()
        .filter(|term| product_text.contains(term.as_str()))
        .count();
    let exact_title = terms.iter().any(|term| title_lower.contains(term.as_str()));
    let ratio = matches as f64 / terms.len() as f64;

    if ratio >= 0.8 && exact_title {
        3
    } else if ratio >= 0.5 || exact_title {
        2
    } else if matches > 0 {
        1
    } else {
        0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, title: &str, description: &str) -> Product {
        Product {
            id,
            title: title.to_string(),
            description: description.to_string(),
            category: "Electronics".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_title_match_grades_three() {
        let products = vec![product(1, "Wireless Bluetooth Headphones", "")];
        let judgments = synthesize_judgments("wireless bluetooth headphones", &products);
        assert_eq!(judgments[0].relevance, 3);
    }

    #[test]
    fn test_half_match_grades_two() {
        // 1 of 2 terms matches, in the description only
        let products = vec![product(1, "Audio Gear", "great wireless sound")];
        let judgments = synthesize_judgments("wireless turntable", &products);
        assert_eq!(judgments[0].relevance, 2);
    }

    #[test]
    fn test_title_hit_alone_grades_two() {
        // 1 of 3 terms, but it appears in the title
        let products = vec![product(1, "Wireless Charger", "")];
        let judgments = synthesize_judgments("wireless bluetooth headphones", &products);
        assert_eq!(judgments[0].relevance, 2);
    }

    #[test]
    fn test_weak_match_grades_one() {
        // 1 of 3 terms, description only
        let products = vec![product(1, "Power Bank", "works with bluetooth speakers too")];
        let judgments = synthesize_judgments("bluetooth headphones microphone", &products);
        assert_eq!(judgments[0].relevance, 1);
    }

    #[test]
    fn test_no_match_grades_zero() {
        let products = vec![product(1, "Garden Hose", "fifty feet")];
        let judgments = synthesize_judgments("bluetooth headphones", &products);
        assert_eq!(judgments[0].relevance, 0);
    }

    #[test]
    fn test_trivial_query_grades_everything_zero() {
        let products = vec![product(1, "TV", "a tv")];
        let judgments = synthesize_judgments("4k tv", &products);
        // Both tokens are too short to count
        assert_eq!(judgments[0].relevance, 0);
    }

    #[test]
    fn test_idempotent() {
        let products = vec![
            product(1, "Wireless Bluetooth Headphones", "noise cancelling"),
            product(2, "Office Chair", "leather"),
            product(3, "Bluetooth Speaker", "portable"),
        ];
        let first = synthesize_judgments("wireless bluetooth headphones", &products);
        let second = synthesize_judgments("wireless bluetooth headphones", &products);
        assert_eq!(first, second);
    }
}
