//! Search Journeys
//!
//! Complete query → rank → log → explain flows, including the keyword
//! fallback and degraded-embedding paths.

use trove_core::{SearchFilters, SearchRequest};
use trove_e2e_tests::fixtures::ProductFactory;
use trove_e2e_tests::harness::TestDb;

fn request(query: &str, limit: usize) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        session_id: None,
        filters: SearchFilters::default(),
        limit,
    }
}

#[tokio::test]
async fn on_topic_product_outranks_better_rated_off_topic_one() {
    let db = TestDb::new();
    let catalog = ProductFactory::seed_catalog(&db.storage);
    let engine = db.engine();

    let response = engine
        .search(&request("wireless bluetooth headphones", 10))
        .await
        .unwrap();
    assert!(!response.results.is_empty());

    let headphones = catalog.iter().find(|p| p.title.contains("Headphones")).unwrap();
    let chair = catalog.iter().find(|p| p.title.contains("Chair")).unwrap();

    let headphones_result = response
        .results
        .iter()
        .find(|r| r.product.id == headphones.id)
        .expect("on-topic product missing from results");
    assert_eq!(
        headphones_result.matched_terms,
        vec!["wireless", "bluetooth", "headphones"]
    );
    assert!(headphones_result
        .explanation
        .contains("Matches: wireless, bluetooth, headphones"));

    // The chair matches nothing and sits at the same price point, so its
    // 5.0 rating must not carry it past the headphones
    if let Some(chair_result) = response.results.iter().find(|r| r.product.id == chair.id) {
        assert!(chair_result.final_score < headphones_result.final_score);
        assert!(chair_result.matched_terms.is_empty());
    }

    // Scores non-increasing, ranks 1-based and dense
    for (i, window) in response.results.windows(2).enumerate() {
        assert!(window[0].final_score >= window[1].final_score);
        assert_eq!(window[0].rank, i + 1);
    }
}

#[tokio::test]
async fn search_is_replayable_from_its_log() {
    let db = TestDb::new();
    ProductFactory::seed_catalog(&db.storage);
    let engine = db.engine();

    let first = engine.search(&request("bluetooth speaker", 10)).await.unwrap();
    let second = engine.search(&request("bluetooth speaker", 10)).await.unwrap();

    // Same query, same catalog: identical ranked ids and scores
    let ids = |r: &trove_core::SearchResponse| -> Vec<(i64, f64)> {
        r.results.iter().map(|x| (x.product.id, x.final_score)).collect()
    };
    assert_eq!(ids(&first), ids(&second));

    // The persisted explanations reproduce the exact ranked order
    let explanations = db.storage.explanations_for_log(first.search_log_id).unwrap();
    assert_eq!(explanations.len(), first.results.len());
    for (result, row) in first.results.iter().zip(explanations.iter()) {
        assert_eq!(result.product.id, row.product_id);
        assert_eq!(result.rank as i64, row.position);
        assert_eq!(result.final_score, row.final_score);
        assert_eq!(result.matched_terms, row.matched_terms);
    }

    // The log keeps the query vector for replay
    let log = db.storage.get_search_log(first.search_log_id).unwrap().unwrap();
    assert_eq!(log.query, "bluetooth speaker");
    assert!(!log.query_embedding.is_empty());
}

#[tokio::test]
async fn keyword_fallback_finds_substring_match_and_is_logged() {
    let db = TestDb::new();
    ProductFactory::seed_catalog(&db.storage);
    let engine = db.engine();

    // A threshold no semantic result can clear forces the ranker empty
    let mut req = request("unicorn plush", 10);
    req.filters.min_score = Some(0.99);
    let response = engine.search(&req).await.unwrap();

    assert_eq!(response.fallback.as_deref(), Some("keyword"));
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].product.title, "Unicorn Plush Toy");
    assert_eq!(response.results[0].final_score, 0.5);

    let log = db.storage.get_search_log(response.search_log_id).unwrap().unwrap();
    assert_eq!(log.fallback.as_deref(), Some("keyword"));
    assert_eq!(log.result_count, 1);
}

#[tokio::test]
async fn degraded_and_healthy_paths_are_distinguishable() {
    let db = TestDb::new();
    ProductFactory::seed_catalog(&db.storage);

    let degraded_engine = db.engine_with_dead_embedder();
    let degraded = degraded_engine
        .search(&request("wireless bluetooth headphones", 10))
        .await
        .unwrap();
    assert!(degraded.degraded);

    // The service "recovers": same query through the healthy engine
    let healthy_engine = db.engine();
    let healthy = healthy_engine
        .search(&request("wireless bluetooth headphones", 10))
        .await
        .unwrap();
    assert!(!healthy.degraded);

    // Both paths are live: the persisted query vectors differ
    let degraded_log = db.storage.get_search_log(degraded.search_log_id).unwrap().unwrap();
    let healthy_log = db.storage.get_search_log(healthy.search_log_id).unwrap().unwrap();
    assert_ne!(degraded_log.query_embedding, healthy_log.query_embedding);
}

#[tokio::test]
async fn filters_carry_through_to_the_log() {
    let db = TestDb::new();
    ProductFactory::seed_catalog(&db.storage);
    let engine = db.engine();

    let mut req = request("bluetooth", 10);
    req.filters.category = Some("Electronics".to_string());
    req.filters.max_price = Some(150.0);
    let response = engine.search(&req).await.unwrap();

    for result in &response.results {
        assert_eq!(result.product.category, "Electronics");
        assert!(result.product.price <= 150.0);
    }

    let log = db.storage.get_search_log(response.search_log_id).unwrap().unwrap();
    assert_eq!(log.filters.category.as_deref(), Some("Electronics"));
    assert_eq!(log.filters.max_price, Some(150.0));
}

#[tokio::test]
async fn search_click_flags_the_explanation_row() {
    let db = TestDb::new();
    ProductFactory::seed_catalog(&db.storage);
    let engine = db.engine();
    let tracker = trove_core::SessionTracker::new(db.storage.clone());

    let mut req = request("bluetooth speaker", 10);
    req.session_id = Some(ProductFactory::session_id());
    let response = engine.search(&req).await.unwrap();
    let top = &response.results[0];

    tracker
        .record(&trove_core::InteractionInput {
            session_id: response.session_id.clone(),
            product_id: top.product.id,
            kind: trove_core::InteractionKind::SearchClick,
            query: Some("bluetooth speaker".to_string()),
            position: Some(top.rank as i64),
        })
        .unwrap();

    let explanations = db.storage.explanations_for_log(response.search_log_id).unwrap();
    let clicked = explanations.iter().find(|e| e.product_id == top.product.id).unwrap();
    assert!(clicked.was_clicked);
}
