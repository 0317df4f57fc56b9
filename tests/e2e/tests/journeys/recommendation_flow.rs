//! Recommendation Journeys
//!
//! Cold-start, session-affinity, similar-product and trending flows over a
//! seeded catalog.

use std::collections::HashSet;

use trove_core::{InteractionKind, Recommender, SessionTracker};
use trove_e2e_tests::fixtures::ProductFactory;
use trove_e2e_tests::harness::TestDb;

#[test]
fn cold_start_serves_featured_by_rating() {
    let db = TestDb::new();
    let catalog = ProductFactory::seed_catalog(&db.storage);
    let recommender = Recommender::new(db.storage.clone());

    let recommendations = recommender
        .for_session(&ProductFactory::session_id(), 4, &[])
        .unwrap();

    assert_eq!(recommendations.len(), 4);
    for r in &recommendations {
        assert_eq!(r.reason, "Popular product");
        assert_eq!(r.score, 1.0);
        assert!(r.product.featured);
    }

    // Rating-descending over the featured subset
    let chair = catalog.iter().find(|p| p.title.contains("Chair")).unwrap();
    assert_eq!(recommendations[0].product.id, chair.id);
    for window in recommendations.windows(2) {
        assert!(window[0].product.rating >= window[1].product.rating);
    }
}

#[test]
fn session_recommendations_exclude_history_and_exclusions() {
    let db = TestDb::new();
    let catalog = ProductFactory::seed_catalog(&db.storage);
    let recommender = Recommender::new(db.storage.clone());

    let headphones = catalog.iter().find(|p| p.title.contains("Headphones")).unwrap();
    let speaker = catalog.iter().find(|p| p.title.contains("Speaker")).unwrap();
    let keyboard = catalog.iter().find(|p| p.title.contains("Keyboard")).unwrap();

    let session = ProductFactory::session_id();
    ProductFactory::interact(&db.storage, &session, headphones.id, InteractionKind::View, 0);
    ProductFactory::interact(&db.storage, &session, speaker.id, InteractionKind::Purchase, 1);

    let recommendations = recommender
        .for_session(&session, 8, &[keyboard.id])
        .unwrap();

    let ids: HashSet<i64> = recommendations.iter().map(|r| r.product.id).collect();
    assert!(!ids.contains(&headphones.id), "interacted product leaked");
    assert!(!ids.contains(&speaker.id), "interacted product leaked");
    assert!(!ids.contains(&keyboard.id), "excluded product leaked");

    // Affinity-ordered with non-empty reasons
    for window in recommendations.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
    for r in &recommendations {
        assert!(!r.reason.is_empty());
    }
}

#[test]
fn identical_products_are_fully_similar() {
    let db = TestDb::new();
    ProductFactory::seed_catalog(&db.storage);
    let recommender = Recommender::new(db.storage.clone());

    // A twin with identical descriptive text embeds to the identical vector
    let original =
        ProductFactory::create(&db.storage, "Espresso Machine", "Kitchen", 249.0, 4.6, false);
    ProductFactory::embed(&db.storage, &original);
    let twin = ProductFactory::create(&db.storage, "Espresso Machine", "Kitchen", 249.0, 4.6, false);
    ProductFactory::embed(&db.storage, &twin);

    let recommendations = recommender.similar(original.id, 5).unwrap();
    assert!(!recommendations.is_empty());
    assert_eq!(recommendations[0].product.id, twin.id);
    assert_eq!(recommendations[0].reason, "100% similar");
    assert!((recommendations[0].score - 1.0).abs() < 1e-4);

    // The target never recommends itself
    assert!(recommendations.iter().all(|r| r.product.id != original.id));
}

#[test]
fn similar_without_embedding_falls_back_to_category() {
    let db = TestDb::new();
    ProductFactory::seed_catalog(&db.storage);
    let recommender = Recommender::new(db.storage.clone());

    // Created but never embedded
    let bare = ProductFactory::create(&db.storage, "Cast Iron Skillet", "Kitchen", 39.0, 4.1, false);
    let sibling = ProductFactory::create(&db.storage, "Chef Knife", "Kitchen", 59.0, 4.9, false);

    let recommendations = recommender.similar(bare.id, 5).unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].product.id, sibling.id);
    assert_eq!(recommendations[0].reason, "More from Kitchen");
}

#[test]
fn trending_is_session_independent() {
    let db = TestDb::new();
    ProductFactory::seed_catalog(&db.storage);
    let recommender = Recommender::new(db.storage.clone());

    // Interactions in one session must not perturb trending
    let session = ProductFactory::session_id();
    ProductFactory::interact(&db.storage, &session, 1, InteractionKind::Purchase, 0);

    let first = recommender.trending(5).unwrap();
    let second = recommender.trending(5).unwrap();
    let ids = |recs: &[trove_core::Recommendation]| -> Vec<i64> {
        recs.iter().map(|r| r.product.id).collect()
    };
    assert_eq!(ids(&first), ids(&second));

    for (i, r) in first.iter().enumerate() {
        assert_eq!(r.reason, "Trending now");
        assert!((r.score - (1.0 - 0.05 * i as f64)).abs() < 1e-12);
    }
}

#[test]
fn recently_viewed_reads_back_in_order() {
    let db = TestDb::new();
    let catalog = ProductFactory::seed_catalog(&db.storage);
    let tracker = SessionTracker::new(db.storage.clone());

    let session = ProductFactory::session_id();
    let a = catalog[0].id;
    let b = catalog[1].id;
    ProductFactory::interact(&db.storage, &session, a, InteractionKind::View, 0);
    ProductFactory::interact(&db.storage, &session, b, InteractionKind::View, 1);
    // A second look at the first product moves it back to the front
    ProductFactory::interact(&db.storage, &session, a, InteractionKind::View, 2);

    let viewed = tracker.recently_viewed(&session, 10).unwrap();
    let ids: Vec<i64> = viewed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a, b]);
}
