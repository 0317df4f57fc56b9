//! Test Data Factory
//!
//! Generates realistic catalog data for journey tests:
//! - Individual products with configurable facets
//! - A small mixed-category catalog with stored vectors
//! - Interaction recording shortcuts

use chrono::{Duration, Utc};
use trove_core::{
    Availability, InteractionInput, InteractionKind, Product, ProductInput, Session, Storage,
};

use crate::harness::StubModelEmbedder;

/// Factory for creating test data
pub struct ProductFactory;

impl ProductFactory {
    /// Create a product with the given facets; returns the stored row
    pub fn create(
        storage: &Storage,
        title: &str,
        category: &str,
        price: f64,
        rating: f64,
        featured: bool,
    ) -> Product {
        storage
            .upsert_product(&ProductInput {
                title: title.to_string(),
                description: format!("{title}, built for everyday use"),
                category: category.to_string(),
                price,
                rating: Some(rating),
                review_count: 120,
                availability: Availability::InStock,
                stock_quantity: 250,
                featured,
                ..Default::default()
            })
            .expect("create product")
    }

    /// Embed one product with the stand-in model
    pub fn embed(storage: &Storage, product: &Product) {
        let embedder = StubModelEmbedder::new();
        let text = product.embedding_text();
        storage
            .upsert_embedding(product.id, &embedder.embed_text(&text), &text, "stub-model-v1")
            .expect("store embedding");
    }

    /// A small mixed catalog, every product embedded. Returns the stored
    /// rows in creation order.
    pub fn seed_catalog(storage: &Storage) -> Vec<Product> {
        let items = [
            ("Sony WH-1000XM5 Wireless Bluetooth Headphones", "Electronics", 329.99, 4.8, true),
            ("Portable Bluetooth Speaker", "Electronics", 89.99, 4.5, true),
            ("Mechanical Gaming Keyboard", "Electronics", 129.99, 4.3, false),
            ("Luxury Leather Office Chair", "Furniture", 329.99, 5.0, true),
            ("Adjustable Standing Desk", "Furniture", 449.00, 4.6, false),
            ("Stainless Steel Water Bottle", "Sports", 24.99, 4.4, true),
            ("Yoga Mat with Carry Strap", "Sports", 34.99, 4.2, false),
            ("Unicorn Plush Toy", "Toys", 19.99, 4.7, false),
        ];

        items
            .iter()
            .map(|&(title, category, price, rating, featured)| {
                let product = Self::create(storage, title, category, price, rating, featured);
                Self::embed(storage, &product);
                product
            })
            .collect()
    }

    /// Record an interaction `offset` seconds into the session's timeline
    pub fn interact(
        storage: &Storage,
        session_id: &str,
        product_id: i64,
        kind: InteractionKind,
        offset_seconds: i64,
    ) {
        storage
            .record_interaction(
                &InteractionInput {
                    session_id: session_id.to_string(),
                    product_id,
                    kind,
                    query: None,
                    position: None,
                },
                Utc::now() + Duration::seconds(offset_seconds),
            )
            .expect("record interaction");
    }

    /// A fresh session id in the transport's format
    pub fn session_id() -> String {
        Session::issue_id()
    }
}
