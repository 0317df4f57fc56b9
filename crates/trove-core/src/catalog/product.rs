//! Product - The fundamental unit of the catalog
//!
//! Each product carries:
//! - Descriptive text (title, description, category tree, brand, features)
//! - Commercial data (price, original price, currency)
//! - Quality signals (rating, review count)
//! - Inventory state (availability, stock quantity)
//! - Presentation and lifecycle metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product descriptive text is truncated to this many Unicode characters
/// before it is embedded or persisted as embedding source text.
pub const MAX_SOURCE_TEXT_CHARS: usize = 1000;

// ============================================================================
// AVAILABILITY
// ============================================================================

/// Inventory availability states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Product is available for purchase
    #[default]
    InStock,
    /// Product is available but running low
    LowStock,
    /// Product cannot be purchased right now
    OutOfStock,
}

impl Availability {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::LowStock => "low_stock",
            Availability::OutOfStock => "out_of_stock",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "in_stock" => Some(Availability::InStock),
            "low_stock" => Some(Availability::LowStock),
            "out_of_stock" => Some(Availability::OutOfStock),
            _ => None,
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// PRODUCT
// ============================================================================

/// A catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable integer identifier
    pub id: i64,
    /// Optional catalog sku (unique when present)
    pub sku: Option<String>,
    /// Product title (non-empty)
    pub title: String,
    /// Long-form description
    pub description: String,
    /// Top-level category
    pub category: String,
    /// Second-level category
    pub subcategory: Option<String>,
    /// Brand name
    pub brand: Option<String>,
    /// Short feature strings
    pub features: Vec<String>,
    /// Current price (non-negative)
    pub price: f64,
    /// Pre-discount price; >= price when present
    pub original_price: Option<f64>,
    /// ISO currency code
    pub currency: String,
    /// Average rating in [0, 5]
    pub rating: Option<f64>,
    /// Number of reviews behind the rating
    pub review_count: i64,
    /// Inventory availability
    pub availability: Availability,
    /// Units on hand (non-negative)
    pub stock_quantity: i64,
    /// Image reference for the CDN
    pub image_url: Option<String>,
    /// Whether the product is featured on the storefront
    pub featured: bool,
    /// When the product was created
    pub created_at: DateTime<Utc>,
    /// When the product was last modified
    pub updated_at: DateTime<Utc>,
}

impl Default for Product {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            sku: None,
            title: String::new(),
            description: String::new(),
            category: String::new(),
            subcategory: None,
            brand: None,
            features: vec![],
            price: 0.0,
            original_price: None,
            currency: "USD".to_string(),
            rating: None,
            review_count: 0,
            availability: Availability::InStock,
            stock_quantity: 0,
            image_url: None,
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Product {
    /// Text the ranker matches query terms against: title, description and
    /// category concatenated, lowercased.
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.category).to_lowercase()
    }

    /// Text handed to the embedding provider when this product is (re)embedded.
    /// Includes brand and features for richer semantics; truncated to
    /// [`MAX_SOURCE_TEXT_CHARS`] Unicode characters.
    pub fn embedding_text(&self) -> String {
        let mut text = format!("{} {} {}", self.title, self.description, self.category);
        if let Some(brand) = &self.brand {
            text.push(' ');
            text.push_str(brand);
        }
        for feature in &self.features {
            text.push(' ');
            text.push_str(feature);
        }
        truncate_chars(&text, MAX_SOURCE_TEXT_CHARS)
    }

    /// Text used when a product has no stored vector at query time and the
    /// deterministic fallback has to embed it on the fly.
    pub fn fallback_embedding_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.category)
    }
}

/// Truncate a string to at most `max` Unicode characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for creating or upserting a product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductInput {
    /// Explicit id for catalog-driven upserts; None lets the store assign one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Optional catalog sku
    pub sku: Option<String>,
    /// Product title (must be non-empty)
    pub title: String,
    /// Long-form description
    #[serde(default)]
    pub description: String,
    /// Top-level category
    #[serde(default)]
    pub category: String,
    /// Second-level category
    pub subcategory: Option<String>,
    /// Brand name
    pub brand: Option<String>,
    /// Short feature strings
    #[serde(default)]
    pub features: Vec<String>,
    /// Current price
    pub price: f64,
    /// Pre-discount price
    pub original_price: Option<f64>,
    /// ISO currency code
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Average rating in [0, 5]
    pub rating: Option<f64>,
    /// Review count
    #[serde(default)]
    pub review_count: i64,
    /// Inventory availability
    #[serde(default)]
    pub availability: Availability,
    /// Units on hand
    #[serde(default)]
    pub stock_quantity: i64,
    /// Image reference
    pub image_url: Option<String>,
    /// Featured flag
    #[serde(default)]
    pub featured: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for ProductInput {
    fn default() -> Self {
        Self {
            id: None,
            sku: None,
            title: String::new(),
            description: String::new(),
            category: String::new(),
            subcategory: None,
            brand: None,
            features: vec![],
            price: 0.0,
            original_price: None,
            currency: default_currency(),
            rating: None,
            review_count: 0,
            availability: Availability::InStock,
            stock_quantity: 0,
            image_url: None,
            featured: false,
        }
    }
}

impl ProductInput {
    /// Validate the data-model invariants. Returns a human-readable reason
    /// on the first violation.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must be non-empty".to_string());
        }
        if self.price < 0.0 {
            return Err("price must be non-negative".to_string());
        }
        if let Some(original) = self.original_price {
            if original < self.price {
                return Err("original price must be >= price".to_string());
            }
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err("rating must be in [0, 5]".to_string());
            }
        }
        if self.review_count < 0 {
            return Err("review count must be non-negative".to_string());
        }
        if self.stock_quantity < 0 {
            return Err("stock quantity must be non-negative".to_string());
        }
        Ok(())
    }
}

/// Partial update for an existing product. `None` fields are left untouched;
/// double-`Option` fields distinguish "leave" from "clear".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub sku: Option<Option<String>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<Option<String>>,
    pub brand: Option<Option<String>>,
    pub features: Option<Vec<String>>,
    pub price: Option<f64>,
    pub original_price: Option<Option<f64>>,
    pub currency: Option<String>,
    pub rating: Option<Option<f64>>,
    pub review_count: Option<i64>,
    pub availability: Option<Availability>,
    pub stock_quantity: Option<i64>,
    pub image_url: Option<Option<String>>,
    pub featured: Option<bool>,
}

impl ProductPatch {
    /// Whether the patch changes any of the descriptive text fields that
    /// feed the embedding source.
    pub fn touches_descriptive_text(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.category.is_some()
            || self.brand.is_some()
            || self.features.is_some()
    }
}

// ============================================================================
// SEARCH FILTERS
// ============================================================================

/// Caller-supplied filters for a search request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchFilters {
    /// Restrict to a category (case-insensitive exact match)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Minimum price, inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    /// Maximum price, inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    /// Drop products that are not in stock
    #[serde(default)]
    pub in_stock_only: bool,
    /// Override the default minimum-score threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
}

impl SearchFilters {
    /// Whether a product passes the category/price/stock filters
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if !product.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        if self.in_stock_only && product.availability != Availability::InStock {
            return false;
        }
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================
