//! Vector Index
//!
//! In-memory product-embedding index with an exact linear cosine scan. At
//! the target catalog scale (10^3–10^5 products) a scan is fast enough; an
//! ANN backend can replace this as long as it preserves cosine ordering
//! within a small epsilon.
//!
//! Each entry carries the filterable attributes (category, price,
//! availability) so a scan can pre-filter without a metadata lookup.

use std::collections::BTreeMap;

use crate::catalog::{Availability, Product, SearchFilters};
use crate::embeddings::{cosine_similarity, EMBEDDING_DIMENSIONS, UNIT_NORM_EPSILON};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Vector index error types
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum VectorIndexError {
    /// Dimension mismatch on upsert
    InvalidDimensions(usize, usize),
}

impl std::fmt::Display for VectorIndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorIndexError::InvalidDimensions(expected, got) => {
                write!(f, "Invalid dimensions: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for VectorIndexError {}

// ============================================================================
// FILTER & ATTRIBUTES
// ============================================================================

/// Filterable attributes stored beside each vector
#[derive(Debug, Clone)]
pub struct IndexAttrs {
    /// Product category (matched case-insensitively)
    pub category: String,
    /// Current price
    pub price: f64,
    /// Inventory availability
    pub availability: Availability,
}

impl From<&Product> for IndexAttrs {
    fn from(product: &Product) -> Self {
        Self {
            category: product.category.clone(),
            price: product.price,
            availability: product.availability,
        }
    }
}

/// Scan-time filter over the indexed attributes
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    /// Restrict to a category (case-insensitive exact match)
    pub category: Option<String>,
    /// Minimum price, inclusive
    pub min_price: Option<f64>,
    /// Maximum price, inclusive
    pub max_price: Option<f64>,
    /// Drop products that are not in stock
    pub in_stock_only: bool,
}

impl ScanFilter {
    /// A filter that admits everything
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether an entry's attributes pass the filter
    pub fn matches(&self, attrs: &IndexAttrs) -> bool {
        if let Some(category) = &self.category {
            if !attrs.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if attrs.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if attrs.price > max {
                return false;
            }
        }
        if self.in_stock_only && attrs.availability != Availability::InStock {
            return false;
        }
        true
    }
}

impl From<&SearchFilters> for ScanFilter {
    fn from(filters: &SearchFilters) -> Self {
        Self {
            category: filters.category.clone(),
            min_price: filters.min_price,
            max_price: filters.max_price,
            in_stock_only: filters.in_stock_only,
        }
    }
}

// ============================================================================
// VECTOR INDEX
// ============================================================================

#[derive(Debug, Clone)]
struct IndexEntry {
    vector: Vec<f32>,
    attrs: IndexAttrs,
}

/// Index statistics
#[derive(Debug, Clone)]
pub struct VectorIndexStats {
    /// Total number of vectors
    pub total_vectors: usize,
    /// Vector dimensions
    pub dimensions: usize,
}

/// Linear-scan cosine index over product embeddings.
///
/// Keyed by product id; iteration order is id-ascending, which is what
/// makes equal-similarity ties deterministic.
pub struct VectorIndex {
    entries: BTreeMap<i64, IndexEntry>,
    dimensions: usize,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorIndex {
    /// Create an index with the reference dimensionality
    pub fn new() -> Self {
        Self::with_dimensions(EMBEDDING_DIMENSIONS)
    }

    /// Create an index with a custom dimensionality (tests, experiments)
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            dimensions,
        }
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the dimensions of the index
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Idempotent insert-or-replace, unique per product id
    pub fn upsert(
        &mut self,
        product_id: i64,
        vector: Vec<f32>,
        attrs: IndexAttrs,
    ) -> Result<(), VectorIndexError> {
        if vector.len() != self.dimensions {
            return Err(VectorIndexError::InvalidDimensions(
                self.dimensions,
                vector.len(),
            ));
        }
        self.entries.insert(product_id, IndexEntry { vector, attrs });
        Ok(())
    }

    /// Fetch the stored vector for a product
    pub fn lookup(&self, product_id: i64) -> Option<&[f32]> {
        self.entries.get(&product_id).map(|e| e.vector.as_slice())
    }

    /// Remove a product's vector; returns whether it existed
    pub fn remove(&mut self, product_id: i64) -> bool {
        self.entries.remove(&product_id).is_some()
    }

    /// Check if a product is indexed
    pub fn contains(&self, product_id: i64) -> bool {
        self.entries.contains_key(&product_id)
    }

    /// Return up to `k` products with the highest cosine similarity to the
    /// query among those passing `filter`, ties broken by product id
    /// ascending.
    ///
    /// A stored vector that lost its unit norm is an invariant violation:
    /// it is logged with the offending id, skipped, and the scan proceeds.
    pub fn scan(&self, query: &[f32], filter: &ScanFilter, k: usize) -> Vec<(i64, f32)> {
        if k == 0 || self.entries.is_empty() {
            return vec![];
        }

        let mut hits: Vec<(i64, f32)> = Vec::new();
        for (&product_id, entry) in &self.entries {
            if !filter.matches(&entry.attrs) {
                continue;
            }
            if !is_unit_norm(&entry.vector) {
                tracing::error!(product_id, "non-normalized vector in index; skipping record");
                continue;
            }
            hits.push((product_id, cosine_similarity(query, &entry.vector)));
        }

        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        hits.truncate(k);
        hits
    }

    /// Get index statistics
    pub fn stats(&self) -> VectorIndexStats {
        VectorIndexStats {
            total_vectors: self.len(),
            dimensions: self.dimensions,
        }
    }
}

fn is_unit_norm(vector: &[f32]) -> bool {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    (norm - 1.0).abs() <= UNIT_NORM_EPSILON * 10.0 + f32::EPSILON * vector.len() as f32
}

// ============================================================================
// TESTS
// ============================================================================
