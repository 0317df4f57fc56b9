//! Catalog module - Core types and data structures
//!
//! The persisted data model:
//! - Products with descriptive, commercial, quality and inventory facets
//! - Anonymous sessions and their append-only interactions
//! - Batch upload jobs with a monotonic state machine

mod job;
mod product;
mod session;

pub use job::{CatalogUploadJob, JobStatus};
pub use product::{
    truncate_chars, Availability, Product, ProductInput, ProductPatch, SearchFilters,
    MAX_SOURCE_TEXT_CHARS,
};
pub use session::{
    Interaction, InteractionInput, InteractionKind, Session, SESSION_TTL_DAYS,
};

use serde::{Deserialize, Serialize};

// ============================================================================
// CATALOG STATISTICS
// ============================================================================

/// Aggregate counters over the persisted catalog
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    /// Total products
    pub products: i64,
    /// Products with a stored embedding
    pub embedded_products: i64,
    /// Known sessions (expired included)
    pub sessions: i64,
    /// Total interactions recorded
    pub interactions: i64,
    /// Executed searches
    pub search_logs: i64,
}
