//! SQLite Storage Implementation
//!
//! Core repository with integrated vector index. Owns every persisted row:
//! products, embeddings, sessions, interactions, ranking weights, search
//! logs, explanations, evaluation metrics and upload jobs.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::catalog::{
    truncate_chars, Availability, CatalogStats, CatalogUploadJob, Interaction, InteractionInput,
    InteractionKind, JobStatus, Product, ProductInput, ProductPatch, SearchFilters, Session,
    MAX_SOURCE_TEXT_CHARS, SESSION_TTL_DAYS,
};
use crate::embeddings::Embedding;
use crate::eval::MetricKind;
use crate::ranking::{RankCandidate, RankedResult, RankingWeights, SubScores, WeightsUpdate};
use crate::search::{IndexAttrs, ScanFilter, VectorIndex};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Uniqueness invariant violated
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Invalid caller input
    #[error("Invalid input: {0}")]
    Invalid(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Migration failed at startup; unrecoverable (process exit code 2)
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

fn map_constraint(err: rusqlite::Error, what: &str) -> StorageError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation {
            return StorageError::Conflict(what.to_string());
        }
    }
    StorageError::Database(err)
}

// ============================================================================
// PERSISTED RECORD TYPES
// ============================================================================

/// One executed search query
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLog {
    /// Row id
    pub id: i64,
    /// Session that issued the query
    pub session_id: String,
    /// Raw query text
    pub query: String,
    /// The query vector used, for replay
    pub query_embedding: Vec<f32>,
    /// How many results were returned
    pub result_count: i64,
    /// Measured wall-clock response time
    pub response_time_ms: i64,
    /// Filter bag as supplied by the caller
    pub filters: SearchFilters,
    /// Distinct marker when a fallback path produced the results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// When the search ran
    pub created_at: DateTime<Utc>,
}

/// Per-(search, product) score decomposition at result position
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultExplanation {
    /// Row id
    pub id: i64,
    /// Owning search log
    pub search_log_id: i64,
    /// Explained product
    pub product_id: i64,
    /// 1-based result position
    pub position: i64,
    /// Weighted final score (six decimal places)
    pub final_score: f64,
    /// Sub-score decomposition (six decimal places each)
    pub sub_scores: SubScores,
    /// Matched query terms
    pub matched_terms: Vec<String>,
    /// Human-readable justification
    pub explanation: String,
    /// Set post-hoc when the session clicked this result
    pub was_clicked: bool,
}

/// A persisted evaluation metric
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMetric {
    /// Row id
    pub id: i64,
    /// Graded search log, absent for aggregates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_log_id: Option<i64>,
    /// Metric kind
    pub kind: MetricKind,
    /// Metric value
    pub value: f64,
    /// Number of queries behind an aggregate value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_count: Option<i64>,
    /// Free-text note (also labels auto-judged metrics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the metric was computed
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a search log together with its explanations
#[derive(Debug, Clone)]
pub struct NewSearchLog<'a> {
    /// Session that issued the query
    pub session_id: &'a str,
    /// Raw query text
    pub query: &'a str,
    /// The query vector used
    pub query_embedding: &'a [f32],
    /// Measured response time
    pub response_time_ms: i64,
    /// Filter bag
    pub filters: &'a SearchFilters,
    /// Fallback marker ("keyword") when not the semantic path
    pub fallback: Option<&'a str>,
}

/// Input for persisting an evaluation metric
#[derive(Debug, Clone)]
pub struct NewMetric<'a> {
    /// Graded search log, absent for aggregates
    pub search_log_id: Option<i64>,
    /// Metric kind
    pub kind: MetricKind,
    /// Metric value
    pub value: f64,
    /// Number of queries behind an aggregate value
    pub query_count: Option<i64>,
    /// Free-text note
    pub note: Option<&'a str>,
}

// ============================================================================
// STORAGE
// ============================================================================

/// Main storage struct with integrated vector index.
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self`, making Storage `Send + Sync` so the transport can
/// hold an `Arc<Storage>`.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    vector_index: Mutex<VectorIndex>,
}

impl Storage {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Create a new storage instance.
    ///
    /// `db_path` normally comes from `DATABASE_URL`; when absent the
    /// platform data directory is used.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "trove", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;
                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("trove.db")
            }
        };

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        // Apply migrations on the writer only; a failure here is the
        // unrecoverable startup case (exit code 2 in the transport)
        super::migrations::apply_migrations(&writer_conn)
            .map_err(|e| StorageError::Migration(e.to_string()))?;
        super::migrations::backfill_legacy_aliases(&writer_conn)
            .map_err(|e| StorageError::Migration(e.to_string()))?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        let storage = Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            vector_index: Mutex::new(VectorIndex::new()),
        };

        storage.load_embeddings_into_index()?;
        Ok(storage)
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    fn lock_reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    fn lock_index(&self) -> Result<std::sync::MutexGuard<'_, VectorIndex>> {
        self.vector_index
            .lock()
            .map_err(|_| StorageError::Init("Vector index lock poisoned".into()))
    }

    /// Load existing embeddings into the vector index
    fn load_embeddings_into_index(&self) -> Result<()> {
        let rows: Vec<(i64, String, String, f64, String)> = {
            let reader = self.lock_reader()?;
            let mut stmt = reader.prepare(
                "SELECT e.product_id, e.vector, p.category, p.price, p.availability
                 FROM product_embeddings e
                 JOIN products p ON p.id = e.product_id",
            )?;
            let mapped = stmt.query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?;
            mapped.filter_map(|r| r.ok()).collect()
        };

        let mut index = self.lock_index()?;
        for (product_id, vector_json, category, price, availability) in rows {
            let Some(embedding) = Embedding::from_json(&vector_json) else {
                tracing::warn!(product_id, "unparseable stored vector; skipping");
                continue;
            };
            let attrs = IndexAttrs {
                category,
                price,
                availability: Availability::parse_name(&availability).unwrap_or_default(),
            };
            if let Err(e) = index.upsert(product_id, embedding.vector, attrs) {
                tracing::warn!(product_id, "failed to index embedding: {}", e);
            }
        }
        Ok(())
    }

    // ========================================================================
    // PRODUCTS
    // ========================================================================

    /// Idempotent product upsert. With an explicit id the row is replaced
    /// in place (created_at preserved); without one the store assigns the
    /// next id. Duplicate skus surface as a conflict.
    pub fn upsert_product(&self, input: &ProductInput) -> Result<Product> {
        input.validate().map_err(StorageError::Invalid)?;
        let now = Utc::now().to_rfc3339();
        let features = serde_json::to_string(&input.features).unwrap_or_else(|_| "[]".to_string());

        let id = {
            let writer = self.lock_writer()?;
            match input.id {
                Some(id) => {
                    writer
                        .execute(
                            "INSERT INTO products (
                                id, sku, title, description, category, subcategory, brand,
                                features, price, original_price, currency, rating, review_count,
                                availability, stock_quantity, image_url, featured,
                                created_at, updated_at
                            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18)
                            ON CONFLICT(id) DO UPDATE SET
                                sku = excluded.sku,
                                title = excluded.title,
                                description = excluded.description,
                                category = excluded.category,
                                subcategory = excluded.subcategory,
                                brand = excluded.brand,
                                features = excluded.features,
                                price = excluded.price,
                                original_price = excluded.original_price,
                                currency = excluded.currency,
                                rating = excluded.rating,
                                review_count = excluded.review_count,
                                availability = excluded.availability,
                                stock_quantity = excluded.stock_quantity,
                                image_url = excluded.image_url,
                                featured = excluded.featured,
                                updated_at = excluded.updated_at",
                            params![
                                id,
                                input.sku,
                                input.title,
                                input.description,
                                input.category,
                                input.subcategory,
                                input.brand,
                                features,
                                input.price,
                                input.original_price,
                                input.currency,
                                input.rating,
                                input.review_count,
                                input.availability.as_str(),
                                input.stock_quantity,
                                input.image_url,
                                input.featured as i64,
                                now,
                            ],
                        )
                        .map_err(|e| map_constraint(e, &format!("sku {:?}", input.sku)))?;
                    id
                }
                None => {
                    writer
                        .execute(
                            "INSERT INTO products (
                                sku, title, description, category, subcategory, brand,
                                features, price, original_price, currency, rating, review_count,
                                availability, stock_quantity, image_url, featured,
                                created_at, updated_at
                            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)",
                            params![
                                input.sku,
                                input.title,
                                input.description,
                                input.category,
                                input.subcategory,
                                input.brand,
                                features,
                                input.price,
                                input.original_price,
                                input.currency,
                                input.rating,
                                input.review_count,
                                input.availability.as_str(),
                                input.stock_quantity,
                                input.image_url,
                                input.featured as i64,
                                now,
                            ],
                        )
                        .map_err(|e| map_constraint(e, &format!("sku {:?}", input.sku)))?;
                    writer.last_insert_rowid()
                }
            }
        };

        self.refresh_index_attrs(id)?;
        self.get_product(id)?
            .ok_or_else(|| StorageError::NotFound(format!("product {id}")))
    }

    /// Apply a partial update to an existing product
    pub fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<Product> {
        let mut product = self
            .get_product(id)?
            .ok_or_else(|| StorageError::NotFound(format!("product {id}")))?;

        if let Some(sku) = &patch.sku {
            product.sku = sku.clone();
        }
        if let Some(title) = &patch.title {
            product.title = title.clone();
        }
        if let Some(description) = &patch.description {
            product.description = description.clone();
        }
        if let Some(category) = &patch.category {
            product.category = category.clone();
        }
        if let Some(subcategory) = &patch.subcategory {
            product.subcategory = subcategory.clone();
        }
        if let Some(brand) = &patch.brand {
            product.brand = brand.clone();
        }
        if let Some(features) = &patch.features {
            product.features = features.clone();
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(original_price) = &patch.original_price {
            product.original_price = *original_price;
        }
        if let Some(currency) = &patch.currency {
            product.currency = currency.clone();
        }
        if let Some(rating) = &patch.rating {
            product.rating = *rating;
        }
        if let Some(review_count) = patch.review_count {
            product.review_count = review_count;
        }
        if let Some(availability) = patch.availability {
            product.availability = availability;
        }
        if let Some(stock_quantity) = patch.stock_quantity {
            product.stock_quantity = stock_quantity;
        }
        if let Some(image_url) = &patch.image_url {
            product.image_url = image_url.clone();
        }
        if let Some(featured) = patch.featured {
            product.featured = featured;
        }

        let input = ProductInput {
            id: Some(id),
            sku: product.sku.clone(),
            title: product.title.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            brand: product.brand.clone(),
            features: product.features.clone(),
            price: product.price,
            original_price: product.original_price,
            currency: product.currency.clone(),
            rating: product.rating,
            review_count: product.review_count,
            availability: product.availability,
            stock_quantity: product.stock_quantity,
            image_url: product.image_url.clone(),
            featured: product.featured,
        };
        self.upsert_product(&input)
    }

    /// Delete a product; cascades to its embedding
    pub fn delete_product(&self, id: i64) -> Result<bool> {
        let deleted = {
            let writer = self.lock_writer()?;
            writer.execute("DELETE FROM products WHERE id = ?1", params![id])? > 0
        };
        if deleted {
            self.lock_index()?.remove(id);
        }
        Ok(deleted)
    }

    /// Get a product by id
    pub fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare("SELECT * FROM products WHERE id = ?1")?;
        let product = stmt
            .query_row(params![id], |row| Self::row_to_product(row))
            .optional()?;
        Ok(product)
    }

    /// Fetch several products by id (missing ids are silently dropped)
    pub fn get_products(&self, ids: &[i64]) -> Result<Vec<Product>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare("SELECT * FROM products WHERE id = ?1")?;
        let mut products = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(product) = stmt
                .query_row(params![id], |row| Self::row_to_product(row))
                .optional()?
            {
                products.push(product);
            }
        }
        Ok(products)
    }

    /// The bounded candidate set for a search: most-recent products joined
    /// with their stored vectors
    pub fn fetch_candidates(&self, limit: usize) -> Result<Vec<RankCandidate>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT p.*, e.vector AS vector
             FROM products p
             LEFT JOIN product_embeddings e ON e.product_id = p.id
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let product = Self::row_to_product(row)?;
            let vector_json: Option<String> = row.get("vector")?;
            Ok((product, vector_json))
        })?;

        let mut candidates = Vec::new();
        for row in rows {
            let (product, vector_json) = row?;
            let vector = vector_json
                .as_deref()
                .and_then(Embedding::from_json)
                .map(|e| e.vector);
            candidates.push(RankCandidate { product, vector });
        }
        Ok(candidates)
    }

    /// Featured products ordered by rating descending (ties by id): the
    /// trending / cold-start pool
    pub fn featured_products(&self, limit: usize) -> Result<Vec<Product>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM products
             WHERE featured = 1
             ORDER BY rating DESC NULLS LAST, id ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| Self::row_to_product(row))?;
        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    /// Products sharing a category, excluding one id: the similar-products
    /// fallback when the target has no embedding
    pub fn products_in_category(
        &self,
        category: &str,
        exclude_id: i64,
        limit: usize,
    ) -> Result<Vec<Product>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM products
             WHERE category = ?1 COLLATE NOCASE AND id != ?2
             ORDER BY rating DESC NULLS LAST, id ASC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![category, exclude_id, limit as i64], |row| {
            Self::row_to_product(row)
        })?;
        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    /// Products with no stored embedding yet, id-ascending
    pub fn products_missing_embeddings(&self, limit: usize) -> Result<Vec<Product>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT p.* FROM products p
             LEFT JOIN product_embeddings e ON e.product_id = p.id
             WHERE e.product_id IS NULL
             ORDER BY p.id ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| Self::row_to_product(row))?;
        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    /// Page through the whole catalog in id order (batch embedding)
    pub fn products_page(&self, after_id: i64, limit: usize) -> Result<Vec<Product>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM products WHERE id > ?1 ORDER BY id ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![after_id, limit as i64], |row| {
            Self::row_to_product(row)
        })?;
        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    /// Total number of products
    pub fn count_products(&self) -> Result<i64> {
        let reader = self.lock_reader()?;
        let count = reader.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count)
    }

    // ========================================================================
    // EMBEDDINGS
    // ========================================================================

    /// Idempotent embedding upsert keyed by product id. Stores the JSON
    /// vector plus the (truncated) source text and model tag for audit,
    /// and refreshes the vector index.
    pub fn upsert_embedding(
        &self,
        product_id: i64,
        embedding: &Embedding,
        source_text: &str,
        model: &str,
    ) -> Result<()> {
        let product = self
            .get_product(product_id)?
            .ok_or_else(|| StorageError::NotFound(format!("product {product_id}")))?;

        let mut stored = embedding.clone();
        if !stored.is_unit_length() {
            stored.normalize();
        }

        let now = Utc::now().to_rfc3339();
        {
            let writer = self.lock_writer()?;
            writer.execute(
                "INSERT INTO product_embeddings (product_id, vector, source_text, model, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(product_id) DO UPDATE SET
                     vector = excluded.vector,
                     source_text = excluded.source_text,
                     model = excluded.model,
                     updated_at = excluded.updated_at",
                params![
                    product_id,
                    stored.to_json(),
                    truncate_chars(source_text, MAX_SOURCE_TEXT_CHARS),
                    model,
                    now,
                ],
            )?;
        }

        self.lock_index()?
            .upsert(product_id, stored.vector, IndexAttrs::from(&product))
            .map_err(|e| StorageError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Read a stored vector back from the database
    pub fn get_embedding(&self, product_id: i64) -> Result<Option<Vec<f32>>> {
        let reader = self.lock_reader()?;
        let vector_json: Option<String> = reader
            .query_row(
                "SELECT vector FROM product_embeddings WHERE product_id = ?1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(vector_json
            .as_deref()
            .and_then(Embedding::from_json)
            .map(|e| e.vector))
    }

    /// Drop a stored embedding (the product stays usable via the
    /// deterministic fallback)
    pub fn delete_embedding(&self, product_id: i64) -> Result<bool> {
        let deleted = {
            let writer = self.lock_writer()?;
            writer.execute(
                "DELETE FROM product_embeddings WHERE product_id = ?1",
                params![product_id],
            )? > 0
        };
        if deleted {
            self.lock_index()?.remove(product_id);
        }
        Ok(deleted)
    }

    /// All indexed (product id, vector) pairs, id-ascending
    pub fn all_embeddings(&self) -> Result<Vec<(i64, Vec<f32>)>> {
        let reader = self.lock_reader()?;
        let mut stmt =
            reader.prepare("SELECT product_id, vector FROM product_embeddings ORDER BY product_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut embeddings = Vec::new();
        for row in rows {
            let (product_id, vector_json) = row?;
            if let Some(embedding) = Embedding::from_json(&vector_json) {
                embeddings.push((product_id, embedding.vector));
            }
        }
        Ok(embeddings)
    }

    /// Cosine scan over the vector index
    pub fn scan_embeddings(
        &self,
        query: &[f32],
        filter: &ScanFilter,
        k: usize,
    ) -> Result<Vec<(i64, f32)>> {
        Ok(self.lock_index()?.scan(query, filter, k))
    }

    /// Fast vector lookup through the index
    pub fn lookup_vector(&self, product_id: i64) -> Result<Option<Vec<f32>>> {
        Ok(self.lock_index()?.lookup(product_id).map(|v| v.to_vec()))
    }

    /// Number of stored embeddings
    pub fn count_embeddings(&self) -> Result<i64> {
        let reader = self.lock_reader()?;
        let count =
            reader.query_row("SELECT COUNT(*) FROM product_embeddings", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Keep the index's filterable attributes in sync after a product write
    fn refresh_index_attrs(&self, product_id: i64) -> Result<()> {
        let mut index = self.lock_index()?;
        if let Some(vector) = index.lookup(product_id).map(|v| v.to_vec()) {
            if let Some(product) = self.get_product(product_id)? {
                let _ = index.upsert(product_id, vector, IndexAttrs::from(&product));
            }
        }
        Ok(())
    }

    // ========================================================================
    // SESSIONS & INTERACTIONS
    // ========================================================================

    /// Get a session by id
    pub fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare("SELECT * FROM sessions WHERE id = ?1")?;
        let session = stmt
            .query_row(params![id], |row| Self::row_to_session(row))
            .optional()?;
        Ok(session)
    }

    /// Append an interaction, creating the session row on first contact and
    /// bumping its last-active timestamp. The whole write is one
    /// transaction; the referenced product must exist.
    pub fn record_interaction(
        &self,
        input: &InteractionInput,
        now: DateTime<Utc>,
    ) -> Result<Interaction> {
        if input.session_id.is_empty() {
            return Err(StorageError::Invalid("session id must be non-empty".into()));
        }

        let now_str = now.to_rfc3339();
        let expires = (now + Duration::days(SESSION_TTL_DAYS)).to_rfc3339();
        let id = {
            let mut writer = self.lock_writer()?;
            let tx = writer.transaction()?;

            let product_exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM products WHERE id = ?1",
                    params![input.product_id],
                    |row| row.get(0),
                )
                .optional()?;
            if product_exists.is_none() {
                return Err(StorageError::NotFound(format!("product {}", input.product_id)));
            }

            tx.execute(
                "INSERT INTO sessions (id, created_at, last_active_at, expires_at)
                 VALUES (?1, ?2, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET last_active_at = excluded.last_active_at",
                params![input.session_id, now_str, expires],
            )?;

            tx.execute(
                "INSERT INTO interactions (session_id, product_id, kind, query, position, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    input.session_id,
                    input.product_id,
                    input.kind.as_str(),
                    input.query,
                    input.position,
                    now_str,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            id
        };

        Ok(Interaction {
            id,
            session_id: input.session_id.clone(),
            product_id: input.product_id,
            kind: input.kind,
            query: input.query.clone(),
            position: input.position,
            created_at: now,
        })
    }

    /// Most-recent-first interactions for a session, timestamp ties broken
    /// by insertion order
    pub fn recent_interactions(&self, session_id: &str, limit: usize) -> Result<Vec<Interaction>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM interactions
             WHERE session_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![session_id, limit as i64], |row| {
            Self::row_to_interaction(row)
        })?;
        let mut interactions = Vec::new();
        for row in rows {
            interactions.push(row?);
        }
        Ok(interactions)
    }

    /// Distinct product ids from `view` events, most-recent-first
    pub fn recently_viewed_product_ids(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<i64>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT product_id FROM interactions
             WHERE session_id = ?1 AND kind = 'view'
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![session_id], |row| row.get::<_, i64>(0))?;

        let mut seen = std::collections::HashSet::new();
        let mut ids = Vec::new();
        for row in rows {
            let product_id = row?;
            if seen.insert(product_id) {
                ids.push(product_id);
                if ids.len() >= limit {
                    break;
                }
            }
        }
        Ok(ids)
    }

    // ========================================================================
    // RANKING WEIGHTS
    // ========================================================================

    /// The single active weight row. When none exists the default tuple is
    /// materialized, activated and returned in the same transaction: an
    /// upsert-and-return, not a recursive re-read.
    pub fn active_weights(&self) -> Result<RankingWeights> {
        let mut writer = self.lock_writer()?;
        let tx = writer.transaction()?;

        let existing = tx
            .query_row(
                "SELECT * FROM ranking_weights WHERE active = 1",
                [],
                |row| Self::row_to_weights(row),
            )
            .optional()?;
        if let Some(weights) = existing {
            tx.commit()?;
            return Ok(weights);
        }

        let defaults = RankingWeights::default();
        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO ranking_weights (name, semantic, rating, price, stock, recency, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
            params![
                defaults.name,
                defaults.semantic,
                defaults.rating,
                defaults.price,
                defaults.stock,
                defaults.recency,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let weights = tx.query_row(
            "SELECT * FROM ranking_weights WHERE id = ?1",
            params![id],
            |row| Self::row_to_weights(row),
        )?;
        tx.commit()?;

        tracing::info!("materialized default ranking weights");
        Ok(weights)
    }

    /// Replace the active weight row. The previous row is deactivated and
    /// kept for audit; exactly one row stays active.
    pub fn update_weights(&self, update: &WeightsUpdate) -> Result<RankingWeights> {
        let previous_name = self.active_weights()?.name;
        let candidate = RankingWeights {
            name: update.name.clone().unwrap_or(previous_name),
            semantic: update.semantic,
            rating: update.rating,
            price: update.price,
            stock: update.stock,
            recency: update.recency,
            ..Default::default()
        };
        candidate.validate().map_err(StorageError::Invalid)?;

        let now = Utc::now().to_rfc3339();
        let weights = {
            let mut writer = self.lock_writer()?;
            let tx = writer.transaction()?;
            tx.execute("UPDATE ranking_weights SET active = 0 WHERE active = 1", [])?;
            tx.execute(
                "INSERT INTO ranking_weights (name, semantic, rating, price, stock, recency, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
                params![
                    candidate.name,
                    candidate.semantic,
                    candidate.rating,
                    candidate.price,
                    candidate.stock,
                    candidate.recency,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();
            let weights = tx.query_row(
                "SELECT * FROM ranking_weights WHERE id = ?1",
                params![id],
                |row| Self::row_to_weights(row),
            )?;
            tx.commit()?;
            weights
        };

        weights.warn_if_unnormalized();
        Ok(weights)
    }

    // ========================================================================
    // SEARCH LOGS & EXPLANATIONS
    // ========================================================================

    /// Persist a search log together with its per-result explanations in
    /// one transaction. Returns the log id.
    pub fn insert_search_log(
        &self,
        log: &NewSearchLog<'_>,
        results: &[RankedResult],
    ) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let embedding_json =
            serde_json::to_string(log.query_embedding).unwrap_or_else(|_| "[]".to_string());
        let filters_json =
            serde_json::to_string(log.filters).unwrap_or_else(|_| "{}".to_string());

        let mut writer = self.lock_writer()?;
        let tx = writer.transaction()?;
        tx.execute(
            "INSERT INTO search_logs (session_id, query, query_embedding, result_count, response_time_ms, filters, fallback, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                log.session_id,
                log.query,
                embedding_json,
                results.len() as i64,
                log.response_time_ms,
                filters_json,
                log.fallback,
                now,
            ],
        )?;
        let log_id = tx.last_insert_rowid();

        for result in results {
            let matched_json = serde_json::to_string(&result.matched_terms)
                .unwrap_or_else(|_| "[]".to_string());
            tx.execute(
                "INSERT INTO search_explanations (
                    search_log_id, product_id, position, final_score,
                    semantic_score, rating_score, price_score, stock_score, recency_score,
                    matched_terms, explanation, was_clicked
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
                params![
                    log_id,
                    result.product.id,
                    result.rank as i64,
                    result.final_score,
                    result.sub_scores.semantic,
                    result.sub_scores.rating,
                    result.sub_scores.price,
                    result.sub_scores.stock,
                    result.sub_scores.recency,
                    matched_json,
                    result.explanation,
                ],
            )?;
        }
        tx.commit()?;
        Ok(log_id)
    }

    /// Get a search log by id
    pub fn get_search_log(&self, id: i64) -> Result<Option<SearchLog>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare("SELECT * FROM search_logs WHERE id = ?1")?;
        let log = stmt
            .query_row(params![id], |row| Self::row_to_search_log(row))
            .optional()?;
        Ok(log)
    }

    /// Newest-first page of search logs
    pub fn list_search_logs(&self, limit: usize, offset: usize) -> Result<Vec<SearchLog>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM search_logs ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
            Self::row_to_search_log(row)
        })?;
        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?);
        }
        Ok(logs)
    }

    /// Explanations for a log in ranked order; reproduces the exact ranking
    /// the user saw
    pub fn explanations_for_log(&self, log_id: i64) -> Result<Vec<SearchResultExplanation>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM search_explanations WHERE search_log_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![log_id], |row| Self::row_to_explanation(row))?;
        let mut explanations = Vec::new();
        for row in rows {
            explanations.push(row?);
        }
        Ok(explanations)
    }

    /// Mark the explanation row behind a search click. Finds the latest log
    /// for (session, query) and flags the matching product/position row.
    pub fn mark_explanation_clicked(
        &self,
        session_id: &str,
        product_id: i64,
        query: &str,
        position: Option<i64>,
    ) -> Result<bool> {
        let writer = self.lock_writer()?;
        let log_id: Option<i64> = writer
            .query_row(
                "SELECT id FROM search_logs
                 WHERE session_id = ?1 AND query = ?2
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
                params![session_id, query],
                |row| row.get(0),
            )
            .optional()?;
        let Some(log_id) = log_id else {
            return Ok(false);
        };

        let updated = match position {
            Some(position) => writer.execute(
                "UPDATE search_explanations SET was_clicked = 1
                 WHERE search_log_id = ?1 AND product_id = ?2 AND position = ?3",
                params![log_id, product_id, position],
            )?,
            None => writer.execute(
                "UPDATE search_explanations SET was_clicked = 1
                 WHERE search_log_id = ?1 AND product_id = ?2",
                params![log_id, product_id],
            )?,
        };
        Ok(updated > 0)
    }

    // ========================================================================
    // EVALUATION METRICS
    // ========================================================================

    /// Persist one evaluation metric row
    pub fn insert_metric(&self, metric: &NewMetric<'_>) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let writer = self.lock_writer()?;
        writer.execute(
            "INSERT INTO evaluation_metrics (search_log_id, kind, value, query_count, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                metric.search_log_id,
                metric.kind.as_str(),
                metric.value,
                metric.query_count,
                metric.note,
                now,
            ],
        )?;
        Ok(writer.last_insert_rowid())
    }

    /// Metrics attached to one search log
    pub fn metrics_for_log(&self, log_id: i64) -> Result<Vec<EvaluationMetric>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM evaluation_metrics WHERE search_log_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![log_id], |row| Self::row_to_metric(row))?;
        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(row?);
        }
        Ok(metrics)
    }

    /// Newest-first metrics, optionally restricted to one kind
    pub fn list_metrics(
        &self,
        kind: Option<MetricKind>,
        limit: usize,
    ) -> Result<Vec<EvaluationMetric>> {
        let reader = self.lock_reader()?;
        let mut metrics = Vec::new();
        match kind {
            Some(kind) => {
                let mut stmt = reader.prepare(
                    "SELECT * FROM evaluation_metrics WHERE kind = ?1
                     ORDER BY created_at DESC, id DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![kind.as_str(), limit as i64], |row| {
                    Self::row_to_metric(row)
                })?;
                for row in rows {
                    metrics.push(row?);
                }
            }
            None => {
                let mut stmt = reader.prepare(
                    "SELECT * FROM evaluation_metrics ORDER BY created_at DESC, id DESC LIMIT ?1",
                )?;
                let rows =
                    stmt.query_map(params![limit as i64], |row| Self::row_to_metric(row))?;
                for row in rows {
                    metrics.push(row?);
                }
            }
        }
        Ok(metrics)
    }

    // ========================================================================
    // UPLOAD JOBS
    // ========================================================================

    /// Create a pending job row
    pub fn create_job(&self, filename: &str) -> Result<CatalogUploadJob> {
        let now = Utc::now().to_rfc3339();
        let id = {
            let writer = self.lock_writer()?;
            writer.execute(
                "INSERT INTO upload_jobs (filename, status, created_at) VALUES (?1, 'pending', ?2)",
                params![filename, now],
            )?;
            writer.last_insert_rowid()
        };
        self.get_job(id)?
            .ok_or_else(|| StorageError::NotFound(format!("job {id}")))
    }

    /// Get a job by id
    pub fn get_job(&self, id: i64) -> Result<Option<CatalogUploadJob>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare("SELECT * FROM upload_jobs WHERE id = ?1")?;
        let job = stmt
            .query_row(params![id], |row| Self::row_to_job(row))
            .optional()?;
        Ok(job)
    }

    /// Advance a job through its monotonic state machine. Illegal
    /// transitions surface as conflicts.
    pub fn transition_job(&self, id: i64, next: JobStatus) -> Result<CatalogUploadJob> {
        let now = Utc::now().to_rfc3339();
        {
            let mut writer = self.lock_writer()?;
            let tx = writer.transaction()?;
            let current: String = tx
                .query_row(
                    "SELECT status FROM upload_jobs WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| StorageError::NotFound(format!("job {id}")))?;
            let current = JobStatus::parse_name(&current).unwrap_or_default();
            if !current.can_transition_to(next) {
                return Err(StorageError::Conflict(format!(
                    "job {id}: illegal transition {current} -> {next}"
                )));
            }

            tx.execute(
                "UPDATE upload_jobs SET
                    status = ?2,
                    started_at = CASE WHEN ?2 = 'processing' AND started_at IS NULL THEN ?3 ELSE started_at END,
                    completed_at = CASE WHEN ?2 IN ('completed', 'failed') THEN ?3 ELSE completed_at END
                 WHERE id = ?1",
                params![id, next.as_str(), now],
            )?;
            tx.commit()?;
        }
        self.get_job(id)?
            .ok_or_else(|| StorageError::NotFound(format!("job {id}")))
    }

    /// Set the total-items counter once the batch size is known
    pub fn set_job_total(&self, id: i64, total: i64) -> Result<()> {
        let writer = self.lock_writer()?;
        writer.execute(
            "UPDATE upload_jobs SET total_items = ?2 WHERE id = ?1",
            params![id, total],
        )?;
        Ok(())
    }

    /// Bump processed/embedded counters
    pub fn bump_job_progress(&self, id: i64, processed: i64, embedded: i64) -> Result<()> {
        let writer = self.lock_writer()?;
        writer.execute(
            "UPDATE upload_jobs SET
                processed_items = processed_items + ?2,
                embedded_items = embedded_items + ?3
             WHERE id = ?1",
            params![id, processed, embedded],
        )?;
        Ok(())
    }

    /// Fail a job with an error message
    pub fn fail_job(&self, id: i64, error: &str) -> Result<CatalogUploadJob> {
        {
            let writer = self.lock_writer()?;
            writer.execute(
                "UPDATE upload_jobs SET error = ?2 WHERE id = ?1",
                params![id, error],
            )?;
        }
        self.transition_job(id, JobStatus::Failed)
    }

    // ========================================================================
    // STATS
    // ========================================================================

    /// Aggregate catalog counters
    pub fn stats(&self) -> Result<CatalogStats> {
        let reader = self.lock_reader()?;
        let count = |sql: &str| -> Result<i64> {
            Ok(reader.query_row(sql, [], |row| row.get(0))?)
        };
        Ok(CatalogStats {
            products: count("SELECT COUNT(*) FROM products")?,
            embedded_products: count("SELECT COUNT(*) FROM product_embeddings")?,
            sessions: count("SELECT COUNT(*) FROM sessions")?,
            interactions: count("SELECT COUNT(*) FROM interactions")?,
            search_logs: count("SELECT COUNT(*) FROM search_logs")?,
        })
    }

    // ========================================================================
    // ROW MAPPERS
    // ========================================================================

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                    )),
                )
            })
    }

    fn parse_optional_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
        value.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
    }

    /// Convert a row to Product
    fn row_to_product(row: &rusqlite::Row) -> rusqlite::Result<Product> {
        let features_json: String = row.get("features")?;
        let features: Vec<String> = serde_json::from_str(&features_json).unwrap_or_default();

        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        let availability: String = row.get("availability")?;
        let featured: i64 = row.get("featured")?;

        Ok(Product {
            id: row.get("id")?,
            sku: row.get("sku")?,
            title: row.get("title")?,
            description: row.get("description")?,
            category: row.get("category")?,
            subcategory: row.get("subcategory")?,
            brand: row.get("brand")?,
            features,
            price: row.get("price")?,
            original_price: row.get("original_price")?,
            currency: row.get("currency")?,
            rating: row.get("rating")?,
            review_count: row.get("review_count")?,
            availability: Availability::parse_name(&availability).unwrap_or_default(),
            stock_quantity: row.get("stock_quantity")?,
            image_url: row.get("image_url")?,
            featured: featured != 0,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            updated_at: Self::parse_timestamp(&updated_at, "updated_at")?,
        })
    }

    /// Convert a row to Session
    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<Session> {
        let created_at: String = row.get("created_at")?;
        let last_active_at: String = row.get("last_active_at")?;
        let expires_at: String = row.get("expires_at")?;
        Ok(Session {
            id: row.get("id")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            last_active_at: Self::parse_timestamp(&last_active_at, "last_active_at")?,
            expires_at: Self::parse_timestamp(&expires_at, "expires_at")?,
        })
    }

    /// Convert a row to Interaction
    fn row_to_interaction(row: &rusqlite::Row) -> rusqlite::Result<Interaction> {
        let kind: String = row.get("kind")?;
        let created_at: String = row.get("created_at")?;
        Ok(Interaction {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            product_id: row.get("product_id")?,
            kind: InteractionKind::parse_name(&kind).unwrap_or(InteractionKind::View),
            query: row.get("query")?,
            position: row.get("position")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
        })
    }

    /// Convert a row to RankingWeights
    fn row_to_weights(row: &rusqlite::Row) -> rusqlite::Result<RankingWeights> {
        let active: i64 = row.get("active")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        Ok(RankingWeights {
            id: row.get("id")?,
            name: row.get("name")?,
            semantic: row.get("semantic")?,
            rating: row.get("rating")?,
            price: row.get("price")?,
            stock: row.get("stock")?,
            recency: row.get("recency")?,
            active: active != 0,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            updated_at: Self::parse_timestamp(&updated_at, "updated_at")?,
        })
    }

    /// Convert a row to SearchLog
    fn row_to_search_log(row: &rusqlite::Row) -> rusqlite::Result<SearchLog> {
        let embedding_json: String = row.get("query_embedding")?;
        let filters_json: String = row.get("filters")?;
        let created_at: String = row.get("created_at")?;
        Ok(SearchLog {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            query: row.get("query")?,
            query_embedding: serde_json::from_str(&embedding_json).unwrap_or_default(),
            result_count: row.get("result_count")?,
            response_time_ms: row.get("response_time_ms")?,
            filters: serde_json::from_str(&filters_json).unwrap_or_default(),
            fallback: row.get("fallback")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
        })
    }

    /// Convert a row to SearchResultExplanation
    fn row_to_explanation(row: &rusqlite::Row) -> rusqlite::Result<SearchResultExplanation> {
        let matched_json: String = row.get("matched_terms")?;
        let was_clicked: i64 = row.get("was_clicked")?;
        Ok(SearchResultExplanation {
            id: row.get("id")?,
            search_log_id: row.get("search_log_id")?,
            product_id: row.get("product_id")?,
            position: row.get("position")?,
            final_score: row.get("final_score")?,
            sub_scores: SubScores {
                semantic: row.get("semantic_score")?,
                rating: row.get("rating_score")?,
                price: row.get("price_score")?,
                stock: row.get("stock_score")?,
                recency: row.get("recency_score")?,
            },
            matched_terms: serde_json::from_str(&matched_json).unwrap_or_default(),
            explanation: row.get("explanation")?,
            was_clicked: was_clicked != 0,
        })
    }

    /// Convert a row to EvaluationMetric
    fn row_to_metric(row: &rusqlite::Row) -> rusqlite::Result<EvaluationMetric> {
        let kind: String = row.get("kind")?;
        let created_at: String = row.get("created_at")?;
        Ok(EvaluationMetric {
            id: row.get("id")?,
            search_log_id: row.get("search_log_id")?,
            kind: MetricKind::parse_name(&kind).unwrap_or(MetricKind::Custom),
            value: row.get("value")?,
            query_count: row.get("query_count")?,
            note: row.get("note")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
        })
    }

    /// Convert a row to CatalogUploadJob
    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<CatalogUploadJob> {
        let status: String = row.get("status")?;
        let created_at: String = row.get("created_at")?;
        let started_at: Option<String> = row.get("started_at")?;
        let completed_at: Option<String> = row.get("completed_at")?;
        Ok(CatalogUploadJob {
            id: row.get("id")?,
            filename: row.get("filename")?,
            status: JobStatus::parse_name(&status).unwrap_or_default(),
            total_items: row.get("total_items")?,
            processed_items: row.get("processed_items")?,
            embedded_items: row.get("embedded_items")?,
            error: row.get("error")?,
            started_at: Self::parse_optional_timestamp(started_at),
            completed_at: Self::parse_optional_timestamp(completed_at),
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
