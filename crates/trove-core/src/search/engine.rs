//! Search Orchestrator
//!
//! Glue for the search path: resolve session → embed query (soft deadline,
//! deterministic fallback) → fetch candidates → rank under the active
//! weights → persist log + explanations → keyword fallback when the ranker
//! comes back empty.
//!
//! Also hosts the admin surface: product writes with re-embedding, weight
//! updates, batch embedding jobs and offline metric calculation.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::catalog::{
    CatalogUploadJob, JobStatus, Product, ProductInput, ProductPatch, SearchFilters, Session,
};
use crate::embeddings::{DeterministicEmbedder, Embedder, MAX_QUERY_CHARS};
use crate::error::{EngineError, Result};
use crate::eval::{evaluate, synthesize_judgments, IrMetrics, MetricKind, ResultEntry};
use crate::ranking::{
    rank, RankOptions, RankedResult, RankingWeights, WeightsCache, WeightsUpdate,
    DEFAULT_MIN_SCORE,
};
use crate::search::keyword::{has_searchable_terms, keyword_search};
use crate::storage::{NewMetric, NewSearchLog, SearchLog, Storage};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Most results a single search may return
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Batch size for the embedding pipeline
pub const EMBED_BATCH_SIZE: usize = 32;

/// Cutoff used by offline metric calculation
const METRICS_CUTOFF: usize = 10;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Orchestrator tuning knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whole-search wall-clock budget; exceeding it is a timeout error
    pub hard_deadline: Duration,
    /// Budget for the embedding call; exceeding it degrades the request to
    /// the deterministic provider
    pub soft_embed_deadline: Duration,
    /// Upper bound on the candidate set fetched per query
    pub candidate_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hard_deadline: Duration::from_millis(1500),
            soft_embed_deadline: Duration::from_millis(500),
            candidate_limit: 5000,
        }
    }
}

// ============================================================================
// REQUEST / RESPONSE
// ============================================================================

/// A search request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchRequest {
    /// Natural-language query
    pub query: String,
    /// Session id; a fresh one is issued when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Category/price/stock filters plus an optional score threshold
    #[serde(default)]
    pub filters: SearchFilters,
    /// Result limit, 1..=50
    pub limit: usize,
}

/// A search response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Ranked, explained results
    pub results: Vec<RankedResult>,
    /// Persisted audit-trail row for this query
    pub search_log_id: i64,
    /// Measured wall-clock response time
    pub response_time_ms: i64,
    /// Session the query ran under (issued here when the request carried none)
    pub session_id: String,
    /// True when the deterministic embedder stood in for the real model
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    #[serde(default)]
    pub degraded: bool,
    /// "keyword" when the fallback path produced the results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

/// Outcome of an offline metric calculation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// How many logged queries were graded
    pub queries_evaluated: usize,
    /// Mean metrics over those queries
    pub mean: IrMetrics,
}

/// Cooperative cancellation flag, checked at the search's suspension
/// points. A cancelled search writes no log row.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an uncancelled flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// SEARCH ENGINE
// ============================================================================

/// The search orchestrator
pub struct SearchEngine {
    storage: Arc<Storage>,
    embedder: Arc<dyn Embedder>,
    fallback: DeterministicEmbedder,
    weights_cache: WeightsCache,
    /// Query-embedding cache. Only vectors from the real provider land
    /// here, never degraded fallback vectors.
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
    config: EngineConfig,
}

impl SearchEngine {
    /// Create an engine over the shared repository and the primary
    /// embedding provider
    pub fn new(storage: Arc<Storage>, embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(storage, embedder, EngineConfig::default())
    }

    /// Create an engine with custom tuning
    pub fn with_config(
        storage: Arc<Storage>,
        embedder: Arc<dyn Embedder>,
        config: EngineConfig,
    ) -> Self {
        Self {
            storage,
            embedder,
            fallback: DeterministicEmbedder::new(),
            weights_cache: WeightsCache::default(),
            query_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(100).expect("100 is non-zero"),
            )),
            config,
        }
    }

    /// Shared repository handle
    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    // ========================================================================
    // SEARCH
    // ========================================================================

    /// Execute a search under the hard deadline
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.search_cancellable(request, &CancelFlag::new()).await
    }

    /// Execute a search that can be cancelled cooperatively
    pub async fn search_cancellable(
        &self,
        request: &SearchRequest,
        cancel: &CancelFlag,
    ) -> Result<SearchResponse> {
        match tokio::time::timeout(self.config.hard_deadline, self.search_inner(request, cancel))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout),
        }
    }

    async fn search_inner(
        &self,
        request: &SearchRequest,
        cancel: &CancelFlag,
    ) -> Result<SearchResponse> {
        let started = Instant::now();

        let query = request.query.trim();
        if query.is_empty() {
            return Err(EngineError::InvalidInput("query must be non-empty".into()));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(EngineError::InvalidInput(format!(
                "query exceeds {MAX_QUERY_CHARS} characters"
            )));
        }
        if request.limit == 0 || request.limit > MAX_SEARCH_LIMIT {
            return Err(EngineError::InvalidInput(format!(
                "limit must be in 1..={MAX_SEARCH_LIMIT}"
            )));
        }

        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(Session::issue_id);

        cancel.check()?;
        let (query_vector, degraded) = self.embed_query(query).await;

        cancel.check()?;
        let candidates = self.storage.fetch_candidates(self.config.candidate_limit)?;
        let filtered: Vec<_> = candidates
            .into_iter()
            .filter(|c| request.filters.matches(&c.product))
            .collect();

        let weights = self
            .weights_cache
            .get_or_load(|| self.storage.active_weights())?;

        let options = RankOptions {
            min_score: request.filters.min_score.unwrap_or(DEFAULT_MIN_SCORE),
            limit: request.limit,
        };
        let now = Utc::now();
        let mut results = rank(query, &query_vector, &filtered, &weights, &options, now);

        let mut fallback_tag: Option<&str> = None;
        if results.is_empty() && has_searchable_terms(query) {
            let products: Vec<Product> =
                filtered.iter().map(|c| c.product.clone()).collect();
            results = keyword_search(query, &products, request.limit);
            fallback_tag = Some("keyword");
            tracing::warn!(query, hits = results.len(), "semantic path empty; keyword fallback");
        }

        cancel.check()?;
        let response_time_ms = started.elapsed().as_millis() as i64;
        let search_log_id = self.storage.insert_search_log(
            &NewSearchLog {
                session_id: &session_id,
                query,
                query_embedding: &query_vector,
                response_time_ms,
                filters: &request.filters,
                fallback: fallback_tag,
            },
            &results,
        )?;

        Ok(SearchResponse {
            results,
            search_log_id,
            response_time_ms,
            session_id,
            degraded,
            fallback: fallback_tag.map(str::to_string),
        })
    }

    /// Embed the query, degrading to the deterministic provider on error or
    /// soft-deadline overrun. Returns the vector and the degraded flag.
    async fn embed_query(&self, query: &str) -> (Vec<f32>, bool) {
        if let Ok(mut cache) = self.query_cache.lock() {
            if let Some(vector) = cache.get(query) {
                tracing::debug!(query, "query embedding cache hit");
                return (vector.clone(), false);
            }
        }

        let embedded =
            tokio::time::timeout(self.config.soft_embed_deadline, self.embedder.embed(query))
                .await;
        match embedded {
            Ok(Ok(embedding)) => {
                if let Ok(mut cache) = self.query_cache.lock() {
                    cache.put(query.to_string(), embedding.vector.clone());
                }
                (embedding.vector, false)
            }
            Ok(Err(e)) => {
                tracing::warn!(query, "embedding provider failed ({}); degrading", e);
                (self.fallback.embed_text(query).vector, true)
            }
            Err(_) => {
                tracing::warn!(query, "embedding call missed soft deadline; degrading");
                (self.fallback.embed_text(query).vector, true)
            }
        }
    }

    // ========================================================================
    // ADMIN: WEIGHTS
    // ========================================================================

    /// The active weight tuple (reads through the repository, not the cache)
    pub fn get_weights(&self) -> Result<RankingWeights> {
        Ok(self.storage.active_weights()?)
    }

    /// Replace the active weight tuple and invalidate the search-path cache
    pub fn update_weights(&self, update: &WeightsUpdate) -> Result<RankingWeights> {
        let weights = self.storage.update_weights(update)?;
        self.weights_cache.invalidate();
        Ok(weights)
    }

    // ========================================================================
    // ADMIN: PRODUCTS
    // ========================================================================

    /// Create or upsert a product and embed it. An embedding failure is
    /// recoverable: the product is kept without a vector until a later
    /// batch run succeeds.
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product> {
        let product = self.storage.upsert_product(input)?;
        self.try_embed_product(&product).await;
        Ok(product)
    }

    /// Patch a product; descriptive-text changes trigger a re-embed
    pub async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<Product> {
        let product = self.storage.update_product(id, patch)?;
        if patch.touches_descriptive_text() {
            self.try_embed_product(&product).await;
        }
        Ok(product)
    }

    /// Delete a product (embedding cascades)
    pub fn delete_product(&self, id: i64) -> Result<bool> {
        Ok(self.storage.delete_product(id)?)
    }

    /// Re-embed one product through the primary provider
    pub async fn regenerate_embedding(&self, id: i64) -> Result<()> {
        let product = self
            .storage
            .get_product(id)?
            .ok_or_else(|| EngineError::NotFound(format!("product {id}")))?;
        let text = product.embedding_text();
        let embedding = self.embedder.embed(&text).await?;
        self.storage
            .upsert_embedding(id, &embedding, &text, self.embedder.model_tag())?;
        Ok(())
    }

    async fn try_embed_product(&self, product: &Product) {
        let text = product.embedding_text();
        match self.embedder.embed(&text).await {
            Ok(embedding) => {
                if let Err(e) = self.storage.upsert_embedding(
                    product.id,
                    &embedding,
                    &text,
                    self.embedder.model_tag(),
                ) {
                    tracing::warn!(product_id = product.id, "failed to store embedding: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(
                    product_id = product.id,
                    "embedding failed ({}); product retained without vector",
                    e
                );
            }
        }
    }

    // ========================================================================
    // ADMIN: BATCH EMBEDDING
    // ========================================================================

    /// Re-embed the whole catalog under an upload job:
    /// pending → processing → embedding → completed | failed.
    ///
    /// Each product's upsert is retried independently, so one stubborn row
    /// cannot sink the batch; the job is resumable by simply running a
    /// fresh one.
    pub async fn regenerate_all_embeddings(&self) -> Result<CatalogUploadJob> {
        let job = self.storage.create_job("regenerate-all-embeddings")?;
        let job_id = job.id;
        self.storage.transition_job(job_id, JobStatus::Processing)?;
        let total = self.storage.count_products()?;
        self.storage.set_job_total(job_id, total)?;
        self.storage.transition_job(job_id, JobStatus::Embedding)?;

        let mut after_id = 0;
        loop {
            let batch = match self.storage.products_page(after_id, EMBED_BATCH_SIZE) {
                Ok(batch) => batch,
                Err(e) => {
                    let failed = self.storage.fail_job(job_id, &e.to_string())?;
                    return Ok(failed);
                }
            };
            if batch.is_empty() {
                break;
            }
            after_id = batch.last().map(|p| p.id).unwrap_or(after_id);

            let texts: Vec<String> = batch.iter().map(|p| p.embedding_text()).collect();
            let embedded = match self.embedder.embed_batch(&texts).await {
                Ok(embeddings) => {
                    let mut stored = 0;
                    for (product, embedding) in batch.iter().zip(embeddings.iter()) {
                        if self.store_with_retry(product, embedding) {
                            stored += 1;
                        }
                    }
                    stored
                }
                Err(e) => {
                    // Batch-level failure: retry each product on its own
                    tracing::warn!(job_id, "batch embed failed ({}); per-product retry", e);
                    let mut stored = 0;
                    for product in &batch {
                        let text = product.embedding_text();
                        if let Ok(embedding) = self.embedder.embed(&text).await {
                            if self.store_with_retry(product, &embedding) {
                                stored += 1;
                            }
                        }
                    }
                    stored
                }
            };

            self.storage
                .bump_job_progress(job_id, batch.len() as i64, embedded)?;
        }

        Ok(self.storage.transition_job(job_id, JobStatus::Completed)?)
    }

    fn store_with_retry(&self, product: &Product, embedding: &crate::embeddings::Embedding) -> bool {
        let text = product.embedding_text();
        for attempt in 0..2 {
            match self
                .storage
                .upsert_embedding(product.id, embedding, &text, self.embedder.model_tag())
            {
                Ok(()) => return true,
                Err(e) if attempt == 0 => {
                    tracing::warn!(product_id = product.id, "embedding upsert failed ({}); retrying", e);
                }
                Err(e) => {
                    tracing::error!(product_id = product.id, "embedding upsert failed twice: {}", e);
                }
            }
        }
        false
    }

    // ========================================================================
    // ADMIN: LOGS & METRICS
    // ========================================================================

    /// Newest-first page of search logs
    pub fn list_search_logs(&self, limit: usize, offset: usize) -> Result<Vec<SearchLog>> {
        Ok(self.storage.list_search_logs(limit, offset)?)
    }

    /// Grade the most recent logged queries with synthesized judgments and
    /// persist per-query plus aggregate metric rows.
    ///
    /// The judgments are an acknowledged weak signal; every row is labelled
    /// auto-judged so the numbers are never mistaken for human grading.
    pub fn calculate_metrics(&self, sample: usize) -> Result<MetricsSummary> {
        let logs = self.storage.list_search_logs(sample, 0)?;
        let mut accumulated = IrMetrics::default();
        let mut evaluated = 0_usize;

        for log in &logs {
            let explanations = self.storage.explanations_for_log(log.id)?;
            if explanations.is_empty() {
                continue;
            }
            let ids: Vec<i64> = explanations.iter().map(|e| e.product_id).collect();
            let products = self.storage.get_products(&ids)?;
            let judgments = synthesize_judgments(&log.query, &products);
            let results: Vec<ResultEntry> = explanations
                .iter()
                .map(|e| ResultEntry {
                    product_id: e.product_id,
                    position: e.position as usize,
                    final_score: e.final_score,
                })
                .collect();
            let metrics = evaluate(&results, &judgments, METRICS_CUTOFF);

            for (kind, value) in [
                (MetricKind::NdcgAt10, metrics.ndcg),
                (MetricKind::RecallAt10, metrics.recall),
                (MetricKind::PrecisionAt10, metrics.precision),
                (MetricKind::Mrr, metrics.mrr),
            ] {
                self.storage.insert_metric(&NewMetric {
                    search_log_id: Some(log.id),
                    kind,
                    value,
                    query_count: None,
                    note: Some("auto-judged"),
                })?;
            }

            accumulated.ndcg += metrics.ndcg;
            accumulated.recall += metrics.recall;
            accumulated.precision += metrics.precision;
            accumulated.mrr += metrics.mrr;
            accumulated.ap += metrics.ap;
            evaluated += 1;
        }

        let mean = if evaluated > 0 {
            let count = evaluated as f64;
            IrMetrics {
                ndcg: accumulated.ndcg / count,
                recall: accumulated.recall / count,
                precision: accumulated.precision / count,
                mrr: accumulated.mrr / count,
                ap: accumulated.ap / count,
            }
        } else {
            IrMetrics::default()
        };

        if evaluated > 0 {
            for (kind, value) in [
                (MetricKind::NdcgAt10, mean.ndcg),
                (MetricKind::RecallAt10, mean.recall),
                (MetricKind::PrecisionAt10, mean.precision),
                (MetricKind::Mrr, mean.mrr),
            ] {
                self.storage.insert_metric(&NewMetric {
                    search_log_id: None,
                    kind,
                    value,
                    query_count: Some(evaluated as i64),
                    note: Some("auto-judged aggregate"),
                })?;
            }
        }

        Ok(MetricsSummary {
            queries_evaluated: evaluated,
            mean,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
