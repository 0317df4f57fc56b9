//! Database Migrations
//!
//! Schema migration definitions for the storage layer, plus the one-shot
//! backfill of legacy camelCase column aliases left behind by the old
//! importer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: products, embeddings, sessions, interactions, weights",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Search logs, per-result explanations, evaluation metrics",
        up: MIGRATION_V2_UP,
    },
    Migration {
        version: 3,
        description: "Catalog upload jobs for batch import observability",
        up: MIGRATION_V3_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sku TEXT UNIQUE,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT '',
    subcategory TEXT,
    brand TEXT,
    features TEXT NOT NULL DEFAULT '[]',
    price REAL NOT NULL DEFAULT 0,
    original_price REAL,
    currency TEXT NOT NULL DEFAULT 'USD',
    rating REAL,
    review_count INTEGER NOT NULL DEFAULT 0,
    availability TEXT NOT NULL DEFAULT 'in_stock',
    stock_quantity INTEGER NOT NULL DEFAULT 0,
    image_url TEXT,
    featured INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_created ON products(created_at);
CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
CREATE INDEX IF NOT EXISTS idx_products_featured ON products(featured);

-- One embedding per product; the vector is a JSON array of floats,
-- the only serialization the core commits to
CREATE TABLE IF NOT EXISTS product_embeddings (
    product_id INTEGER PRIMARY KEY REFERENCES products(id) ON DELETE CASCADE,
    vector TEXT NOT NULL,
    source_text TEXT NOT NULL DEFAULT '',
    model TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    last_active_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

-- product_id is validated at insert time, not by a foreign key: the
-- append-only log outlives product deletion for aggregate analytics
CREATE TABLE IF NOT EXISTS interactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    product_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    query TEXT,
    position INTEGER,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_interactions_session ON interactions(session_id, created_at);
CREATE INDEX IF NOT EXISTS idx_interactions_product ON interactions(product_id);

CREATE TABLE IF NOT EXISTS ranking_weights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL DEFAULT 'default',
    semantic REAL NOT NULL,
    rating REAL NOT NULL,
    price REAL NOT NULL,
    stock REAL NOT NULL,
    recency REAL NOT NULL,
    active INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- At most one active row at any time
CREATE UNIQUE INDEX IF NOT EXISTS idx_weights_single_active
    ON ranking_weights(active) WHERE active = 1;

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Search audit trail
const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS search_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    query TEXT NOT NULL,
    query_embedding TEXT NOT NULL,
    result_count INTEGER NOT NULL DEFAULT 0,
    response_time_ms INTEGER NOT NULL DEFAULT 0,
    filters TEXT NOT NULL DEFAULT '{}',
    fallback TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_search_logs_session ON search_logs(session_id, created_at);
CREATE INDEX IF NOT EXISTS idx_search_logs_created ON search_logs(created_at);

-- Scores are persisted at six decimal places; matched_terms is a JSON
-- array of lowercased strings
CREATE TABLE IF NOT EXISTS search_explanations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    search_log_id INTEGER NOT NULL REFERENCES search_logs(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    final_score REAL NOT NULL,
    semantic_score REAL NOT NULL,
    rating_score REAL NOT NULL,
    price_score REAL NOT NULL,
    stock_score REAL NOT NULL,
    recency_score REAL NOT NULL,
    matched_terms TEXT NOT NULL DEFAULT '[]',
    explanation TEXT NOT NULL DEFAULT '',
    was_clicked INTEGER NOT NULL DEFAULT 0,
    UNIQUE(search_log_id, product_id)
);

CREATE TABLE IF NOT EXISTS evaluation_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    search_log_id INTEGER REFERENCES search_logs(id) ON DELETE SET NULL,
    kind TEXT NOT NULL,
    value REAL NOT NULL,
    query_count INTEGER,
    note TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_metrics_kind ON evaluation_metrics(kind, created_at);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// V3: Upload job observability
const MIGRATION_V3_UP: &str = r#"
CREATE TABLE IF NOT EXISTS upload_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    total_items INTEGER NOT NULL DEFAULT 0,
    processed_items INTEGER NOT NULL DEFAULT 0,
    embedded_items INTEGER NOT NULL DEFAULT 0,
    error TEXT,
    started_at TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL
);

UPDATE schema_version SET version = 3, applied_at = datetime('now');
"#;

/// Get current schema version
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}

/// Legacy camelCase → snake_case column duals the old importer left behind
const LEGACY_COLUMN_DUALS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("imageUrl", "image_url"),
    ("originalPrice", "original_price"),
    ("reviewCount", "review_count"),
    ("stockQuantity", "stock_quantity"),
];

/// One-shot backfill of legacy camelCase column aliases on the products
/// table. Copies values into the snake_case columns and drops the duals.
/// A fresh database has none of them, so this is a no-op after the first
/// run. Returns the number of columns migrated.
pub fn backfill_legacy_aliases(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let mut existing: Vec<String> = Vec::new();
    {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('products')")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for name in names {
            existing.push(name?);
        }
    }

    let mut migrated = 0;
    for (camel, snake) in LEGACY_COLUMN_DUALS {
        if !existing.iter().any(|n| n == camel) {
            continue;
        }
        tracing::info!("Backfilling legacy column alias {} -> {}", camel, snake);
        conn.execute_batch(&format!(
            "UPDATE products SET \"{snake}\" = \"{camel}\"
             WHERE \"{camel}\" IS NOT NULL AND (\"{snake}\" IS NULL OR \"{snake}\" = '');
             ALTER TABLE products DROP COLUMN \"{camel}\";"
        ))?;
        migrated += 1;
    }

    Ok(migrated)
}
