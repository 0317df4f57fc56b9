//! Environment Configuration
//!
//! The core reads three variables:
//! - `EMBEDDING_SERVICE_URL`: base URL of the sentence-embedding service
//!   (defaults to the local sidecar)
//! - `DATABASE_URL`: SQLite database path; required for non-degraded
//!   operation
//! - `DEFAULT_WEIGHTS`: optional comma-separated five-tuple seeding the
//!   active ranking weights at startup
//!
//! The transport binary maps startup failures to exit codes: configuration
//! errors here exit 1; an unrecoverable repository error at migration
//! (`StorageError::Migration`) exits 2.

use std::path::{Path, PathBuf};

use crate::ranking::WeightsUpdate;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Base URL of the embedding service
pub const ENV_EMBEDDING_SERVICE_URL: &str = "EMBEDDING_SERVICE_URL";

/// SQLite database path
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Optional comma-separated weight tuple
pub const ENV_DEFAULT_WEIGHTS: &str = "DEFAULT_WEIGHTS";

/// Local sidecar assumed when `EMBEDDING_SERVICE_URL` is unset
pub const DEFAULT_EMBEDDING_SERVICE_URL: &str = "http://127.0.0.1:8089";

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Configuration error; the transport exits with code 1 on this
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is present but unusable
    #[error("Configuration error: {0}")]
    Invalid(String),
    /// A required variable is missing
    #[error("Configuration error: {0} is required")]
    Missing(&'static str),
}

// ============================================================================
// CONFIG
// ============================================================================

/// Resolved environment configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Embedding service base URL
    pub embedding_service_url: String,
    /// SQLite database path; `None` means degraded operation only
    pub database_url: Option<PathBuf>,
    /// Weight tuple to seed the active row with at startup
    pub default_weights: Option<(f64, f64, f64, f64, f64)>,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a lookup function (testable form)
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let embedding_service_url = lookup(ENV_EMBEDDING_SERVICE_URL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EMBEDDING_SERVICE_URL.to_string());

        let database_url = lookup(ENV_DATABASE_URL)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let default_weights = match lookup(ENV_DEFAULT_WEIGHTS) {
            Some(raw) if !raw.trim().is_empty() => Some(parse_weight_tuple(&raw)?),
            _ => None,
        };

        Ok(Self {
            embedding_service_url,
            database_url,
            default_weights,
        })
    }

    /// The database path, or a configuration error when unset
    pub fn require_database_url(&self) -> Result<&Path, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_DATABASE_URL))
    }

    /// The weights update to apply at startup when `DEFAULT_WEIGHTS` was set
    pub fn seed_weights(&self) -> Option<WeightsUpdate> {
        self.default_weights
            .map(|(semantic, rating, price, stock, recency)| WeightsUpdate {
                name: Some("env-default".to_string()),
                semantic,
                rating,
                price,
                stock,
                recency,
            })
    }
}

/// Parse "0.5,0.2,0.15,0.1,0.05" into the five-tuple
fn parse_weight_tuple(raw: &str) -> Result<(f64, f64, f64, f64, f64), ConfigError> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 5 {
        return Err(ConfigError::Invalid(format!(
            "{ENV_DEFAULT_WEIGHTS} needs 5 comma-separated values, got {}",
            parts.len()
        )));
    }

    let mut values = [0.0_f64; 5];
    for (i, part) in parts.iter().enumerate() {
        let value: f64 = part.parse().map_err(|_| {
            ConfigError::Invalid(format!("{ENV_DEFAULT_WEIGHTS}: '{part}' is not a number"))
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "{ENV_DEFAULT_WEIGHTS}: weights must be non-negative, got '{part}'"
            )));
        }
        values[i] = value;
    }
    Ok((values[0], values[1], values[2], values[3], values[4]))
}

// ============================================================================
// TESTS
// ============================================================================
