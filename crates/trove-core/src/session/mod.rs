//! Session Tracker
//!
//! Ingests interaction events and answers session-history queries. Creation
//! time is stamped server-side; the session row is created on first contact
//! with its 30-day expiry and touched on every event.

use std::sync::Arc;

use chrono::Utc;

use crate::catalog::{Interaction, InteractionInput, InteractionKind, Product};
use crate::error::{EngineError, Result};
use crate::storage::Storage;

// ============================================================================
// SESSION TRACKER
// ============================================================================

/// Interaction ingest and session-history queries over the repository
pub struct SessionTracker {
    storage: Arc<Storage>,
}

impl SessionTracker {
    /// Create a tracker over the shared repository
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Record an interaction.
    ///
    /// Appends the event atomically (creating/touching the session row) and,
    /// for search clicks that carry their query, flags the matching
    /// explanation row so offline evaluation can use click feedback. The
    /// flagging is best-effort; a miss never fails the ingest.
    pub fn record(&self, input: &InteractionInput) -> Result<Interaction> {
        let now = Utc::now();
        let interaction = self.storage.record_interaction(input, now)?;

        if input.kind == InteractionKind::SearchClick {
            if let Some(query) = &input.query {
                match self.storage.mark_explanation_clicked(
                    &input.session_id,
                    input.product_id,
                    query,
                    input.position,
                ) {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(
                            product_id = input.product_id,
                            "search click did not match a logged explanation"
                        );
                    }
                    Err(e) => {
                        tracing::warn!("failed to flag clicked explanation: {}", e);
                    }
                }
            }
        }

        Ok(interaction)
    }

    /// Most-recent-first interactions for a session
    pub fn recent_interactions(&self, session_id: &str, limit: usize) -> Result<Vec<Interaction>> {
        if session_id.is_empty() {
            return Err(EngineError::InvalidInput("session id must be non-empty".into()));
        }
        Ok(self.storage.recent_interactions(session_id, limit)?)
    }

    /// Distinct recently viewed products, most-recent-first
    pub fn recently_viewed(&self, session_id: &str, limit: usize) -> Result<Vec<Product>> {
        if session_id.is_empty() {
            return Err(EngineError::InvalidInput("session id must be non-empty".into()));
        }
        let ids = self.storage.recently_viewed_product_ids(session_id, limit)?;
        Ok(self.storage.get_products(&ids)?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
