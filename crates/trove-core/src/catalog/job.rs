//! Catalog Upload Jobs
//!
//! Observability records for batch imports and batch embedding runs. The
//! core advances a job through a monotonic state machine while an external
//! loader inserts rows and the embedding pipeline fills vectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// JOB STATUS
// ============================================================================

/// Batch job lifecycle states.
///
/// Transitions are monotonic: pending → processing → embedding →
/// completed | failed. The only re-entry is failed → processing via a
/// fresh run over the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, nothing started yet
    #[default]
    Pending,
    /// External loader is inserting products
    Processing,
    /// Batch embedding in flight
    Embedding,
    /// All counters finalized
    Completed,
    /// Stored an error message; re-runnable
    Failed,
}

impl JobStatus {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Embedding => "embedding",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "embedding" => Some(JobStatus::Embedding),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Whether the state machine admits `next` from this state
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Embedding)
                | (JobStatus::Processing, JobStatus::Failed)
                | (JobStatus::Embedding, JobStatus::Completed)
                | (JobStatus::Embedding, JobStatus::Failed)
                | (JobStatus::Failed, JobStatus::Processing)
        )
    }

    /// Whether the job has reached a terminal state (failed is re-runnable
    /// but terminal for the current run)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// JOB RECORD
// ============================================================================

/// A catalog upload / batch embedding job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogUploadJob {
    /// Row id
    pub id: i64,
    /// Source filename (or a synthetic tag for admin-triggered runs)
    pub filename: String,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Total products in the batch
    pub total_items: i64,
    /// Products inserted/updated so far
    pub processed_items: i64,
    /// Products embedded so far
    pub embedded_items: i64,
    /// Error message when status is failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the run started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the run finished (completed or failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// When the job row was created
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// TESTS
// ============================================================================
