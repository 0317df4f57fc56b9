//! Sessions and Interactions
//!
//! An anonymous session ties interactions together across requests. The
//! transport issues the opaque id; the core only validates shape and expiry.
//! Interactions are append-only events against existing products.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sessions expire this many days after issuance
pub const SESSION_TTL_DAYS: i64 = 30;

// ============================================================================
// SESSION
// ============================================================================

/// An anonymous browsing session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque 32-byte identifier (64 hex characters), issued by the transport
    pub id: String,
    /// When the session was first seen
    pub created_at: DateTime<Utc>,
    /// When the session last recorded an interaction
    pub last_active_at: DateTime<Utc>,
    /// Hard expiry; expired sessions are ignored for recommendations
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a fresh session starting now
    pub fn issue(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: now,
            last_active_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        }
    }

    /// Issue a new opaque 32-byte identifier (64 hex characters).
    ///
    /// The transport normally owns issuance; this helper keeps tests and
    /// tools from re-inventing the format.
    pub fn issue_id() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    /// Whether the session is expired at the given instant
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.expires_at
    }

    /// Whether the session is expired now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// ============================================================================
// INTERACTION KIND
// ============================================================================

/// The closed set of interaction events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Product detail page viewed
    View,
    /// Product clicked from a listing
    Click,
    /// Product clicked from a search result page
    SearchClick,
    /// Product added to cart
    AddToCart,
    /// Product purchased
    Purchase,
}

impl InteractionKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::View => "view",
            InteractionKind::Click => "click",
            InteractionKind::SearchClick => "search_click",
            InteractionKind::AddToCart => "add_to_cart",
            InteractionKind::Purchase => "purchase",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "view" => Some(InteractionKind::View),
            "click" => Some(InteractionKind::Click),
            "search_click" => Some(InteractionKind::SearchClick),
            "add_to_cart" => Some(InteractionKind::AddToCart),
            "purchase" => Some(InteractionKind::Purchase),
            _ => None,
        }
    }

    /// Base weight for session-affinity scoring. Purchases speak louder
    /// than views.
    pub fn base_weight(&self) -> f64 {
        match self {
            InteractionKind::View => 1.0,
            InteractionKind::Click => 2.0,
            InteractionKind::SearchClick => 3.0,
            InteractionKind::AddToCart => 4.0,
            InteractionKind::Purchase => 5.0,
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// INTERACTION
// ============================================================================

/// An append-only interaction event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Row id (insertion order breaks timestamp ties)
    pub id: i64,
    /// Owning session
    pub session_id: String,
    /// Referenced product (must exist)
    pub product_id: i64,
    /// Event kind
    pub kind: InteractionKind,
    /// Search query, for search-originated clicks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// 1-based result position, for search-originated clicks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    /// Server-stamped creation time
    pub created_at: DateTime<Utc>,
}

/// Input for recording an interaction. The creation time is stamped
/// server-side when the event is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InteractionInput {
    /// Owning session id
    pub session_id: String,
    /// Referenced product
    pub product_id: i64,
    /// Event kind
    pub kind: InteractionKind,
    /// Search query for search_click events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// 1-based result position for search_click events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

// ============================================================================
// TESTS
// ============================================================================
