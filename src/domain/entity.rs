//! Domain Layer - Core Entity Trait
//!
//! Basic contract for all synced records. Entities are serde round-trip
//! capable because realtime change events deliver them as JSON and partial
//! updates are merged through a validated JSON overlay.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Core trait for all synced domain entities
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + std::fmt::Display + Send + Sync;

    /// JSON field carrying the identifier in change-event payloads
    const ID_FIELD: &'static str = "id";

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;

    /// Client-generated marker of a not-yet-confirmed record, when the
    /// entity supports optimistic creation. A confirmed record arriving
    /// with the same marker replaces the pending one instead of being
    /// appended.
    fn temp_marker(&self) -> Option<&str> {
        None
    }

    /// Whether this record is a locally-synthesized optimistic entry
    fn is_pending(&self) -> bool {
        false
    }
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
    Conflict(String),
    Remote(String),
    Internal(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Remote(msg) => write!(f, "Remote action failed: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
