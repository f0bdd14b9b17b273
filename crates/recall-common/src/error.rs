//! Error types for Recall
//!
//! Provides a unified error type and the collaborator-level error variants

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using RecallError
pub type Result<T> = std::result::Result<T, RecallError>;

/// Unified error type for Recall operations
#[derive(Debug, Error)]
pub enum RecallError {
    // Scheduling an item that was never classified as weak
    #[error("No weak item for user {user_id} and item {item_id}")]
    NotFound { user_id: Uuid, item_id: Uuid },

    // Out-of-range input
    #[error("Validation failed: {0}")]
    Validation(String),

    // Durable store failures, propagated unmodified
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    // Cache failures (only surfaced by direct cache access)
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RecallError {
    /// Build a validation error for a score outside 0..=100
    pub fn score_out_of_range(field: &str, value: u8) -> Self {
        RecallError::Validation(format!(
            "{} must be within 0..={}, got {}",
            field,
            crate::MAX_SCORE,
            value
        ))
    }

    /// Whether the error came from a collaborator rather than the caller
    pub fn is_transient(&self) -> bool {
        matches!(self, RecallError::StoreUnavailable(_) | RecallError::Cache(_))
    }
}

/// Errors reported by the performance history and weak item stores
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),
}

/// Errors reported by the review cache
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Cached value could not be decoded: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for RecallError {
    fn from(err: serde_json::Error) -> Self {
        RecallError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for RecallError {
    fn from(err: anyhow::Error) -> Self {
        RecallError::Config(err.to_string())
    }
}
