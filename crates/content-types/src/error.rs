//! Error types for the content-index system.

use thiserror::Error;

/// Unified error type for content model and configuration operations.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A node id that is not a decimal integer
    #[error("Invalid node id: {0:?}")]
    InvalidNodeId(String),

    /// A path string that does not parse into node ids
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
