//! Error types for the indexing layer.

use content_search::SearchError;
use content_types::{ContentError, NodeId};
use thiserror::Error;

/// Errors that can occur while indexing content
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Tantivy index or query error
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Invalid node, path or configuration
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Content repository could not answer
    #[error("Repository error: {0}")]
    Repository(String),

    /// JSON encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The operation queue no longer accepts work
    #[error("Operation queue is closed")]
    QueueClosed,

    /// The index writer failed to apply or commit
    #[error("Writer error: {0}")]
    Writer(String),

    /// A blocking task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),

    /// Descendant discovery failed; only the node itself was deleted
    #[error("Cascade delete of node {id} incomplete: {source}")]
    CascadeIncomplete {
        id: NodeId,
        #[source]
        source: Box<IndexingError>,
    },
}

impl From<serde_json::Error> for IndexingError {
    fn from(err: serde_json::Error) -> Self {
        IndexingError::Serialization(err.to_string())
    }
}
