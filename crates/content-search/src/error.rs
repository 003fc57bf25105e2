//! Search error types.

use content_types::ContentError;
use thiserror::Error;

/// Errors that can occur during index and search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Query parse error
    #[error("Query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Item could not be turned into a document
    #[error("Invalid item: {0}")]
    InvalidItem(#[from] ContentError),

    /// Field is not part of the schema
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A custom policy names a tokenizer that was never registered
    #[error("Unknown tokenizer: {0}")]
    UnknownTokenizer(String),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Stored document is missing or malformed
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// Index is locked (another process has it open)
    #[error("Index is locked: {0}")]
    IndexLocked(String),
}
