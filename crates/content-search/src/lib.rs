//! # content-search
//!
//! Full-text index storage for the content tree using Tantivy.
//!
//! This crate owns everything that touches the index directly:
//! - Field policies: which fields are indexed verbatim and which are analyzed
//! - Schema derivation and document mapping for index items
//! - A shared writer with upsert-by-node-id semantics
//! - Point-in-time raw queries and BM25 free-text search
//!
//! ## Features
//! - Embedded Tantivy index with MmapDirectory for persistence
//! - Undeclared fields land in a dynamic JSON field with the default policy
//! - Regex queries over the raw path field for subtree discovery
//! - Item type and index type filtering

pub mod document;
pub mod error;
pub mod index;
pub mod indexer;
pub mod policy;
pub mod schema;
pub mod searcher;

pub use document::item_to_doc;
pub use error::SearchError;
pub use index::{open_or_create_index, SearchIndex, SearchIndexConfig};
pub use indexer::SearchIndexer;
pub use policy::{
    culture_invariant_whitespace, FieldPolicy, FieldPolicyRegistry, CULTURE_INVARIANT_WHITESPACE,
    DEFAULT_TOKENIZER, RAW_TOKENIZER,
};
pub use schema::{
    SearchSchema, DYNAMIC_FIELD, INDEX_TYPE_FIELD, NODE_ID_FIELD, NODE_TYPE_ALIAS_FIELD,
    PATH_FIELD,
};
pub use searcher::{Criteria, NodeSearcher, SearchHit, SearchOptions, SearchSurface};
