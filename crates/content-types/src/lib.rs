//! # content-types
//!
//! Shared domain types for the content index.
//!
//! This crate defines the core data structures used throughout the system:
//! - Nodes: identifiers and comma-delimited hierarchy paths
//! - Items: the field/value payload of one node, materialized for indexing
//! - Operations: Add/Update/Delete requests consumed by the index writer
//! - Settings: layered configuration and the indexer's visibility options
//!
//! ## Usage
//!
//! ```rust
//! use content_types::{IndexItem, NodeId, NodePath};
//!
//! let path = NodePath::parse("-1,1050,1100").unwrap();
//! let item = IndexItem::content(&path, "textPage");
//! assert_eq!(item.id, NodeId::new(1100));
//! ```

pub mod config;
pub mod error;
pub mod item;
pub mod node;
pub mod operation;

pub use config::{parse_flag, IndexerOptions, Settings, SUPPORT_PROTECTED, SUPPORT_UNPUBLISHED};
pub use error::ContentError;
pub use item::{FieldValue, IndexItem, IndexType, ValueSet, PATH_VALUE};
pub use node::{NodeId, NodePath, PATH_DELIMITER};
pub use operation::{IndexOperation, OperationKind};
