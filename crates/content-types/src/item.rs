//! Indexable item payloads.
//!
//! An [`IndexItem`] is built from a node change notification, consumed once
//! by the index writer and then discarded.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::node::{NodeId, NodePath};

/// Name of the value carrying a node's hierarchy path.
pub const PATH_VALUE: &str = "path";

/// Sortable text layout for timestamps (millisecond precision).
const DATE_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Kind of tree an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Content,
    Media,
}

impl IndexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Content => "content",
            IndexType::Media => "media",
        }
    }

    /// Parse from string, returning None for unknown types.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "content" => Some(IndexType::Content),
            "media" => Some(IndexType::Media),
            _ => None,
        }
    }
}

impl std::str::FromStr for IndexType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown index type: {}", s))
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single raw field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Date(DateTime<Utc>),
    Text(String),
}

impl FieldValue {
    /// Text form written into the index.
    ///
    /// Dates use a fixed-width layout so lexical order matches time order.
    pub fn to_index_text(&self) -> String {
        match self {
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(d: DateTime<Utc>) -> Self {
        FieldValue::Date(d)
    }
}

/// Field-name-to-values payload of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueSet {
    /// Document-type alias of the node (e.g. `textPage`)
    #[serde(default)]
    pub item_type: String,

    /// Raw values per field, in insertion order
    #[serde(default)]
    pub values: BTreeMap<String, Vec<FieldValue>>,
}

impl ValueSet {
    pub fn new(item_type: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            values: BTreeMap::new(),
        }
    }

    /// Append a value to a field.
    pub fn add(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.entry(field.into()).or_default().push(value.into());
    }

    /// Builder form of [`ValueSet::add`].
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.add(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&[FieldValue]> {
        self.values.get(field).map(Vec::as_slice)
    }

    pub fn get_first(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field).and_then(|v| v.first())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[FieldValue])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A node materialized for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexItem {
    pub id: NodeId,
    pub index_type: IndexType,
    pub value_set: ValueSet,
}

impl IndexItem {
    pub fn new(id: NodeId, index_type: IndexType, value_set: ValueSet) -> Self {
        Self {
            id,
            index_type,
            value_set,
        }
    }

    /// Convenience constructor for a content node at `path`.
    pub fn content(path: &NodePath, item_type: &str) -> Self {
        let id = path.node_id();
        let value_set = ValueSet::new(item_type)
            .with_value("id", id.get())
            .with_value(PATH_VALUE, path.to_string());
        Self::new(id, IndexType::Content, value_set)
    }

    /// The item's hierarchy path, from its `path` value.
    ///
    /// The path must end with the item's own id.
    pub fn path(&self) -> Result<NodePath, ContentError> {
        let Some(value) = self.value_set.get_first(PATH_VALUE) else {
            return Err(ContentError::InvalidPath {
                path: String::new(),
                reason: format!("item {} has no path value", self.id),
            });
        };
        let path = NodePath::parse(&value.to_index_text())?;
        if path.node_id() != self.id {
            return Err(ContentError::InvalidPath {
                path: path.to_string(),
                reason: format!("path of item {} ends at {}", self.id, path.node_id()),
            });
        }
        Ok(path)
    }
}
