//! Index operations consumed by the single index writer.
//!
//! Operations are immutable once enqueued and are applied exactly once,
//! in enqueue order. A later operation for the same id always wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::IndexItem;
use crate::node::NodeId;

/// Type of index operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Index a node that was not indexed before
    Add,
    /// Replace the indexed entry of a node
    Update,
    /// Remove a node's entry
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

/// A pending change to the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexOperation {
    id: NodeId,
    kind: OperationKind,
    item: Option<IndexItem>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    enqueued_at: DateTime<Utc>,
}

impl IndexOperation {
    /// Create an add operation for an item.
    pub fn add(item: IndexItem) -> Self {
        Self::with_item(OperationKind::Add, item)
    }

    /// Create an update operation for an item.
    pub fn update(item: IndexItem) -> Self {
        Self::with_item(OperationKind::Update, item)
    }

    /// Create a delete operation for a node id.
    pub fn delete(id: NodeId) -> Self {
        Self {
            id,
            kind: OperationKind::Delete,
            item: None,
            enqueued_at: Utc::now(),
        }
    }

    fn with_item(kind: OperationKind, item: IndexItem) -> Self {
        Self {
            id: item.id,
            kind,
            item: Some(item),
            enqueued_at: Utc::now(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Payload for Add/Update; always `None` for Delete.
    pub fn item(&self) -> Option<&IndexItem> {
        self.item.as_ref()
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    pub fn is_delete(&self) -> bool {
        self.kind == OperationKind::Delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodePath;

    #[test]
    fn test_add_carries_item() {
        let item = IndexItem::content(&NodePath::parse("-1,7").unwrap(), "page");
        let op = IndexOperation::add(item.clone());
        assert_eq!(op.id(), NodeId::new(7));
        assert_eq!(op.kind(), OperationKind::Add);
        assert_eq!(op.item(), Some(&item));
        assert!(!op.is_delete());
    }

    #[test]
    fn test_delete_has_no_item() {
        let op = IndexOperation::delete(NodeId::new(7));
        assert!(op.is_delete());
        assert!(op.item().is_none());
        assert_eq!(op.kind().as_str(), "delete");
    }
}
