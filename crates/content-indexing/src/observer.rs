//! Notifications raised while indexing.
//!
//! Errors are reported here instead of being propagated, so a failing node
//! never stops a rebuild or the writer loop. All methods default to no-ops.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use content_search::Criteria;
use content_types::NodeId;

use crate::visibility::SkipReason;

/// A failure while indexing one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingErrorEvent {
    /// Node the failure belongs to, when known
    pub node_id: Option<NodeId>,
    pub message: String,
    /// Name of the index set that failed
    pub index_set: String,
    pub occurred_at: DateTime<Utc>,
}

impl IndexingErrorEvent {
    pub fn new(
        node_id: Option<NodeId>,
        message: impl Into<String>,
        index_set: impl Into<String>,
    ) -> Self {
        Self {
            node_id,
            message: message.into(),
            index_set: index_set.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Receives indexing notifications. Implementations must not block.
pub trait IndexObserver: Send + Sync {
    /// A node could not be indexed, deleted or loaded.
    fn on_indexing_error(&self, _event: &IndexingErrorEvent) {}

    /// A segment merge is about to be requested.
    fn on_optimizing(&self, _index_set: &str) {}

    /// A node was rejected by the visibility filter.
    fn on_node_skipped(&self, _id: NodeId, _reason: SkipReason) {}

    /// Descendant discovery for a delete finished.
    fn on_delete_scan(&self, _id: NodeId, _criteria: &Criteria, _hits: usize) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl IndexObserver for NoOpObserver {}

/// Observer that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl IndexObserver for TracingObserver {
    fn on_indexing_error(&self, event: &IndexingErrorEvent) {
        match event.node_id {
            Some(id) => error!(
                node_id = %id,
                index_set = %event.index_set,
                error = %event.message,
                at = %event.occurred_at,
                "Indexing error"
            ),
            None => error!(
                index_set = %event.index_set,
                error = %event.message,
                "Indexing error"
            ),
        }
    }

    fn on_optimizing(&self, index_set: &str) {
        info!(index_set, "Optimizing index");
    }

    fn on_node_skipped(&self, id: NodeId, reason: SkipReason) {
        debug!(node_id = %id, reason = reason.as_str(), "Node not indexed");
    }

    fn on_delete_scan(&self, id: NodeId, criteria: &Criteria, hits: usize) {
        debug!(node_id = %id, criteria = %criteria, hits, "Delete scan complete");
    }
}
