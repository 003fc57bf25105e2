//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use content_search::{Criteria, SearchError, SearchSurface};
use content_types::{IndexOperation, NodeId};

use crate::error::IndexingError;
use crate::observer::{IndexObserver, IndexingErrorEvent};
use crate::updater::IndexUpdater;
use crate::visibility::SkipReason;

/// Updater that records every call as a line of text.
#[derive(Default)]
pub(crate) struct RecordingUpdater {
    pub(crate) log: Mutex<Vec<String>>,
    pub(crate) fail_on: Option<NodeId>,
    pub(crate) fail_commit: bool,
}

impl RecordingUpdater {
    pub(crate) fn failing_on(id: i64) -> Self {
        Self {
            fail_on: Some(NodeId::new(id)),
            ..Default::default()
        }
    }

    fn push(&self, line: String) {
        self.log.lock().unwrap().push(line);
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Applied operations only, without commits and merges.
    pub(crate) fn applied(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter(|line| !line.starts_with("commit") && !line.starts_with("optimize"))
            .collect()
    }
}

impl IndexUpdater for RecordingUpdater {
    fn apply(&self, operation: &IndexOperation) -> Result<(), IndexingError> {
        if Some(operation.id()) == self.fail_on {
            return Err(IndexingError::Writer(format!(
                "cannot apply {}",
                operation.id()
            )));
        }
        self.push(format!("{} {}", operation.kind().as_str(), operation.id()));
        Ok(())
    }

    fn commit(&self) -> Result<(), IndexingError> {
        if self.fail_commit {
            return Err(IndexingError::Writer("disk full".to_string()));
        }
        self.push("commit".to_string());
        Ok(())
    }

    fn optimize(&self) -> Result<bool, IndexingError> {
        self.push("optimize".to_string());
        Ok(true)
    }

    fn clear(&self) -> Result<(), IndexingError> {
        self.push("clear".to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Observer that keeps every notification.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    pub(crate) errors: Mutex<Vec<IndexingErrorEvent>>,
    pub(crate) skipped: Mutex<Vec<(NodeId, SkipReason)>>,
    pub(crate) scans: Mutex<Vec<(NodeId, String, usize)>>,
    pub(crate) optimizing: AtomicUsize,
}

impl IndexObserver for RecordingObserver {
    fn on_indexing_error(&self, event: &IndexingErrorEvent) {
        self.errors.lock().unwrap().push(event.clone());
    }

    fn on_optimizing(&self, _index_set: &str) {
        self.optimizing.fetch_add(1, Ordering::SeqCst);
    }

    fn on_node_skipped(&self, id: NodeId, reason: SkipReason) {
        self.skipped.lock().unwrap().push((id, reason));
    }

    fn on_delete_scan(&self, id: NodeId, criteria: &Criteria, hits: usize) {
        self.scans
            .lock()
            .unwrap()
            .push((id, criteria.to_string(), hits));
    }
}

/// Search surface answering every query with fixed ids.
///
/// Records the updater's log at query time so tests can check what was
/// committed before the scan.
pub(crate) struct FixedSurface {
    pub(crate) ids: Vec<NodeId>,
    pub(crate) fail: bool,
    pub(crate) updater: Arc<RecordingUpdater>,
    pub(crate) seen: Mutex<Vec<Vec<String>>>,
}

impl FixedSurface {
    pub(crate) fn new(updater: Arc<RecordingUpdater>, ids: &[i64]) -> Self {
        Self {
            ids: ids.iter().copied().map(NodeId::new).collect(),
            fail: false,
            updater,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(updater: Arc<RecordingUpdater>) -> Self {
        Self {
            fail: true,
            ..Self::new(updater, &[])
        }
    }
}

impl SearchSurface for FixedSurface {
    fn search_ids(&self, criteria: &Criteria) -> Result<Vec<NodeId>, SearchError> {
        self.seen.lock().unwrap().push(self.updater.log());
        if self.fail {
            return Err(SearchError::UnknownField(criteria.field().to_string()));
        }
        Ok(self.ids.clone())
    }
}
