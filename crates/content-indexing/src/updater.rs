//! Index updater trait for the single index writer.
//!
//! The operation queue owns exactly one updater and calls it from its
//! writer task only, in enqueue order.

use content_types::IndexOperation;

use crate::error::IndexingError;

/// Trait for index-specific write operations.
///
/// Implementations apply one operation at a time; nothing becomes visible
/// to readers until `commit` is called.
pub trait IndexUpdater: Send + Sync {
    /// Apply an Add, Update or Delete.
    ///
    /// Add and Update replace any existing document for the operation's id.
    fn apply(&self, operation: &IndexOperation) -> Result<(), IndexingError>;

    /// Commit pending changes to make them visible.
    ///
    /// The queue calls this once per batch. On failure the batch is lost.
    fn commit(&self) -> Result<(), IndexingError>;

    /// Request a segment merge. Advisory, returns whether one was scheduled.
    fn optimize(&self) -> Result<bool, IndexingError>;

    /// Remove every document, effective on the next commit.
    fn clear(&self) -> Result<(), IndexingError>;

    /// Get the name of this updater for logging.
    fn name(&self) -> &str;
}

/// Result of applying a batch of operations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// Number of operations applied
    pub applied: usize,
    /// Number of operations the writer rejected
    pub errors: usize,
    /// Number of commits performed
    pub commits: usize,
}

impl UpdateResult {
    /// Create a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful apply.
    pub fn record_success(&mut self) {
        self.applied += 1;
    }

    /// Record an error.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Record a commit.
    pub fn record_commit(&mut self) {
        self.commits += 1;
    }

    /// Move applies whose commit failed from applied to errors.
    pub fn record_discarded(&mut self, count: usize) {
        let moved = count.min(self.applied);
        self.applied -= moved;
        self.errors += moved;
    }
}
