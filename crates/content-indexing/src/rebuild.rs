//! Progress reporting for index rebuilds.
//!
//! A rebuild walks every node the repository knows and feeds it through
//! the same path as a single change notification. It is additive unless
//! `clear_first` is set.

use tracing::info;

/// Configuration for rebuild operations.
#[derive(Debug, Clone)]
pub struct RebuildConfig {
    /// Number of nodes to process between progress reports.
    pub batch_size: usize,
    /// Whether to clear the index before rebuilding.
    pub clear_first: bool,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            clear_first: false,
        }
    }
}

impl RebuildConfig {
    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set whether to clear the index first.
    pub fn with_clear_first(mut self, clear: bool) -> Self {
        self.clear_first = clear;
        self
    }
}

/// Progress tracking for rebuild operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildProgress {
    /// Total nodes processed.
    pub total_processed: u64,
    /// Nodes handed to the writer.
    pub indexed: u64,
    /// Nodes rejected by the visibility filter.
    pub skipped: u64,
    /// Nodes listed by the repository that no longer exist.
    pub missing: u64,
    /// Nodes that failed to load or to apply.
    pub errors: u64,
    /// Whether the rebuild ran to the end.
    pub completed: bool,
}

impl RebuildProgress {
    /// Create a new progress tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_indexed(&mut self) {
        self.indexed += 1;
        self.total_processed += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
        self.total_processed += 1;
    }

    pub fn record_missing(&mut self) {
        self.missing += 1;
        self.total_processed += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
        self.total_processed += 1;
    }

    /// Count writer failures that surfaced after their nodes were enqueued.
    pub fn record_writer_failures(&mut self, failures: u64) {
        let moved = failures.min(self.indexed);
        self.indexed -= moved;
        self.errors += moved;
    }

    /// Mark as completed.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }
}

/// Result of a rebuild operation.
#[derive(Debug, Clone)]
pub struct RebuildResult {
    /// Progress statistics.
    pub progress: RebuildProgress,
    /// Time taken in milliseconds.
    pub elapsed_ms: u64,
}

/// Trait for receiving rebuild progress updates.
pub trait ProgressCallback: Send + Sync {
    /// Called after each batch of nodes is processed.
    fn on_progress(&self, progress: &RebuildProgress);
}

/// A no-op progress callback for when progress reporting isn't needed.
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn on_progress(&self, _progress: &RebuildProgress) {}
}

/// A callback that logs progress at info level.
pub struct LoggingProgressCallback;

impl ProgressCallback for LoggingProgressCallback {
    fn on_progress(&self, progress: &RebuildProgress) {
        info!(
            total = progress.total_processed,
            indexed = progress.indexed,
            skipped = progress.skipped,
            errors = progress.errors,
            "Rebuild progress"
        );
    }
}
