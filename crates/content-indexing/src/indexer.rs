//! Content indexer: the entry point for node change notifications.
//!
//! Changes are filtered, turned into operations and handed to the queue.
//! Deletes cascade: every indexed descendant found under the node is
//! deleted before the node itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use content_search::SearchSurface;
use content_types::{IndexItem, IndexOperation, IndexerOptions, NodeId, Settings};

use crate::error::IndexingError;
use crate::observer::{IndexObserver, IndexingErrorEvent};
use crate::path_matcher::HierarchyPathMatcher;
use crate::queue::{IndexOperationQueue, QueueMode};
use crate::rebuild::{
    NoOpProgressCallback, ProgressCallback, RebuildConfig, RebuildProgress, RebuildResult,
};
use crate::repository::ContentRepository;
use crate::visibility::{IndexCriteria, SkipReason, VisibilityFilter};

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub index_set_name: String,
    pub options: IndexerOptions,
    pub criteria: IndexCriteria,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            index_set_name: "ContentIndexSet".to_string(),
            options: IndexerOptions::default(),
            criteria: IndexCriteria::default(),
        }
    }
}

impl IndexerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            index_set_name: settings.index_set_name.clone(),
            options: settings.indexer_options(),
            criteria: IndexCriteria::from_settings(settings),
        }
    }

    pub fn with_options(mut self, options: IndexerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_criteria(mut self, criteria: IndexCriteria) -> Self {
        self.criteria = criteria;
        self
    }
}

/// What happened to a node handed to [`ContentIndexer::index_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Enqueued,
    Skipped(SkipReason),
}

/// Keeps the index in step with the content tree.
pub struct ContentIndexer {
    index_set_name: String,
    filter: VisibilityFilter,
    matcher: HierarchyPathMatcher,
    repository: Arc<dyn ContentRepository>,
    surface: Arc<dyn SearchSurface>,
    queue: Arc<IndexOperationQueue>,
    observer: Arc<dyn IndexObserver>,
}

impl ContentIndexer {
    pub fn new(
        config: IndexerConfig,
        repository: Arc<dyn ContentRepository>,
        surface: Arc<dyn SearchSurface>,
        queue: Arc<IndexOperationQueue>,
        observer: Arc<dyn IndexObserver>,
    ) -> Self {
        Self {
            index_set_name: config.index_set_name,
            filter: VisibilityFilter::new(config.options, config.criteria),
            matcher: HierarchyPathMatcher::new(),
            repository,
            surface,
            queue,
            observer,
        }
    }

    /// Read `supportUnpublished` and `supportProtected` from provider options.
    ///
    /// Absent or malformed values count as `false`.
    pub fn initialize<S: AsRef<str>>(&mut self, options: &HashMap<String, S>) {
        let options = IndexerOptions::initialize(options);
        self.filter = self.filter.clone().with_options(options);
        info!(
            index_set = %self.index_set_name,
            support_unpublished = options.support_unpublished,
            support_protected = options.support_protected,
            "Indexer initialized"
        );
    }

    pub fn options(&self) -> IndexerOptions {
        self.filter.options()
    }

    pub fn index_set_name(&self) -> &str {
        &self.index_set_name
    }

    pub fn queue(&self) -> &Arc<IndexOperationQueue> {
        &self.queue
    }

    fn report(&self, node_id: Option<NodeId>, message: impl Into<String>) {
        let event = IndexingErrorEvent::new(node_id, message, self.index_set_name.as_str());
        self.observer.on_indexing_error(&event);
    }

    async fn submit(
        &self,
        item: IndexItem,
        operation: fn(IndexItem) -> IndexOperation,
    ) -> Result<IndexOutcome, IndexingError> {
        if let Err(reason) = self.filter.validate_item(&item, self.repository.as_ref()) {
            self.observer.on_node_skipped(item.id, reason);
            return Ok(IndexOutcome::Skipped(reason));
        }
        self.queue.enqueue(operation(item)).await?;
        Ok(IndexOutcome::Enqueued)
    }

    /// Index or re-index one node. Rejected nodes are skipped silently.
    pub async fn index_node(&self, item: IndexItem) -> Result<IndexOutcome, IndexingError> {
        self.submit(item, IndexOperation::update).await
    }

    /// Enqueue a delete. Writer failures were already reported; only a
    /// closed queue stops the caller.
    async fn enqueue_delete(&self, id: NodeId) -> Result<bool, IndexingError> {
        match self.queue.enqueue(IndexOperation::delete(id)).await {
            Ok(()) => Ok(true),
            Err(IndexingError::QueueClosed) => Err(IndexingError::QueueClosed),
            Err(e) => {
                warn!(node_id = %id, error = %e, "Delete not applied");
                Ok(false)
            }
        }
    }

    /// Delete a node and every indexed descendant.
    ///
    /// Operations already queued are committed first so the descendant scan
    /// sees them. The scan runs once; descendants indexed after it are not
    /// removed. Returns the number of deletes enqueued.
    pub async fn delete_node(&self, id: NodeId) -> Result<usize, IndexingError> {
        self.queue.flush().await?;

        let criteria = self.matcher.criteria(id);
        let matcher = self.matcher;
        let surface = self.surface.clone();
        let scan = tokio::task::spawn_blocking(move || matcher.find_descendants(surface.as_ref(), id))
            .await
            .map_err(|e| IndexingError::Task(format!("delete scan task failed: {}", e)))
            .and_then(|found| found.map_err(IndexingError::from));

        match scan {
            Ok(descendants) => {
                self.observer
                    .on_delete_scan(id, &criteria, descendants.len());

                let mut enqueued = 0;
                for descendant in descendants {
                    if self.enqueue_delete(descendant).await? {
                        enqueued += 1;
                    }
                }
                if self.enqueue_delete(id).await? {
                    enqueued += 1;
                }
                Ok(enqueued)
            }
            Err(e) => {
                self.report(Some(id), format!("descendant search failed: {}", e));
                self.enqueue_delete(id).await?;
                Err(IndexingError::CascadeIncomplete {
                    id,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Re-index every node the repository knows. Additive.
    pub async fn rebuild_index(&self) -> Result<RebuildResult, IndexingError> {
        self.rebuild_with(&RebuildConfig::default(), &NoOpProgressCallback)
            .await
    }

    /// Rebuild with explicit configuration and progress reporting.
    pub async fn rebuild_with<P: ProgressCallback>(
        &self,
        config: &RebuildConfig,
        progress_callback: &P,
    ) -> Result<RebuildResult, IndexingError> {
        let start = Instant::now();
        let mut progress = RebuildProgress::new();

        if config.clear_first {
            self.clear().await?;
        }

        let failed_before = self.queue.stats().failed;
        let ids = self
            .repository
            .all_node_ids(self.options().support_unpublished)?;
        info!(index_set = %self.index_set_name, count = ids.len(), "Starting index rebuild");

        for id in ids {
            match self.repository.get_item(id) {
                Ok(Some(item)) => match self.submit(item, IndexOperation::add).await {
                    Ok(IndexOutcome::Enqueued) => progress.record_indexed(),
                    Ok(IndexOutcome::Skipped(_)) => progress.record_skip(),
                    Err(IndexingError::QueueClosed) => return Err(IndexingError::QueueClosed),
                    Err(_) => progress.record_error(),
                },
                Ok(None) => progress.record_missing(),
                Err(e) => {
                    self.report(Some(id), e.to_string());
                    progress.record_error();
                }
            }

            if progress
                .total_processed
                .is_multiple_of(config.batch_size as u64)
            {
                progress_callback.on_progress(&progress);
            }
        }

        self.queue.flush().await?;
        if self.queue.mode() == QueueMode::Async {
            progress.record_writer_failures(self.queue.stats().failed - failed_before);
        }
        progress.mark_completed();
        progress_callback.on_progress(&progress);

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            index_set = %self.index_set_name,
            indexed = progress.indexed,
            skipped = progress.skipped,
            missing = progress.missing,
            errors = progress.errors,
            elapsed_ms,
            "Index rebuild complete"
        );

        Ok(RebuildResult {
            progress,
            elapsed_ms,
        })
    }

    /// Remove every document from the index.
    pub async fn clear(&self) -> Result<(), IndexingError> {
        warn!(index_set = %self.index_set_name, "Clearing index");
        self.queue.clear().await
    }

    /// Request a segment merge.
    pub async fn optimize(&self) -> Result<(), IndexingError> {
        self.queue.optimize().await
    }

    /// Wait for queued operations to be committed.
    pub async fn flush(&self) -> Result<(), IndexingError> {
        self.queue.flush().await
    }

    /// Drain the queue and release the writer.
    pub async fn shutdown(&self) -> Result<(), IndexingError> {
        self.queue.shutdown().await
    }
}
