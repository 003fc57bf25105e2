//! Indexing layer for the content index.
//!
//! This crate decides what enters the full-text index and keeps the index
//! consistent with the content tree as nodes change.
//!
//! ## Key Components
//!
//! - [`VisibilityFilter`]: published/protected eligibility plus index set criteria
//! - [`HierarchyPathMatcher`]: segment-exact descendant discovery for deletes
//! - [`IndexOperationQueue`]: FIFO of operations consumed by a single writer
//! - [`IndexUpdater`]: Trait for the writer side of the queue
//! - [`TantivyIndexUpdater`]: Writer backed by the Tantivy index
//! - [`ContentIndexer`]: Entry point for index, delete and rebuild requests
//! - [`IndexObserver`]: Error and progress notifications
//!
//! ## Architecture
//!
//! 1. A node change reaches [`ContentIndexer`]
//! 2. [`VisibilityFilter`] accepts or silently skips it
//! 3. Accepted nodes become operations on the [`IndexOperationQueue`]
//! 4. The writer task applies operations in order and commits in batches
//! 5. Deletes first scan the index for descendants and delete those too
//!
//! ## Example
//!
//! ```ignore
//! use content_indexing::{ContentIndexer, IndexerConfig, IndexOperationQueue, QueueConfig};
//!
//! let queue = Arc::new(IndexOperationQueue::start(updater, observer.clone(), QueueConfig::default()));
//! let indexer = ContentIndexer::new(IndexerConfig::default(), repository, searcher, queue, observer);
//!
//! indexer.rebuild_index().await?;
//! indexer.delete_node(NodeId::new(1050)).await?;
//! indexer.shutdown().await?;
//! ```

pub mod error;
pub mod indexer;
pub mod observer;
pub mod path_matcher;
pub mod queue;
pub mod rebuild;
pub mod repository;
pub mod tantivy_updater;
pub mod updater;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use error::IndexingError;
pub use indexer::{ContentIndexer, IndexOutcome, IndexerConfig};
pub use observer::{IndexObserver, IndexingErrorEvent, NoOpObserver, TracingObserver};
pub use path_matcher::HierarchyPathMatcher;
pub use queue::{IndexOperationQueue, QueueConfig, QueueMode, QueueStats};
pub use rebuild::{
    LoggingProgressCallback, NoOpProgressCallback, ProgressCallback, RebuildConfig,
    RebuildProgress, RebuildResult,
};
pub use repository::{ContentNode, ContentRepository, InMemoryContentRepository};
pub use tantivy_updater::TantivyIndexUpdater;
pub use updater::{IndexUpdater, UpdateResult};
pub use visibility::{IndexCriteria, SkipReason, VisibilityFilter};
