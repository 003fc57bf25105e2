//! End-to-end test infrastructure for the content index.
//!
//! Provides a shared TestHarness that wires an on-disk Tantivy index, the
//! operation queue and the content indexer together, plus helpers for
//! building content trees.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use content_indexing::{
    ContentIndexer, ContentNode, InMemoryContentRepository, IndexObserver, IndexOperationQueue,
    IndexerConfig, IndexingErrorEvent, QueueConfig, QueueMode, TantivyIndexUpdater,
};
use content_search::{
    Criteria, FieldPolicyRegistry, NodeSearcher, SearchIndex, SearchIndexConfig, SearchIndexer,
    SearchSurface, PATH_FIELD,
};
use content_types::{IndexItem, NodeId, NodePath};

/// Observer that keeps every reported error.
#[derive(Default)]
pub struct CollectingObserver {
    errors: Mutex<Vec<IndexingErrorEvent>>,
}

impl CollectingObserver {
    pub fn errors(&self) -> Vec<IndexingErrorEvent> {
        self.errors.lock().expect("observer lock poisoned").clone()
    }
}

impl IndexObserver for CollectingObserver {
    fn on_indexing_error(&self, event: &IndexingErrorEvent) {
        self.errors
            .lock()
            .expect("observer lock poisoned")
            .push(event.clone());
    }
}

/// Shared test harness for E2E tests.
///
/// Must be created inside a Tokio runtime: it starts the writer task.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Path of the Tantivy index directory
    pub index_path: PathBuf,
    pub index: SearchIndex,
    pub searcher: Arc<NodeSearcher>,
    pub repository: Arc<InMemoryContentRepository>,
    pub observer: Arc<CollectingObserver>,
    pub indexer: ContentIndexer,
}

impl TestHarness {
    /// Harness with default field policies and visibility options.
    pub fn new(mode: QueueMode) -> Self {
        Self::with_config(mode, IndexerConfig::default(), FieldPolicyRegistry::new())
    }

    /// Harness with explicit indexer configuration and field policies.
    pub fn with_config(
        mode: QueueMode,
        config: IndexerConfig,
        registry: FieldPolicyRegistry,
    ) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let index_path = temp_dir.path().join("content-index");

        let index = SearchIndex::open_or_create(
            SearchIndexConfig::new(&index_path),
            Arc::new(registry),
        )
        .expect("Failed to open search index");
        let writer = Arc::new(SearchIndexer::new(&index).expect("Failed to open index writer"));
        let searcher = Arc::new(NodeSearcher::new(&index).expect("Failed to open searcher"));

        let repository = Arc::new(InMemoryContentRepository::new());
        let observer = Arc::new(CollectingObserver::default());
        let updater = Arc::new(TantivyIndexUpdater::new(
            writer,
            config.index_set_name.clone(),
        ));
        let queue_config = QueueConfig {
            index_set_name: config.index_set_name.clone(),
            ..QueueConfig::default()
        }
        .with_mode(mode);
        let queue = Arc::new(IndexOperationQueue::start(
            updater,
            observer.clone(),
            queue_config,
        ));
        let indexer = ContentIndexer::new(
            config,
            repository.clone(),
            searcher.clone(),
            queue,
            observer.clone(),
        );

        Self {
            _temp_dir: temp_dir,
            index_path,
            index,
            searcher,
            repository,
            observer,
            indexer,
        }
    }

    /// Add a published node to the repository and return its item.
    pub fn add_node(&self, path: &str, item_type: &str, name: &str) -> IndexItem {
        let item = content_item(path, item_type, name);
        self.repository
            .insert(ContentNode::new(item.clone()))
            .expect("Failed to add node");
        item
    }

    /// Add a node built by the caller.
    pub fn insert(&self, node: ContentNode) -> IndexItem {
        let item = node.item.clone();
        self.repository.insert(node).expect("Failed to add node");
        item
    }

    /// Ids of every node currently in the index, sorted.
    pub fn indexed_ids(&self) -> Vec<NodeId> {
        self.searcher
            .search_ids(&Criteria::raw(PATH_FIELD, "-1(,.*)?"))
            .expect("Failed to list indexed nodes")
    }

    /// Ids matching one exact term in a field.
    pub fn term_ids(&self, field: &str, value: &str) -> Vec<NodeId> {
        self.searcher
            .search_ids(&Criteria::term(field, value))
            .expect("Term query failed")
    }
}

/// A content item at `path` with a node name.
pub fn content_item(path: &str, item_type: &str, name: &str) -> IndexItem {
    let path = NodePath::parse(path).expect("Invalid test path");
    let mut item = IndexItem::content(&path, item_type);
    item.value_set.add("nodeName", name);
    item
}

/// Node ids from raw integers.
pub fn ids(raw: &[i64]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId::new).collect()
}
