//! Tantivy index updater.
//!
//! Wraps SearchIndexer from content-search so the operation queue can drive
//! it. Add and Update upsert by node id; Delete removes by node id.

use std::sync::Arc;

use tracing::{debug, warn};

use content_search::SearchIndexer;
use content_types::{IndexOperation, OperationKind};

use crate::error::IndexingError;
use crate::updater::IndexUpdater;

/// Full-text index updater using Tantivy.
pub struct TantivyIndexUpdater {
    indexer: Arc<SearchIndexer>,
    name: String,
}

impl TantivyIndexUpdater {
    /// Create a new updater named after its index set.
    pub fn new(indexer: Arc<SearchIndexer>, name: impl Into<String>) -> Self {
        Self {
            indexer,
            name: name.into(),
        }
    }
}

impl IndexUpdater for TantivyIndexUpdater {
    fn apply(&self, operation: &IndexOperation) -> Result<(), IndexingError> {
        match operation.kind() {
            OperationKind::Add | OperationKind::Update => {
                let item = operation.item().ok_or_else(|| {
                    IndexingError::Writer(format!(
                        "{} of node {} carries no item",
                        operation.kind().as_str(),
                        operation.id()
                    ))
                })?;
                self.indexer.index_item(item)?;
            }
            OperationKind::Delete => {
                self.indexer.delete_node(operation.id())?;
            }
        }
        debug!(
            updater = %self.name,
            node_id = %operation.id(),
            kind = operation.kind().as_str(),
            "Applied operation"
        );
        Ok(())
    }

    /// A failed commit rolls the writer back so later batches start clean.
    fn commit(&self) -> Result<(), IndexingError> {
        if let Err(e) = self.indexer.commit() {
            if let Err(rollback) = self.indexer.rollback() {
                warn!(updater = %self.name, error = %rollback, "Rollback after failed commit failed");
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn optimize(&self) -> Result<bool, IndexingError> {
        Ok(self.indexer.optimize()?)
    }

    fn clear(&self) -> Result<(), IndexingError> {
        self.indexer.clear()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_search::{
        Criteria, FieldPolicyRegistry, NodeSearcher, SearchIndex, SearchIndexConfig,
        SearchSurface, NODE_ID_FIELD,
    };
    use content_types::{IndexItem, NodeId, NodePath};
    use tempfile::TempDir;

    fn create_test_index(path: &std::path::Path) -> SearchIndex {
        let config = SearchIndexConfig::new(path);
        SearchIndex::open_or_create(config, Arc::new(FieldPolicyRegistry::new())).unwrap()
    }

    fn item(path: &str) -> IndexItem {
        let path = NodePath::parse(path).unwrap();
        let mut item = IndexItem::content(&path, "textPage");
        item.value_set.add("nodeName", "Page");
        item
    }

    fn ids(searcher: &NodeSearcher, id: i64) -> Vec<NodeId> {
        searcher
            .search_ids(&Criteria::term(NODE_ID_FIELD, id.to_string()))
            .unwrap()
    }

    #[test]
    fn test_updater_name() {
        let temp_dir = TempDir::new().unwrap();
        let index = create_test_index(temp_dir.path());
        let updater = TantivyIndexUpdater::new(
            Arc::new(SearchIndexer::new(&index).unwrap()),
            "ContentIndexSet",
        );
        assert_eq!(updater.name(), "ContentIndexSet");
    }

    #[test]
    fn test_apply_add_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let index = create_test_index(temp_dir.path());
        let updater =
            TantivyIndexUpdater::new(Arc::new(SearchIndexer::new(&index).unwrap()), "test");
        let searcher = NodeSearcher::new(&index).unwrap();

        updater.apply(&IndexOperation::add(item("-1,10"))).unwrap();
        updater.commit().unwrap();
        assert_eq!(ids(&searcher, 10), vec![NodeId::new(10)]);

        updater.apply(&IndexOperation::delete(NodeId::new(10))).unwrap();
        updater.commit().unwrap();
        assert!(ids(&searcher, 10).is_empty());
    }

    #[test]
    fn test_apply_update_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let index = create_test_index(temp_dir.path());
        let updater =
            TantivyIndexUpdater::new(Arc::new(SearchIndexer::new(&index).unwrap()), "test");
        let searcher = NodeSearcher::new(&index).unwrap();

        updater.apply(&IndexOperation::add(item("-1,10"))).unwrap();
        updater.apply(&IndexOperation::update(item("-1,10"))).unwrap();
        updater.commit().unwrap();

        assert_eq!(searcher.num_docs().unwrap(), 1);
    }

    #[test]
    fn test_apply_invalid_item_fails() {
        let temp_dir = TempDir::new().unwrap();
        let index = create_test_index(temp_dir.path());
        let updater =
            TantivyIndexUpdater::new(Arc::new(SearchIndexer::new(&index).unwrap()), "test");

        let mut broken = item("-1,10");
        broken.value_set.values.remove(content_types::PATH_VALUE);
        let result = updater.apply(&IndexOperation::add(broken));
        assert!(matches!(result, Err(IndexingError::Search(_))));
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let index = create_test_index(temp_dir.path());
        let updater =
            TantivyIndexUpdater::new(Arc::new(SearchIndexer::new(&index).unwrap()), "test");
        let searcher = NodeSearcher::new(&index).unwrap();

        updater.apply(&IndexOperation::add(item("-1,10"))).unwrap();
        updater.apply(&IndexOperation::add(item("-1,11"))).unwrap();
        updater.commit().unwrap();
        updater.clear().unwrap();
        updater.commit().unwrap();

        assert_eq!(searcher.num_docs().unwrap(), 0);
    }
}
