//! Search indexer for writing node documents to the Tantivy index.
//!
//! One IndexWriter per index behind a mutex, shared by the writer task and
//! maintenance calls. Documents are not visible until commit() is called.
//! Within one writer, operations take effect in call order: a delete only
//! removes documents added before it.

use std::sync::{Mutex, MutexGuard};

use tantivy::{IndexWriter, Term};
use tracing::{debug, info, warn};

use content_types::{IndexItem, NodeId};

use crate::document::item_to_doc;
use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// Writes node documents keyed by `__NodeId`.
pub struct SearchIndexer {
    writer: Mutex<IndexWriter>,
    schema: SearchSchema,
}

impl SearchIndexer {
    /// Take the index's writer. Fails if another writer holds the lock.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let writer = index.writer()?;
        let schema = index.schema().clone();

        Ok(Self {
            writer: Mutex::new(writer),
            schema,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexWriter>, SearchError> {
        self.writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))
    }

    fn id_term(&self, id: NodeId) -> Term {
        Term::from_field_text(self.schema.node_id, &id.to_string())
    }

    /// Index an item.
    ///
    /// If a document with the same node id exists, it will be replaced.
    pub fn index_item(&self, item: &IndexItem) -> Result<(), SearchError> {
        let doc = item_to_doc(&self.schema, item)?;

        let writer = self.lock()?;
        writer.delete_term(self.id_term(item.id));
        writer.add_document(doc)?;

        debug!(node_id = %item.id, index_type = %item.index_type, "Indexed node");
        Ok(())
    }

    /// Delete a node's document by id.
    pub fn delete_node(&self, id: NodeId) -> Result<(), SearchError> {
        let writer = self.lock()?;
        writer.delete_term(self.id_term(id));

        debug!(node_id = %id, "Deleted document");
        Ok(())
    }

    /// Remove every document. Takes effect on the next commit.
    pub fn clear(&self) -> Result<(), SearchError> {
        let writer = self.lock()?;
        writer.delete_all_documents()?;
        warn!("Cleared all documents from index");
        Ok(())
    }

    /// Make pending operations searchable. Returns the commit opstamp.
    pub fn commit(&self) -> Result<u64, SearchError> {
        let mut writer = self.lock()?;
        let opstamp = writer.commit()?;
        debug!(opstamp, "Committed index changes");
        Ok(opstamp)
    }

    /// Drop every operation since the last commit.
    pub fn rollback(&self) -> Result<u64, SearchError> {
        let mut writer = self.lock()?;
        let opstamp = writer.rollback()?;
        warn!(opstamp, "Rolled back index changes");
        Ok(opstamp)
    }

    /// Ask Tantivy to merge all searchable segments into one.
    ///
    /// Advisory: the merge runs on Tantivy's merge threads and this call
    /// does not wait for it. Returns whether a merge was scheduled.
    pub fn optimize(&self) -> Result<bool, SearchError> {
        let mut writer = self.lock()?;
        let segment_ids = writer.index().searchable_segment_ids()?;
        if segment_ids.len() < 2 {
            debug!(segments = segment_ids.len(), "Nothing to merge");
            return Ok(false);
        }

        info!(segments = segment_ids.len(), "Scheduling segment merge");
        drop(writer.merge(&segment_ids));
        Ok(true)
    }
}
