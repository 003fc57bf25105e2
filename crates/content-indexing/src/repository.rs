//! Content repository the indexer reads nodes from.
//!
//! The indexer only needs three questions answered: which nodes exist, what
//! a node's indexable values are, and whether a node is access-protected.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use content_types::{FieldValue, IndexItem, IndexType, NodeId, NodePath, ValueSet, PATH_VALUE};

use crate::error::IndexingError;

/// Source of nodes for indexing.
pub trait ContentRepository: Send + Sync {
    /// Every node id, parents before children.
    ///
    /// Unpublished nodes are only listed when `include_unpublished` is set.
    fn all_node_ids(&self, include_unpublished: bool) -> Result<Vec<NodeId>, IndexingError>;

    /// The node materialized for indexing, or None when it no longer exists.
    fn get_item(&self, id: NodeId) -> Result<Option<IndexItem>, IndexingError>;

    /// True when the node or one of its ancestors is access-protected.
    fn is_protected(&self, id: NodeId, path: &NodePath) -> bool;
}

/// A node held by [`InMemoryContentRepository`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    pub item: IndexItem,
    pub published: bool,
    pub protected: bool,
}

impl ContentNode {
    /// A published, unprotected node.
    pub fn new(item: IndexItem) -> Self {
        Self {
            item,
            published: true,
            protected: false,
        }
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FieldValues {
    One(FieldValue),
    Many(Vec<FieldValue>),
}

/// JSON form of one node.
///
/// ```json
/// { "id": 1100, "path": "-1,1050,1100", "item_type": "textPage",
///   "values": { "nodeName": "Summer", "tags": ["a", "b"] } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    id: NodeId,
    path: NodePath,
    item_type: String,
    #[serde(default = "default_index_type")]
    index_type: IndexType,
    #[serde(default = "default_true")]
    published: bool,
    #[serde(default)]
    protected: bool,
    #[serde(default)]
    values: BTreeMap<String, FieldValues>,
}

fn default_index_type() -> IndexType {
    IndexType::Content
}

fn default_true() -> bool {
    true
}

impl NodeRecord {
    fn into_node(self) -> Result<ContentNode, IndexingError> {
        if self.path.node_id() != self.id {
            return Err(IndexingError::Repository(format!(
                "node {} has path {} ending elsewhere",
                self.id, self.path
            )));
        }

        let mut value_set = ValueSet::new(self.item_type);
        for (name, values) in self.values {
            match values {
                FieldValues::One(value) => value_set.add(name, value),
                FieldValues::Many(values) => {
                    for value in values {
                        value_set.add(name.clone(), value);
                    }
                }
            }
        }
        if value_set.get("id").is_none() {
            value_set.add("id", self.id.get());
        }
        value_set
            .values
            .insert(PATH_VALUE.to_string(), vec![self.path.to_string().into()]);

        Ok(ContentNode {
            item: IndexItem::new(self.id, self.index_type, value_set),
            published: self.published,
            protected: self.protected,
        })
    }
}

/// Repository backed by a map, loadable from JSON.
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    nodes: RwLock<BTreeMap<NodeId, ContentNode>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of nodes.
    pub fn from_json(json: &str) -> Result<Self, IndexingError> {
        let records: Vec<NodeRecord> = serde_json::from_str(json)?;
        let repository = Self::new();
        for record in records {
            repository.insert(record.into_node()?)?;
        }
        debug!(nodes = repository.len(), "Parsed content nodes");
        Ok(repository)
    }

    /// Load a JSON array of nodes from a file.
    pub fn load(path: &Path) -> Result<Self, IndexingError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            IndexingError::Repository(format!("cannot read {}: {}", path.display(), e))
        })?;
        let repository = Self::from_json(&json)?;
        info!(path = %path.display(), nodes = repository.len(), "Loaded content nodes");
        Ok(repository)
    }

    /// Insert or replace a node.
    pub fn insert(&self, node: ContentNode) -> Result<(), IndexingError> {
        self.write()?.insert(node.item.id, node);
        Ok(())
    }

    pub fn remove(&self, id: NodeId) -> Result<Option<ContentNode>, IndexingError> {
        Ok(self.write()?.remove(&id))
    }

    pub fn len(&self) -> usize {
        self.nodes.read().map(|nodes| nodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<NodeId, ContentNode>>, IndexingError> {
        self.nodes
            .read()
            .map_err(|e| IndexingError::Repository(e.to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<NodeId, ContentNode>>, IndexingError> {
        self.nodes
            .write()
            .map_err(|e| IndexingError::Repository(e.to_string()))
    }
}

impl ContentRepository for InMemoryContentRepository {
    fn all_node_ids(&self, include_unpublished: bool) -> Result<Vec<NodeId>, IndexingError> {
        let nodes = self.read()?;
        let mut listed: Vec<(usize, NodeId)> = nodes
            .values()
            .filter(|node| include_unpublished || node.published)
            .map(|node| {
                let level = node.item.path().map(|p| p.level()).unwrap_or(usize::MAX);
                (level, node.item.id)
            })
            .collect();
        listed.sort();
        Ok(listed.into_iter().map(|(_, id)| id).collect())
    }

    fn get_item(&self, id: NodeId) -> Result<Option<IndexItem>, IndexingError> {
        Ok(self.read()?.get(&id).map(|node| node.item.clone()))
    }

    fn is_protected(&self, _id: NodeId, path: &NodePath) -> bool {
        let Ok(nodes) = self.nodes.read() else {
            return false;
        };
        path.segments()
            .iter()
            .filter_map(|segment| nodes.get(segment))
            .any(|node| node.protected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NODES: &str = r#"[
        { "id": 1, "path": "-1,1", "item_type": "home",
          "values": { "nodeName": "Home", "sortOrder": 0 } },
        { "id": 2, "path": "-1,1,2", "item_type": "textPage", "protected": true,
          "values": { "nodeName": "Members", "tags": ["a", "b"] } },
        { "id": 3, "path": "-1,1,2,3", "item_type": "textPage",
          "values": { "nodeName": "Inside" } },
        { "id": 4, "path": "-1,1,4", "item_type": "textPage", "published": false },
        { "id": 9, "path": "-1,9", "item_type": "image", "index_type": "media" }
    ]"#;

    #[test]
    fn test_from_json() {
        let repository = InMemoryContentRepository::from_json(NODES).unwrap();
        assert_eq!(repository.len(), 5);

        let item = repository.get_item(NodeId::new(2)).unwrap().unwrap();
        assert_eq!(item.value_set.item_type, "textPage");
        assert_eq!(item.value_set.get("tags").unwrap().len(), 2);
        assert_eq!(item.path().unwrap(), NodePath::parse("-1,1,2").unwrap());
        assert_eq!(
            item.value_set.get_first("id").unwrap().to_index_text(),
            "2"
        );

        let media = repository.get_item(NodeId::new(9)).unwrap().unwrap();
        assert_eq!(media.index_type, IndexType::Media);
    }

    #[test]
    fn test_mismatched_path_is_rejected() {
        let json = r#"[{ "id": 7, "path": "-1,8", "item_type": "page" }]"#;
        let result = InMemoryContentRepository::from_json(json);
        assert!(matches!(result, Err(IndexingError::Repository(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = InMemoryContentRepository::from_json("{ not json");
        assert!(matches!(result, Err(IndexingError::Serialization(_))));
    }

    #[test]
    fn test_all_node_ids_published_only() {
        let repository = InMemoryContentRepository::from_json(NODES).unwrap();

        let published = repository.all_node_ids(false).unwrap();
        assert_eq!(
            published,
            vec![NodeId::new(1), NodeId::new(9), NodeId::new(2), NodeId::new(3)]
        );

        let all = repository.all_node_ids(true).unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.contains(&NodeId::new(4)));
    }

    #[test]
    fn test_protection_is_inherited() {
        let repository = InMemoryContentRepository::from_json(NODES).unwrap();
        let check = |id: i64, path: &str| {
            repository.is_protected(NodeId::new(id), &NodePath::parse(path).unwrap())
        };

        assert!(!check(1, "-1,1"));
        assert!(check(2, "-1,1,2"));
        assert!(check(3, "-1,1,2,3"));
        assert!(!check(4, "-1,1,4"));
    }

    #[test]
    fn test_missing_node() {
        let repository = InMemoryContentRepository::new();
        assert!(repository.get_item(NodeId::new(1)).unwrap().is_none());
        assert!(repository.is_empty());
    }

    #[test]
    fn test_insert_and_remove() {
        let repository = InMemoryContentRepository::new();
        let path = NodePath::parse("-1,3").unwrap();
        repository
            .insert(ContentNode::new(IndexItem::content(&path, "page")).unpublished())
            .unwrap();

        assert!(repository.all_node_ids(false).unwrap().is_empty());
        assert!(repository.remove(NodeId::new(3)).unwrap().is_some());
        assert!(repository.is_empty());
    }

    #[test]
    fn test_poisoned_lock_fails_writes() {
        let repository = InMemoryContentRepository::new();
        let poisoned = std::thread::scope(|s| {
            s.spawn(|| {
                let _nodes = repository.nodes.write().unwrap();
                panic!("writer died holding the lock");
            })
            .join()
        });
        assert!(poisoned.is_err());

        let path = NodePath::parse("-1,3").unwrap();
        let node = ContentNode::new(IndexItem::content(&path, "page"));
        assert!(matches!(
            repository.insert(node),
            Err(IndexingError::Repository(_))
        ));
        assert!(matches!(
            repository.remove(NodeId::new(3)),
            Err(IndexingError::Repository(_))
        ));
        assert!(repository.get_item(NodeId::new(3)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(NODES.as_bytes()).unwrap();

        let repository = InMemoryContentRepository::load(file.path()).unwrap();
        assert_eq!(repository.len(), 5);
    }
}
