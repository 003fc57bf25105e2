//! Descendant discovery for cascade deletes.
//!
//! Every document stores its path as one raw token (`-1,1050,1100`). A node's
//! descendants are the documents whose path holds the node's id as a whole
//! segment after the root sentinel, so deleting 5 never touches 51 or 15.

use content_search::{Criteria, SearchError, SearchSurface, PATH_FIELD};
use content_types::{NodeId, NodePath};

/// Builds and runs the path query for a subtree.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyPathMatcher;

impl HierarchyPathMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Anchored pattern over the whole path token.
    pub fn pattern(&self, id: NodeId) -> String {
        format!("{}(,[^,]+)*,{}(,.*)?", NodeId::ROOT, id)
    }

    /// Raw query over the path field.
    pub fn criteria(&self, id: NodeId) -> Criteria {
        Criteria::raw(PATH_FIELD, self.pattern(id))
    }

    /// In-process form of the same rule.
    pub fn matches(&self, path: &NodePath, id: NodeId) -> bool {
        path.contains_segment(id)
    }

    /// Ids of every indexed node below `id`, excluding `id` itself.
    ///
    /// The root sentinel is never indexed, so it has no descendants here.
    pub fn find_descendants(
        &self,
        surface: &dyn SearchSurface,
        id: NodeId,
    ) -> Result<Vec<NodeId>, SearchError> {
        if id.is_root() {
            return Ok(Vec::new());
        }
        let mut ids = surface.search_ids(&self.criteria(id))?;
        ids.retain(|found| *found != id);
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use content_search::{FieldPolicyRegistry, NodeSearcher, SearchIndex, SearchIndexer};
    use content_types::IndexItem;

    fn path(s: &str) -> NodePath {
        NodePath::parse(s).unwrap()
    }

    fn indexed(paths: &[&str]) -> (SearchIndex, NodeSearcher) {
        let index = SearchIndex::in_memory(Arc::new(FieldPolicyRegistry::new())).unwrap();
        let indexer = SearchIndexer::new(&index).unwrap();
        for p in paths {
            indexer
                .index_item(&IndexItem::content(&path(p), "page"))
                .unwrap();
        }
        indexer.commit().unwrap();
        let searcher = NodeSearcher::new(&index).unwrap();
        (index, searcher)
    }

    fn ids(raw: &[i64]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::new).collect()
    }

    #[test]
    fn test_pattern() {
        let matcher = HierarchyPathMatcher::new();
        assert_eq!(matcher.pattern(NodeId::new(5)), "-1(,[^,]+)*,5(,.*)?");

        let criteria = matcher.criteria(NodeId::new(5));
        assert_eq!(criteria.field(), PATH_FIELD);
    }

    #[test]
    fn test_matches_is_segment_exact() {
        let matcher = HierarchyPathMatcher::new();
        let five = NodeId::new(5);

        assert!(matcher.matches(&path("-1,5"), five));
        assert!(matcher.matches(&path("-1,5,60"), five));
        assert!(matcher.matches(&path("-1,2,5,60"), five));
        assert!(!matcher.matches(&path("-1,51"), five));
        assert!(!matcher.matches(&path("-1,15"), five));
        assert!(!matcher.matches(&path("-1,150,7"), five));
    }

    #[test]
    fn test_find_descendants() {
        let (_index, searcher) = indexed(&["-1,5", "-1,5,60", "-1,5,60,61", "-1,2,5,62", "-1,7"]);
        let matcher = HierarchyPathMatcher::new();

        let found = matcher.find_descendants(&searcher, NodeId::new(5)).unwrap();
        assert_eq!(found, ids(&[60, 61, 62]));
    }

    #[test]
    fn test_find_descendants_ignores_shared_digits() {
        let (_index, searcher) = indexed(&[
            "-1,5",
            "-1,5,6",
            "-1,51",
            "-1,51,52",
            "-1,15",
            "-1,150,153",
            "-1,25,250",
        ]);
        let matcher = HierarchyPathMatcher::new();

        let found = matcher.find_descendants(&searcher, NodeId::new(5)).unwrap();
        assert_eq!(found, ids(&[6]));
    }

    #[test]
    fn test_find_descendants_of_leaf() {
        let (_index, searcher) = indexed(&["-1,1", "-1,1,2"]);
        let matcher = HierarchyPathMatcher::new();

        let found = matcher.find_descendants(&searcher, NodeId::new(2)).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_root_has_no_descendants() {
        let (_index, searcher) = indexed(&["-1,1", "-1,1,2"]);
        let matcher = HierarchyPathMatcher::new();

        let found = matcher.find_descendants(&searcher, NodeId::ROOT).unwrap();
        assert!(found.is_empty());
    }
}
