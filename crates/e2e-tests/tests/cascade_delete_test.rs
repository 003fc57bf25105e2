//! E2E cascade delete tests.
//!
//! Verifies that deleting a node removes exactly the node and its indexed
//! descendants from an on-disk index, matching ids by whole path segments.

use e2e_tests::{ids, TestHarness};
use pretty_assertions::assert_eq;

use content_indexing::{IndexOutcome, QueueMode, SkipReason};
use content_types::{IndexItem, IndexType, NodeId, ValueSet};

/// Rebuild a three-level branch, then delete its top node.
#[tokio::test]
async fn test_rebuild_then_delete_whole_branch() {
    let harness = TestHarness::new(QueueMode::Sync);

    // 1. Build the tree: 1 > 2 > 3, with 4 beside it
    harness.add_node("-1,1", "home", "Home");
    harness.add_node("-1,1,2", "textPage", "Products");
    harness.add_node("-1,1,2,3", "textPage", "Sandals");
    harness.add_node("-1,4", "home", "Archive");

    // 2. Rebuild
    let result = harness.indexer.rebuild_index().await.unwrap();
    assert!(result.progress.completed);
    assert_eq!(result.progress.indexed, 4);
    assert_eq!(harness.indexed_ids(), ids(&[1, 2, 3, 4]));

    // 3. Delete the branch
    let deleted = harness.indexer.delete_node(NodeId::new(1)).await.unwrap();
    assert_eq!(deleted, 3);

    // 4. Only the unrelated node is left
    assert_eq!(harness.indexed_ids(), ids(&[4]));
    assert!(harness.observer.errors().is_empty());

    harness.indexer.shutdown().await.unwrap();
}

/// Ids that share digits with the deleted id are not descendants.
#[tokio::test]
async fn test_delete_keeps_nodes_sharing_digits() {
    let harness = TestHarness::new(QueueMode::Sync);

    for (path, name) in [
        ("-1,5", "Five"),
        ("-1,5,52", "Under five"),
        ("-1,51", "Fifty-one"),
        ("-1,51,515", "Under fifty-one"),
        ("-1,15", "Fifteen"),
        ("-1,15,150", "Under fifteen"),
    ] {
        let item = harness.add_node(path, "textPage", name);
        harness.indexer.index_node(item).await.unwrap();
    }
    assert_eq!(harness.indexed_ids(), ids(&[5, 15, 51, 52, 150, 515]));

    let deleted = harness.indexer.delete_node(NodeId::new(5)).await.unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(harness.indexed_ids(), ids(&[15, 51, 150, 515]));

    harness.indexer.shutdown().await.unwrap();
}

/// Deleting a middle node leaves its ancestors and siblings alone.
#[tokio::test]
async fn test_delete_middle_of_tree() {
    let harness = TestHarness::new(QueueMode::Sync);

    harness.add_node("-1,1", "home", "Home");
    harness.add_node("-1,1,2", "textPage", "Products");
    harness.add_node("-1,1,2,3", "textPage", "Sandals");
    harness.add_node("-1,1,2,3,8", "textPage", "Sandal sizes");
    harness.add_node("-1,1,7", "textPage", "About");
    harness.indexer.rebuild_index().await.unwrap();

    let deleted = harness.indexer.delete_node(NodeId::new(2)).await.unwrap();

    assert_eq!(deleted, 3);
    assert_eq!(harness.indexed_ids(), ids(&[1, 7]));

    harness.indexer.shutdown().await.unwrap();
}

/// A node that was never indexed deletes cleanly.
#[tokio::test]
async fn test_delete_unknown_node() {
    let harness = TestHarness::new(QueueMode::Sync);

    harness.add_node("-1,1", "home", "Home");
    harness.indexer.rebuild_index().await.unwrap();

    let deleted = harness.indexer.delete_node(NodeId::new(99)).await.unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(harness.indexed_ids(), ids(&[1]));
    assert!(harness.observer.errors().is_empty());

    harness.indexer.shutdown().await.unwrap();
}

/// In async mode the delete still sees descendants that were only queued.
#[tokio::test]
async fn test_async_delete_sees_queued_descendants() {
    let harness = TestHarness::new(QueueMode::Async);

    // 1. Enqueue a branch without waiting for commits
    for (path, name) in [
        ("-1,10", "Blog"),
        ("-1,10,11", "First post"),
        ("-1,10,11,12", "Comment"),
        ("-1,20", "Shop"),
    ] {
        let item = harness.add_node(path, "textPage", name);
        harness.indexer.index_node(item).await.unwrap();
    }

    // 2. Delete right away
    let deleted = harness.indexer.delete_node(NodeId::new(10)).await.unwrap();
    assert_eq!(deleted, 3);

    // 3. Wait for the deletes to land
    harness.indexer.flush().await.unwrap();
    assert_eq!(harness.indexed_ids(), ids(&[20]));

    harness.indexer.shutdown().await.unwrap();
}

/// Deleting the root id removes nothing.
#[tokio::test]
async fn test_delete_root_id_matches_nothing() {
    let harness = TestHarness::new(QueueMode::Sync);

    harness.add_node("-1,1", "home", "Home");
    harness.add_node("-1,1,2", "textPage", "Products");
    harness.indexer.rebuild_index().await.unwrap();

    harness.indexer.delete_node(NodeId::ROOT).await.unwrap();

    assert_eq!(harness.indexed_ids(), ids(&[1, 2]));

    harness.indexer.shutdown().await.unwrap();
}

/// An item whose path ends at another node is never indexed, so deleting
/// that other node cannot take it along.
#[tokio::test]
async fn test_item_with_foreign_path_is_not_indexed() {
    let harness = TestHarness::new(QueueMode::Sync);

    let five = harness.add_node("-1,5", "textPage", "Five");
    harness.indexer.index_node(five).await.unwrap();

    let value_set = ValueSet::new("textPage")
        .with_value("path", "-1,5")
        .with_value("nodeName", "Seven");
    let seven = IndexItem::new(NodeId::new(7), IndexType::Content, value_set);
    let outcome = harness.indexer.index_node(seven).await.unwrap();

    assert_eq!(outcome, IndexOutcome::Skipped(SkipReason::InvalidPath));
    assert_eq!(harness.indexed_ids(), ids(&[5]));

    let deleted = harness.indexer.delete_node(NodeId::new(5)).await.unwrap();
    assert_eq!(deleted, 1);
    assert!(harness.indexed_ids().is_empty());

    harness.indexer.shutdown().await.unwrap();
}
