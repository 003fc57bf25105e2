//! E2E operation ordering tests.
//!
//! Operations for a node are applied in the order they were requested, in
//! both synchronous and asynchronous queue modes.

use e2e_tests::{ids, TestHarness};
use pretty_assertions::assert_eq;

use content_indexing::QueueMode;
use content_types::NodeId;

async fn index_then_delete(mode: QueueMode) {
    let harness = TestHarness::new(mode);
    let item = harness.add_node("-1,30", "textPage", "Spring");

    harness.indexer.index_node(item).await.unwrap();
    harness.indexer.delete_node(NodeId::new(30)).await.unwrap();
    harness.indexer.flush().await.unwrap();

    assert!(harness.indexed_ids().is_empty());
    harness.indexer.shutdown().await.unwrap();
}

async fn delete_then_index(mode: QueueMode) {
    let harness = TestHarness::new(mode);
    let item = harness.add_node("-1,30", "textPage", "Spring");

    harness.indexer.delete_node(NodeId::new(30)).await.unwrap();
    harness.indexer.index_node(item).await.unwrap();
    harness.indexer.flush().await.unwrap();

    assert_eq!(harness.indexed_ids(), ids(&[30]));
    harness.indexer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_index_then_delete_sync() {
    index_then_delete(QueueMode::Sync).await;
}

#[tokio::test]
async fn test_index_then_delete_async() {
    index_then_delete(QueueMode::Async).await;
}

#[tokio::test]
async fn test_delete_then_index_sync() {
    delete_then_index(QueueMode::Sync).await;
}

#[tokio::test]
async fn test_delete_then_index_async() {
    delete_then_index(QueueMode::Async).await;
}

/// In sync mode a change is searchable as soon as the call returns.
#[tokio::test]
async fn test_sync_index_visible_on_return() {
    let harness = TestHarness::new(QueueMode::Sync);
    let item = harness.add_node("-1,40", "textPage", "Harbour lights");

    harness.indexer.index_node(item).await.unwrap();

    assert_eq!(harness.term_ids("nodeName", "harbour"), ids(&[40]));
    harness.indexer.shutdown().await.unwrap();
}

/// Re-indexing a node replaces its document.
#[tokio::test]
async fn test_update_replaces_document() {
    let harness = TestHarness::new(QueueMode::Async);

    // 1. Index, then re-index with a new name
    let first = harness.add_node("-1,41", "textPage", "Old name");
    harness.indexer.index_node(first).await.unwrap();
    let second = harness.add_node("-1,41", "textPage", "Fresh name");
    harness.indexer.index_node(second).await.unwrap();

    // 2. Only the latest version is indexed
    harness.indexer.flush().await.unwrap();
    assert_eq!(harness.indexed_ids(), ids(&[41]));
    assert_eq!(harness.term_ids("nodeName", "fresh"), ids(&[41]));
    assert!(harness.term_ids("nodeName", "old").is_empty());

    // 3. Queue counters saw both updates
    let stats = harness.indexer.queue().stats();
    assert_eq!(stats.failed, 0);
    assert!(stats.applied >= 2);

    harness.indexer.shutdown().await.unwrap();
}

/// Many queued changes across nodes all land after a flush.
#[tokio::test]
async fn test_async_burst_lands_after_flush() {
    let harness = TestHarness::new(QueueMode::Async);

    for id in 100..150 {
        let item = harness.add_node(&format!("-1,{}", id), "textPage", "Bulk page");
        harness.indexer.index_node(item).await.unwrap();
    }
    for id in (100..150).step_by(2) {
        harness.indexer.delete_node(NodeId::new(id)).await.unwrap();
    }
    harness.indexer.flush().await.unwrap();

    let expected: Vec<i64> = (101..150).step_by(2).collect();
    assert_eq!(harness.indexed_ids(), ids(&expected));

    harness.indexer.shutdown().await.unwrap();
}

/// Clearing removes everything, and later changes still apply.
#[tokio::test]
async fn test_clear_then_index() {
    let harness = TestHarness::new(QueueMode::Sync);

    harness.add_node("-1,1", "home", "Home");
    harness.add_node("-1,1,2", "textPage", "Products");
    harness.indexer.rebuild_index().await.unwrap();
    assert_eq!(harness.indexed_ids(), ids(&[1, 2]));

    harness.indexer.clear().await.unwrap();
    assert!(harness.indexed_ids().is_empty());

    let item = harness.add_node("-1,3", "textPage", "After clear");
    harness.indexer.index_node(item).await.unwrap();
    harness.indexer.optimize().await.unwrap();
    assert_eq!(harness.indexed_ids(), ids(&[3]));

    harness.indexer.shutdown().await.unwrap();
}
