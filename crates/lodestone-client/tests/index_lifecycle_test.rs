//! End-to-end index scenarios against the in-memory transport.

use std::collections::BTreeMap;
use std::sync::Arc;

use lodestone_client::memory::MemoryTransport;
use lodestone_client::{CreateIndexParams, InsertOptions, ItemFilter, Lodestone};
use lodestone_core::models::{IndexItem, Metadata};

fn client() -> Lodestone {
    Lodestone::with_transport(Arc::new(MemoryTransport::new()))
}

#[tokio::test]
async fn test_create_insert_search_scenario() {
    let client = client();

    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();
    assert!(!index.id.is_empty());
    assert_eq!(index.name.as_deref(), Some("docs"));

    index.insert_many(vec!["a", "b"], true).await.unwrap();

    let result = index.search("a", 1, false).await.unwrap();
    assert_eq!(result.hits.len(), 1);

    let hits = result.single();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].value.as_deref(), Some("a"));
}

#[tokio::test]
async fn test_upsert_returns_existing_index() {
    let client = client();

    let first = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();
    let second = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn test_single_insert_equivalent_to_one_item_batch() {
    let client = client();

    let single = client
        .create_index(CreateIndexParams::new("single", "text-embedding"))
        .await
        .unwrap();
    let batch = client
        .create_index(CreateIndexParams::new("batch", "text-embedding"))
        .await
        .unwrap();

    single.insert("hello", InsertOptions::default()).await.unwrap();
    batch.insert_many(vec!["hello"], true).await.unwrap();

    let mut single_items = single.list_items(ItemFilter::default()).await.unwrap();
    let mut batch_items = batch.list_items(ItemFilter::default()).await.unwrap();
    assert_eq!(single_items.len(), 1);
    assert_eq!(batch_items.len(), 1);

    // Server-assigned ids differ; the items themselves must not
    let mut a = single_items.remove(0);
    let mut b = batch_items.remove(0);
    a.id = None;
    b.id = None;
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_search_orders_hits_by_descending_score() {
    let client = client();
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    index
        .insert_many(vec!["red apple", "red", "green pear"], true)
        .await
        .unwrap();

    let result = index.search("red", 3, false).await.unwrap();
    let hits = result.single();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].value.as_deref(), Some("red"));
    for window in hits.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}

#[tokio::test]
async fn test_batch_search_preserves_query_order() {
    let client = client();
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    index.insert_many(vec!["a", "b", "c"], true).await.unwrap();

    let result = index.search(vec!["c", "a"], 1, false).await.unwrap();
    assert_eq!(result.hits.len(), 2);
    assert_eq!(result.hits[0][0].value.as_deref(), Some("c"));
    assert_eq!(result.hits[1][0].value.as_deref(), Some("a"));
}

#[tokio::test]
async fn test_search_metadata_only_included_on_request() {
    let client = client();
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    let mut map = BTreeMap::new();
    map.insert("page".to_string(), Metadata::Int(3));
    let metadata = Metadata::Map(map);

    index
        .insert(
            "annotated",
            InsertOptions::default().with_metadata(metadata.clone()),
        )
        .await
        .unwrap();

    let without = index.search("annotated", 1, false).await.unwrap();
    assert!(without.single()[0].metadata.is_none());

    let with = index.search("annotated", 1, true).await.unwrap();
    let decoded = with.single()[0].decoded_metadata().unwrap();
    assert_eq!(decoded, Some(metadata));
}

#[tokio::test]
async fn test_list_items_filters_by_file_id() {
    let client = client();
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    index
        .insert_file("file-1", Some("paragraph"), InsertOptions::default())
        .await
        .unwrap();
    index
        .insert_file("file-2", None, InsertOptions::default())
        .await
        .unwrap();
    index.insert("plain text", InsertOptions::default()).await.unwrap();

    let all = index.list_items(ItemFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let filtered = index
        .list_items(ItemFilter::default().with_file_id("file-1"))
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert!(filtered
        .iter()
        .all(|item| item.file_id.as_deref() == Some("file-1")));
    // The block-type expansion hint is not an item identifier
    assert!(filtered[0].block_id.is_none());
}

#[tokio::test]
async fn test_structured_items_round_trip_through_listing() {
    let client = client();
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    let metadata = Metadata::from(vec!["tagged", "reviewed"]);
    let item = IndexItem::from_value("document body")
        .with_external_id("ext-7")
        .with_metadata(metadata.clone())
        .unwrap();

    index.insert_many(vec![item], true).await.unwrap();

    let items = index.list_items(ItemFilter::default()).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].external_id.as_deref(), Some("ext-7"));
    assert_eq!(items[0].decoded_metadata().unwrap(), Some(metadata));
}

#[tokio::test]
async fn test_operations_after_delete_surface_not_found() {
    let client = client();
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    index.insert("a", InsertOptions::default()).await.unwrap();
    index.delete().await.unwrap();

    let insert_err = index.insert("b", InsertOptions::default()).await.unwrap_err();
    assert!(insert_err.is_not_found());

    let search_err = index.search("a", 1, false).await.unwrap_err();
    assert!(search_err.is_not_found());

    let list_err = index.list_items(ItemFilter::default()).await.unwrap_err();
    assert!(list_err.is_not_found());

    let snapshot_err = index.create_snapshot().await.unwrap_err();
    assert!(snapshot_err.is_not_found());

    let embed_err = index.embed().await.unwrap_err();
    assert!(embed_err.is_not_found());
}

#[tokio::test]
async fn test_snapshot_lifecycle() {
    let client = client();
    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    index.insert("a", InsertOptions::default()).await.unwrap();

    let mut task = index.create_snapshot().await.unwrap();
    task.wait().await.unwrap();

    let snapshots = index.list_snapshots().await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].index_id.as_deref(), Some(index.id.as_str()));
    assert!(snapshots[0].created_at.is_some());

    index.delete_snapshot(&snapshots[0].snapshot_id).await.unwrap();
    assert!(index.list_snapshots().await.unwrap().is_empty());

    let err = index.delete_snapshot("snap-missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_detached_handle_resolves_by_id() {
    let client = client();
    let created = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();
    created.insert("a", InsertOptions::default()).await.unwrap();

    // A handle built from the bare id reaches the same index
    let attached = client.index(created.id.clone());
    let items = attached.list_items(ItemFilter::default()).await.unwrap();
    assert_eq!(items.len(), 1);

    // A bogus id fails on first use, not at construction
    let bogus = client.index("idx-does-not-exist");
    assert!(bogus
        .list_items(ItemFilter::default())
        .await
        .unwrap_err()
        .is_not_found());
}
