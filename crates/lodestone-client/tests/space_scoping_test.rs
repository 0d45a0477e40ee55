//! Workspace scoping through the client facade and handles.
//!
//! Every request a scoped handle makes must carry the workspace selector
//! down to the transport; the in-memory transport records the selector it
//! last saw.

use std::sync::Arc;

use lodestone_client::memory::MemoryTransport;
use lodestone_client::{
    CreateIndexParams, CreatePluginInstanceParams, InsertOptions, ItemFilter, Lodestone,
};
use lodestone_core::models::Space;

#[tokio::test]
async fn test_unscoped_requests_carry_no_space() {
    let transport = Arc::new(MemoryTransport::new());
    let client = Lodestone::with_transport(transport.clone());

    client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();

    assert_eq!(transport.last_space(), None);
}

#[tokio::test]
async fn test_default_space_scopes_every_operation() {
    let transport = Arc::new(MemoryTransport::new());
    let client = Lodestone::with_transport(transport.clone())
        .with_default_space(Space::handle("dev"));

    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap();
    assert_eq!(transport.last_space(), Some(Space::handle("dev")));

    index.insert("a", InsertOptions::default()).await.unwrap();
    assert_eq!(transport.last_space(), Some(Space::handle("dev")));

    index.search("a", 1, false).await.unwrap();
    assert_eq!(transport.last_space(), Some(Space::handle("dev")));

    // Task polling inherits the handle's scope
    let mut task = index.create_snapshot().await.unwrap();
    task.wait().await.unwrap();
    assert_eq!(transport.last_space(), Some(Space::handle("dev")));
}

#[tokio::test]
async fn test_in_space_rescopes_a_handle() {
    let transport = Arc::new(MemoryTransport::new());
    let client = Lodestone::with_transport(transport.clone());

    let index = client
        .create_index(CreateIndexParams::new("docs", "text-embedding"))
        .await
        .unwrap()
        .in_space(Space::id("sp-2"));

    index.list_items(ItemFilter::default()).await.unwrap();
    assert_eq!(transport.last_space(), Some(Space::id("sp-2")));
}

#[tokio::test]
async fn test_plugin_instances_inherit_default_space() {
    let transport = Arc::new(MemoryTransport::new());
    let client = Lodestone::with_transport(transport.clone())
        .with_default_space(Space::handle("dev"));

    let instance = client
        .create_plugin_instance(CreatePluginInstanceParams::new("acme-tagger"))
        .await
        .unwrap();
    instance.tag("text").await.unwrap();

    assert_eq!(transport.last_space(), Some(Space::handle("dev")));
}
