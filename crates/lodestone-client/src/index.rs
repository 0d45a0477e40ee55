//! Handle for a server-side embedding index.
//!
//! The handle caches identifiers only. Every method performs a network call
//! through the transport port; once the index is deleted server-side, every
//! further call surfaces the server's not-found failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use lodestone_core::error::{LodestoneError, Result};
use lodestone_core::models::metadata::metadata_to_wire;
use lodestone_core::models::{
    IndexItem, InsertResult, Metadata, Query, SearchResult, Snapshot, Space,
};

use crate::task::Task;
use crate::transport::{post_expect, ApiTransport};

/// A batch-insert input: plain text or a structured item.
///
/// Plain strings are normalized into items at this boundary, so inserting
/// `"a"` and inserting an item whose value is `"a"` produce the same wire
/// payload.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertInput {
    Value(String),
    Item(IndexItem),
}

impl InsertInput {
    fn into_item(self) -> IndexItem {
        match self {
            InsertInput::Value(value) => IndexItem::from_value(value),
            InsertInput::Item(item) => item,
        }
    }
}

impl From<&str> for InsertInput {
    fn from(value: &str) -> Self {
        InsertInput::Value(value.to_string())
    }
}

impl From<String> for InsertInput {
    fn from(value: String) -> Self {
        InsertInput::Value(value)
    }
}

impl From<IndexItem> for InsertInput {
    fn from(item: IndexItem) -> Self {
        InsertInput::Item(item)
    }
}

/// Options for single-value and file insertion.
///
/// `reindex` defaults to true, asking the server to fold the insertion into
/// the searchable index immediately. The flag is passed through verbatim;
/// what the server does with deferred items is its policy.
#[derive(Debug, Clone)]
pub struct InsertOptions {
    pub external_id: Option<String>,
    pub external_type: Option<String>,
    pub metadata: Option<Metadata>,
    pub reindex: bool,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            external_id: None,
            external_type: None,
            metadata: None,
            reindex: true,
        }
    }
}

impl InsertOptions {
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_external_type(mut self, external_type: impl Into<String>) -> Self {
        self.external_type = Some(external_type.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_reindex(mut self, reindex: bool) -> Self {
        self.reindex = reindex;
        self
    }
}

/// Parameters for creating (or upserting) an index.
#[derive(Debug, Clone)]
pub struct CreateIndexParams {
    pub name: String,
    pub model: String,
    pub upsert: bool,
    pub external_id: Option<String>,
    pub external_type: Option<String>,
    pub metadata: Option<Metadata>,
}

impl CreateIndexParams {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            upsert: true,
            external_id: None,
            external_type: None,
            metadata: None,
        }
    }

    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_external_type(mut self, external_type: impl Into<String>) -> Self {
        self.external_type = Some(external_type.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Filter for listing items: a conjunction over any provided identifiers.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub file_id: Option<String>,
    pub block_id: Option<String>,
    pub span_id: Option<String>,
}

impl ItemFilter {
    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }

    pub fn with_block_id(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }

    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }
}

/// A reference to a server-side embedding index.
pub struct EmbeddingIndex {
    transport: Arc<dyn ApiTransport>,
    pub id: String,
    pub name: Option<String>,
    space: Option<Space>,
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("space", &self.space)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexCreateRequest<'a> {
    name: &'a str,
    model: &'a str,
    upsert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexCreateResponse {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexInsertRequest<'a> {
    index_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Vec<IndexItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
    reindex: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexIdRequest<'a> {
    index_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexSearchRequest<'a> {
    index_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    queries: Option<&'a [String]>,
    k: usize,
    include_metadata: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListItemsRequest<'a> {
    index_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    span_id: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListItemsResponse {
    #[serde(default)]
    items: Vec<IndexItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSnapshotsResponse {
    #[serde(default)]
    snapshots: Vec<Snapshot>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteSnapshotRequest<'a> {
    snapshot_id: &'a str,
}

impl EmbeddingIndex {
    pub(crate) fn new(
        transport: Arc<dyn ApiTransport>,
        id: String,
        name: Option<String>,
        space: Option<Space>,
    ) -> Self {
        Self {
            transport,
            id,
            name,
            space,
        }
    }

    /// Request server-side creation (or upsert) and return a handle carrying
    /// the server-assigned id.
    pub async fn create(
        transport: Arc<dyn ApiTransport>,
        params: CreateIndexParams,
        space: Option<Space>,
    ) -> Result<Self> {
        let req = IndexCreateRequest {
            name: &params.name,
            model: &params.model,
            upsert: params.upsert,
            external_id: params.external_id.as_deref(),
            external_type: params.external_type.as_deref(),
            metadata: metadata_to_wire(params.metadata.as_ref())?,
        };

        let res: IndexCreateResponse = post_expect(
            transport.as_ref(),
            "embedding-index/create",
            &req,
            space.as_ref(),
        )
        .await?;

        tracing::debug!(index_id = %res.id, name = %params.name, "created index");

        Ok(Self::new(transport, res.id, Some(params.name), space))
    }

    /// Re-scope the handle to a different workspace.
    pub fn in_space(mut self, space: Space) -> Self {
        self.space = Some(space);
        self
    }

    /// Insert a single text value.
    pub async fn insert(
        &self,
        value: impl Into<String>,
        options: InsertOptions,
    ) -> Result<InsertResult> {
        let req = IndexInsertRequest {
            index_id: &self.id,
            value: Some(value.into()),
            items: None,
            file_id: None,
            block_type: None,
            external_id: options.external_id.as_deref(),
            external_type: options.external_type.as_deref(),
            metadata: metadata_to_wire(options.metadata.as_ref())?,
            reindex: options.reindex,
        };

        post_expect(
            self.transport.as_ref(),
            "embedding-index/insert",
            &req,
            self.space.as_ref(),
        )
        .await
    }

    /// Insert a batch of items; plain strings are normalized into items.
    pub async fn insert_many<I, T>(&self, items: I, reindex: bool) -> Result<InsertResult>
    where
        I: IntoIterator<Item = T>,
        T: Into<InsertInput>,
    {
        let items: Vec<IndexItem> = items
            .into_iter()
            .map(|input| input.into().into_item().clone_for_insert())
            .collect();

        let req = IndexInsertRequest {
            index_id: &self.id,
            value: None,
            items: Some(items),
            file_id: None,
            block_type: None,
            external_id: None,
            external_type: None,
            metadata: None,
            reindex,
        };

        post_expect(
            self.transport.as_ref(),
            "embedding-index/insert",
            &req,
            self.space.as_ref(),
        )
        .await
    }

    /// Insert by reference to an already-uploaded file.
    pub async fn insert_file(
        &self,
        file_id: impl AsRef<str>,
        block_type: Option<&str>,
        options: InsertOptions,
    ) -> Result<InsertResult> {
        let req = IndexInsertRequest {
            index_id: &self.id,
            value: None,
            items: None,
            file_id: Some(file_id.as_ref()),
            block_type,
            external_id: options.external_id.as_deref(),
            external_type: options.external_type.as_deref(),
            metadata: metadata_to_wire(options.metadata.as_ref())?,
            reindex: options.reindex,
        };

        post_expect(
            self.transport.as_ref(),
            "embedding-index/insert",
            &req,
            self.space.as_ref(),
        )
        .await
    }

    /// Trigger server-side embedding of not-yet-embedded items.
    pub async fn embed(&self) -> Result<Task> {
        self.post_task("embedding-index/embed").await
    }

    /// Capture an immutable snapshot of the index's embedded state.
    pub async fn create_snapshot(&self) -> Result<Task> {
        self.post_task("embedding-index/snapshot/create").await
    }

    pub async fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        let req = IndexIdRequest { index_id: &self.id };
        let res: ListSnapshotsResponse = post_expect(
            self.transport.as_ref(),
            "embedding-index/snapshot/list",
            &req,
            self.space.as_ref(),
        )
        .await?;
        Ok(res.snapshots)
    }

    pub async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()> {
        let req = DeleteSnapshotRequest { snapshot_id };
        let body = serde_json::to_value(&req)?;
        self.transport
            .post("embedding-index/snapshot/delete", body, self.space.as_ref())
            .await?;
        Ok(())
    }

    /// List items, filtered by the conjunction of any provided identifiers.
    pub async fn list_items(&self, filter: ItemFilter) -> Result<Vec<IndexItem>> {
        let req = ListItemsRequest {
            index_id: &self.id,
            file_id: filter.file_id.as_deref(),
            block_id: filter.block_id.as_deref(),
            span_id: filter.span_id.as_deref(),
        };

        let res: ListItemsResponse = post_expect(
            self.transport.as_ref(),
            "embedding-index/listItems",
            &req,
            self.space.as_ref(),
        )
        .await?;
        Ok(res.items)
    }

    /// Search the index.
    ///
    /// A single query yields one hit list of at most `k` hits in
    /// non-increasing score order; a batch of N queries yields N hit lists
    /// in input order.
    pub async fn search(
        &self,
        query: impl Into<Query>,
        k: usize,
        include_metadata: bool,
    ) -> Result<SearchResult> {
        let query = query.into();
        let (single, many) = match &query {
            Query::One(q) => (Some(q.as_str()), None),
            Query::Many(qs) => (None, Some(qs.as_slice())),
        };

        let req = IndexSearchRequest {
            index_id: &self.id,
            query: single,
            queries: many,
            k,
            include_metadata,
        };

        post_expect(
            self.transport.as_ref(),
            "embedding-index/search",
            &req,
            self.space.as_ref(),
        )
        .await
    }

    /// Delete the index and all associated data server-side.
    ///
    /// The handle stays usable locally; further calls fail with the server's
    /// not-found status.
    pub async fn delete(&self) -> Result<()> {
        let req = IndexIdRequest { index_id: &self.id };
        let body = serde_json::to_value(&req)?;
        self.transport
            .post("embedding-index/delete", body, self.space.as_ref())
            .await?;
        tracing::debug!(index_id = %self.id, "deleted index");
        Ok(())
    }

    async fn post_task(&self, route: &str) -> Result<Task> {
        let req = IndexIdRequest { index_id: &self.id };
        let body = serde_json::to_value(&req)?;
        let envelope = self.transport.post(route, body, self.space.as_ref()).await?;

        let http_status = envelope.http_status;
        let status = envelope.status.ok_or_else(|| LodestoneError::Api {
            status: http_status,
            message: format!("asynchronous response for {} carried no status", route),
        })?;

        Task::from_status(self.transport.clone(), status, self.space.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_string_normalizes_to_item() {
        let input = InsertInput::from("hello");
        assert_eq!(input.into_item(), IndexItem::from_value("hello"));
    }

    #[test]
    fn test_insert_options_default_reindex() {
        assert!(InsertOptions::default().reindex);
        assert!(!InsertOptions::default().with_reindex(false).reindex);
    }

    #[test]
    fn test_create_params_default_upsert() {
        let params = CreateIndexParams::new("docs", "text-embedding");
        assert!(params.upsert);
    }

    #[test]
    fn test_search_request_single_query_shape() {
        let req = IndexSearchRequest {
            index_id: "idx-1",
            query: Some("hello"),
            queries: None,
            k: 2,
            include_metadata: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["indexId"], "idx-1");
        assert_eq!(json["query"], "hello");
        assert!(json.get("queries").is_none());
        assert_eq!(json["includeMetadata"], false);
    }
}
