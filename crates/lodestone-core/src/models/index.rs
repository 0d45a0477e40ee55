//! Embedding-index entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::metadata::Metadata;

/// A unit of insertable content.
///
/// Either raw text (`value`) or a reference to previously uploaded content
/// (`file_id` / `block_id` / `span_id`), plus optional external identity and
/// metadata. The `metadata` field holds the wire encoding; use
/// [`IndexItem::decoded_metadata`] to recover the structured form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl IndexItem {
    /// Item carrying raw text.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Item referencing an uploaded file.
    pub fn from_file(file_id: impl Into<String>) -> Self {
        Self {
            file_id: Some(file_id.into()),
            ..Default::default()
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_external_type(mut self, external_type: impl Into<String>) -> Self {
        self.external_type = Some(external_type.into());
        self
    }

    /// Attach metadata, applying the wire encoding.
    pub fn with_metadata(mut self, metadata: Metadata) -> Result<Self> {
        self.metadata = Some(metadata.to_wire()?);
        Ok(self)
    }

    /// Decode the metadata field back into its structured form.
    pub fn decoded_metadata(&self) -> Result<Option<Metadata>> {
        self.metadata.as_ref().map(Metadata::from_wire).transpose()
    }

    /// Copy for transmission: the server assigns ids, so any locally cached
    /// id is dropped from the outgoing payload.
    pub fn clone_for_insert(&self) -> Self {
        let mut item = self.clone();
        item.id = None;
        item
    }
}

/// Acknowledgment of an insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    /// Server-assigned ids of the inserted items, when reported.
    #[serde(default)]
    pub item_ids: Vec<String>,
}

/// An immutable, named point-in-time capture of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub snapshot_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One ranked match from a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub score: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl SearchHit {
    /// Decode the metadata field back into its structured form.
    pub fn decoded_metadata(&self) -> Result<Option<Metadata>> {
        self.metadata.as_ref().map(Metadata::from_wire).transpose()
    }
}

/// Ranked hit lists, one per input query, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub hits: Vec<Vec<SearchHit>>,
}

impl SearchResult {
    /// Hit list for a single-query search.
    pub fn single(&self) -> &[SearchHit] {
        self.hits.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A search input: one query text or a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    One(String),
    Many(Vec<String>),
}

impl Query {
    /// Number of hit lists the response must contain.
    pub fn len(&self) -> usize {
        match self {
            Query::One(_) => 1,
            Query::Many(queries) => queries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Query {
    fn from(q: &str) -> Self {
        Query::One(q.to_string())
    }
}

impl From<String> for Query {
    fn from(q: String) -> Self {
        Query::One(q)
    }
}

impl From<Vec<String>> for Query {
    fn from(queries: Vec<String>) -> Self {
        Query::Many(queries)
    }
}

impl From<Vec<&str>> for Query {
    fn from(queries: Vec<&str>) -> Self {
        Query::Many(queries.into_iter().map(String::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_for_insert_drops_id() {
        let item = IndexItem {
            id: Some("item-1".to_string()),
            ..IndexItem::from_value("hello")
        };
        let outgoing = item.clone_for_insert();
        assert!(outgoing.id.is_none());
        assert_eq!(outgoing.value.as_deref(), Some("hello"));
    }

    #[test]
    fn test_item_metadata_round_trip() {
        let meta = Metadata::from(vec!["a", "b"]);
        let item = IndexItem::from_value("x").with_metadata(meta.clone()).unwrap();
        assert_eq!(item.decoded_metadata().unwrap(), Some(meta));
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = IndexItem::from_file("file-9").with_external_id("ext");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["fileId"], "file-9");
        assert_eq!(json["externalId"], "ext");
        assert!(json.get("blockId").is_none());
    }

    #[test]
    fn test_query_len() {
        assert_eq!(Query::from("a").len(), 1);
        assert_eq!(Query::from(vec!["a", "b", "c"]).len(), 3);
    }
}
