//! In-memory transport for development and testing.
//!
//! A small fake service behind the [`ApiTransport`] port. It honors the
//! observable contract of each route (identifier assignment, not-found
//! statuses, ranked hit lists, item filtering) without any real embedding;
//! relevance is plain token overlap, with an exact match pinned to 1.0.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use lodestone_core::error::{LodestoneError, Result};
use lodestone_core::models::{
    IndexItem, Snapshot, Space, TaskState, TaskStatus, TrainingParameters,
};

use crate::transport::{ApiEnvelope, ApiTransport};

#[derive(Debug, Clone, Default)]
struct IndexRecord {
    name: String,
    items: Vec<IndexItem>,
}

/// In-memory implementation of [`ApiTransport`].
#[derive(Clone, Default)]
pub struct MemoryTransport {
    indexes: Arc<RwLock<HashMap<String, IndexRecord>>>,
    index_ids_by_name: Arc<RwLock<HashMap<String, String>>>,
    snapshots: Arc<RwLock<HashMap<String, Snapshot>>>,
    /// task id -> polls remaining before the task reports success
    tasks: Arc<RwLock<HashMap<String, u32>>>,
    /// instance id -> plugin handle
    instances: Arc<RwLock<HashMap<String, String>>>,
    training_parameters: Arc<RwLock<TrainingParameters>>,
    task_latency: Arc<RwLock<u32>>,
    fail_tasks: Arc<RwLock<bool>>,
    /// Workspace selector attached to the most recent request
    last_space: Arc<RwLock<Option<Space>>>,
    next_id: Arc<RwLock<u64>>,
}

impl MemoryTransport {
    /// Create a new in-memory transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every new task stay in flight for `polls` status checks before
    /// reporting success. Default is zero: the first poll succeeds.
    pub fn with_task_latency(self, polls: u32) -> Self {
        *self.task_latency.write().unwrap() = polls;
        self
    }

    /// Make every task report failure once it leaves the in-flight state.
    pub fn with_failing_tasks(self) -> Self {
        *self.fail_tasks.write().unwrap() = true;
        self
    }

    /// Configure the parameters a trainable instance reports.
    pub fn set_training_parameters(&self, params: TrainingParameters) {
        *self.training_parameters.write().unwrap() = params;
    }

    /// Workspace selector the most recent request carried, if any.
    pub fn last_space(&self) -> Option<Space> {
        self.last_space.read().unwrap().clone()
    }

    fn mint_id(&self, prefix: &str) -> String {
        let mut next_id = self.next_id.write().unwrap();
        *next_id += 1;
        format!("{}-{}", prefix, next_id)
    }

    fn not_found(what: &str, id: &str) -> LodestoneError {
        LodestoneError::Api {
            status: 404,
            message: format!("{} {} not found", what, id),
        }
    }

    fn bad_request(message: impl Into<String>) -> LodestoneError {
        LodestoneError::Api {
            status: 400,
            message: message.into(),
        }
    }

    fn data(value: Value) -> Result<ApiEnvelope> {
        Ok(ApiEnvelope {
            data: Some(value),
            status: None,
            http_status: 200,
        })
    }

    fn require_index(&self, body: &Value) -> Result<String> {
        let index_id = str_field(body, "indexId")
            .ok_or_else(|| Self::bad_request("indexId is required"))?;
        if !self.indexes.read().unwrap().contains_key(&index_id) {
            return Err(Self::not_found("Index", &index_id));
        }
        Ok(index_id)
    }

    fn start_task(&self) -> Result<ApiEnvelope> {
        let task_id = self.mint_id("task");
        let latency = *self.task_latency.read().unwrap();
        self.tasks.write().unwrap().insert(task_id.clone(), latency);

        Ok(ApiEnvelope {
            data: None,
            status: Some(TaskStatus {
                task_id: Some(task_id),
                state: TaskState::Waiting,
                status_message: None,
            }),
            http_status: 200,
        })
    }

    fn index_create(&self, body: &Value) -> Result<ApiEnvelope> {
        let name =
            str_field(body, "name").ok_or_else(|| Self::bad_request("name is required"))?;
        let upsert = body.get("upsert").and_then(Value::as_bool).unwrap_or(true);

        if upsert {
            if let Some(existing) = self.index_ids_by_name.read().unwrap().get(&name) {
                return Self::data(json!({ "id": existing }));
            }
        }

        let id = self.mint_id("idx");
        self.indexes.write().unwrap().insert(
            id.clone(),
            IndexRecord {
                name: name.clone(),
                items: Vec::new(),
            },
        );
        self.index_ids_by_name.write().unwrap().insert(name, id.clone());

        Self::data(json!({ "id": id }))
    }

    fn index_insert(&self, body: &Value) -> Result<ApiEnvelope> {
        let index_id = self.require_index(body)?;

        let mut incoming: Vec<IndexItem> = if let Some(items) = body.get("items") {
            serde_json::from_value(items.clone())
                .map_err(|e| Self::bad_request(format!("malformed items: {}", e)))?
        } else if body.get("value").is_some() || body.get("fileId").is_some() {
            // blockType is an expansion hint for the real service, not an
            // item identifier; the fake keeps the file reference as one item.
            let item = IndexItem {
                value: str_field(body, "value"),
                file_id: str_field(body, "fileId"),
                external_id: str_field(body, "externalId"),
                external_type: str_field(body, "externalType"),
                metadata: body.get("metadata").cloned(),
                ..Default::default()
            };
            vec![item]
        } else {
            return Err(Self::bad_request("either value, fileId, or items is required"));
        };

        let mut item_ids = Vec::with_capacity(incoming.len());
        for item in &mut incoming {
            item.id = Some(self.mint_id("item"));
            item_ids.push(item.id.clone().unwrap_or_default());
        }

        let mut indexes = self.indexes.write().unwrap();
        let record = indexes
            .get_mut(&index_id)
            .ok_or_else(|| Self::not_found("Index", &index_id))?;
        record.items.extend(incoming);

        Self::data(json!({ "itemIds": item_ids }))
    }

    fn index_search(&self, body: &Value) -> Result<ApiEnvelope> {
        let index_id = self.require_index(body)?;

        let queries: Vec<String> = if let Some(q) = str_field(body, "query") {
            vec![q]
        } else if let Some(qs) = body.get("queries").and_then(Value::as_array) {
            qs.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        } else {
            return Err(Self::bad_request("either query or queries is required"));
        };

        let k = body.get("k").and_then(Value::as_u64).unwrap_or(1) as usize;
        let include_metadata = body
            .get("includeMetadata")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let indexes = self.indexes.read().unwrap();
        let record = indexes
            .get(&index_id)
            .ok_or_else(|| Self::not_found("Index", &index_id))?;

        let hit_lists: Vec<Value> = queries
            .iter()
            .map(|query| {
                let mut scored: Vec<(f64, &IndexItem)> = record
                    .items
                    .iter()
                    .filter_map(|item| {
                        let value = item.value.as_deref()?;
                        Some((relevance(query, value), item))
                    })
                    .collect();

                // Stable sort keeps insertion order among equal scores
                scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
                scored.truncate(k);

                let hits: Vec<Value> = scored
                    .into_iter()
                    .map(|(score, item)| {
                        let mut hit = json!({
                            "score": score,
                            "value": item.value,
                        });
                        if let Some(external_id) = &item.external_id {
                            hit["externalId"] = json!(external_id);
                        }
                        if let Some(external_type) = &item.external_type {
                            hit["externalType"] = json!(external_type);
                        }
                        if include_metadata {
                            if let Some(metadata) = &item.metadata {
                                hit["metadata"] = metadata.clone();
                            }
                        }
                        hit
                    })
                    .collect();
                Value::Array(hits)
            })
            .collect();

        Self::data(json!({ "hits": hit_lists }))
    }

    fn index_list_items(&self, body: &Value) -> Result<ApiEnvelope> {
        let index_id = self.require_index(body)?;

        let file_id = str_field(body, "fileId");
        let block_id = str_field(body, "blockId");
        let span_id = str_field(body, "spanId");

        let indexes = self.indexes.read().unwrap();
        let record = indexes
            .get(&index_id)
            .ok_or_else(|| Self::not_found("Index", &index_id))?;

        let items: Vec<&IndexItem> = record
            .items
            .iter()
            .filter(|item| {
                matches_filter(&file_id, &item.file_id)
                    && matches_filter(&block_id, &item.block_id)
                    && matches_filter(&span_id, &item.span_id)
            })
            .collect();

        Self::data(json!({ "items": items }))
    }

    fn index_delete(&self, body: &Value) -> Result<ApiEnvelope> {
        let index_id = self.require_index(body)?;

        let record = self.indexes.write().unwrap().remove(&index_id);
        if let Some(record) = record {
            self.index_ids_by_name.write().unwrap().remove(&record.name);
        }
        self.snapshots
            .write()
            .unwrap()
            .retain(|_, snapshot| snapshot.index_id.as_deref() != Some(&index_id));

        Self::data(json!({}))
    }

    fn snapshot_create(&self, body: &Value) -> Result<ApiEnvelope> {
        let index_id = self.require_index(body)?;

        let snapshot_id = self.mint_id("snap");
        self.snapshots.write().unwrap().insert(
            snapshot_id.clone(),
            Snapshot {
                snapshot_id,
                index_id: Some(index_id),
                created_at: Some(Utc::now()),
            },
        );

        self.start_task()
    }

    fn snapshot_list(&self, body: &Value) -> Result<ApiEnvelope> {
        let index_id = self.require_index(body)?;

        let snapshots = self.snapshots.read().unwrap();
        let mut listed: Vec<&Snapshot> = snapshots
            .values()
            .filter(|snapshot| snapshot.index_id.as_deref() == Some(&index_id))
            .collect();
        listed.sort_by(|a, b| a.snapshot_id.cmp(&b.snapshot_id));

        Self::data(json!({ "snapshots": listed }))
    }

    fn snapshot_delete(&self, body: &Value) -> Result<ApiEnvelope> {
        let snapshot_id = str_field(body, "snapshotId")
            .ok_or_else(|| Self::bad_request("snapshotId is required"))?;

        if self.snapshots.write().unwrap().remove(&snapshot_id).is_none() {
            return Err(Self::not_found("Snapshot", &snapshot_id));
        }

        Self::data(json!({}))
    }

    fn task_status(&self, body: &Value) -> Result<ApiEnvelope> {
        let task_id = str_field(body, "taskId")
            .ok_or_else(|| Self::bad_request("taskId is required"))?;

        let mut tasks = self.tasks.write().unwrap();
        let remaining = tasks
            .get_mut(&task_id)
            .ok_or_else(|| Self::not_found("Task", &task_id))?;

        let (state, status_message) = if *remaining > 0 {
            *remaining -= 1;
            (TaskState::Running, None)
        } else if *self.fail_tasks.read().unwrap() {
            (TaskState::Failed, Some("task failed".to_string()))
        } else {
            (TaskState::Succeeded, None)
        };

        Ok(ApiEnvelope {
            data: None,
            status: Some(TaskStatus {
                task_id: Some(task_id),
                state,
                status_message,
            }),
            http_status: 200,
        })
    }

    fn instance_create(&self, body: &Value) -> Result<ApiEnvelope> {
        let plugin_handle = str_field(body, "pluginHandle")
            .ok_or_else(|| Self::bad_request("pluginHandle is required"))?;
        let handle = str_field(body, "handle").unwrap_or_else(|| plugin_handle.clone());

        let id = self.mint_id("pin");
        self.instances
            .write()
            .unwrap()
            .insert(id.clone(), plugin_handle);

        Self::data(json!({ "id": id, "handle": handle }))
    }

    fn require_instance(&self, body: &Value) -> Result<String> {
        let instance_id = str_field(body, "instanceId")
            .ok_or_else(|| Self::bad_request("instanceId is required"))?;
        if !self.instances.read().unwrap().contains_key(&instance_id) {
            return Err(Self::not_found("Plugin instance", &instance_id));
        }
        Ok(instance_id)
    }

    fn instance_tag(&self, body: &Value) -> Result<ApiEnvelope> {
        self.require_instance(body)?;
        let text =
            str_field(body, "text").ok_or_else(|| Self::bad_request("text is required"))?;

        Self::data(json!({
            "tags": [{ "kind": "text", "name": text, "startIdx": 0, "endIdx": text.len() }]
        }))
    }

    fn instance_training_parameters(&self, body: &Value) -> Result<ApiEnvelope> {
        self.require_instance(body)?;
        let params = self.training_parameters.read().unwrap().clone();
        Self::data(serde_json::to_value(params)?)
    }

    fn instance_train(&self, body: &Value) -> Result<ApiEnvelope> {
        self.require_instance(body)?;
        self.start_task()
    }

    fn instance_delete(&self, body: &Value) -> Result<ApiEnvelope> {
        let instance_id = self.require_instance(body)?;
        self.instances.write().unwrap().remove(&instance_id);
        Self::data(json!({}))
    }
}

#[async_trait]
impl ApiTransport for MemoryTransport {
    async fn post(&self, route: &str, body: Value, space: Option<&Space>) -> Result<ApiEnvelope> {
        *self.last_space.write().unwrap() = space.cloned();

        match route {
            "embedding-index/create" => self.index_create(&body),
            "embedding-index/insert" => self.index_insert(&body),
            "embedding-index/search" => self.index_search(&body),
            "embedding-index/listItems" => self.index_list_items(&body),
            "embedding-index/delete" => self.index_delete(&body),
            "embedding-index/embed" => {
                self.require_index(&body)?;
                self.start_task()
            }
            "embedding-index/snapshot/create" => self.snapshot_create(&body),
            "embedding-index/snapshot/list" => self.snapshot_list(&body),
            "embedding-index/snapshot/delete" => self.snapshot_delete(&body),
            "task/status" => self.task_status(&body),
            "plugin/instance/create" => self.instance_create(&body),
            "plugin/instance/tag" => self.instance_tag(&body),
            "plugin/instance/getTrainingParameters" => self.instance_training_parameters(&body),
            "plugin/instance/train" => self.instance_train(&body),
            "plugin/instance/delete" => self.instance_delete(&body),
            _ => Err(LodestoneError::Api {
                status: 404,
                message: format!("no such route: {}", route),
            }),
        }
    }
}

fn str_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(String::from)
}

fn matches_filter(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        Some(wanted) => actual.as_deref() == Some(wanted.as_str()),
        None => true,
    }
}

/// Token-overlap relevance, with an exact match pinned above everything.
fn relevance(query: &str, value: &str) -> f64 {
    if query == value {
        return 1.0;
    }

    let query_tokens: HashSet<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();
    let value_tokens: HashSet<String> = value
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();

    if query_tokens.is_empty() || value_tokens.is_empty() {
        return 0.0;
    }

    let intersection = query_tokens.intersection(&value_tokens).count() as f64;
    let union = query_tokens.union(&value_tokens).count() as f64;
    0.99 * intersection / union
}
