//! Handle for a hosted plugin instance (tagger or trainer).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use lodestone_core::error::{LodestoneError, Result};
use lodestone_core::models::{Space, TagResult, TrainingParameters};

use crate::task::Task;
use crate::transport::{post_expect, ApiTransport};

/// Parameters for instantiating a deployed plugin.
#[derive(Debug, Clone)]
pub struct CreatePluginInstanceParams {
    /// Handle of the deployed plugin to instantiate.
    pub plugin_handle: String,
    /// Optional handle for the instance itself.
    pub handle: Option<String>,
    /// Plugin-specific configuration, passed through verbatim.
    pub config: Option<Value>,
}

impl CreatePluginInstanceParams {
    pub fn new(plugin_handle: impl Into<String>) -> Self {
        Self {
            plugin_handle: plugin_handle.into(),
            handle: None,
            config: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }
}

/// A reference to a server-side plugin instance.
pub struct PluginInstance {
    transport: Arc<dyn ApiTransport>,
    pub id: String,
    pub handle: Option<String>,
    space: Option<Space>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceCreateRequest<'a> {
    plugin_handle: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceCreateResponse {
    id: String,
    #[serde(default)]
    handle: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceIdRequest<'a> {
    instance_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TagRequest<'a> {
    instance_id: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrainRequest<'a> {
    instance_id: &'a str,
    params: &'a TrainingParameters,
}

impl PluginInstance {
    pub(crate) fn new(
        transport: Arc<dyn ApiTransport>,
        id: String,
        handle: Option<String>,
        space: Option<Space>,
    ) -> Self {
        Self {
            transport,
            id,
            handle,
            space,
        }
    }

    /// Instantiate a deployed plugin and return a handle to the instance.
    pub async fn create(
        transport: Arc<dyn ApiTransport>,
        params: CreatePluginInstanceParams,
        space: Option<Space>,
    ) -> Result<Self> {
        let req = InstanceCreateRequest {
            plugin_handle: &params.plugin_handle,
            handle: params.handle.as_deref(),
            config: params.config.as_ref(),
        };

        let res: InstanceCreateResponse = post_expect(
            transport.as_ref(),
            "plugin/instance/create",
            &req,
            space.as_ref(),
        )
        .await?;

        tracing::debug!(instance_id = %res.id, plugin = %params.plugin_handle, "created plugin instance");

        Ok(Self::new(transport, res.id, res.handle, space))
    }

    /// Invoke a tagger instance on a piece of text.
    pub async fn tag(&self, text: &str) -> Result<TagResult> {
        let req = TagRequest {
            instance_id: &self.id,
            text,
        };
        post_expect(
            self.transport.as_ref(),
            "plugin/instance/tag",
            &req,
            self.space.as_ref(),
        )
        .await
    }

    /// Ask a trainable instance to report its training parameters.
    pub async fn get_training_parameters(&self) -> Result<TrainingParameters> {
        let req = InstanceIdRequest {
            instance_id: &self.id,
        };
        post_expect(
            self.transport.as_ref(),
            "plugin/instance/getTrainingParameters",
            &req,
            self.space.as_ref(),
        )
        .await
    }

    /// Start a training job on a trainable instance.
    pub async fn train(&self, params: &TrainingParameters) -> Result<Task> {
        let req = TrainRequest {
            instance_id: &self.id,
            params,
        };
        let body = serde_json::to_value(&req)?;
        let envelope = self
            .transport
            .post("plugin/instance/train", body, self.space.as_ref())
            .await?;

        let http_status = envelope.http_status;
        let status = envelope.status.ok_or_else(|| LodestoneError::Api {
            status: http_status,
            message: "train response carried no status".to_string(),
        })?;

        Task::from_status(self.transport.clone(), status, self.space.clone())
    }

    /// Delete the instance server-side.
    pub async fn delete(&self) -> Result<()> {
        let req = InstanceIdRequest {
            instance_id: &self.id,
        };
        let body = serde_json::to_value(&req)?;
        self.transport
            .post("plugin/instance/delete", body, self.space.as_ref())
            .await?;
        Ok(())
    }
}
