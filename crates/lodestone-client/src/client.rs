//! Client facade.

use std::sync::Arc;

use lodestone_core::config::ClientConfig;
use lodestone_core::error::Result;
use lodestone_core::models::Space;

use crate::index::{CreateIndexParams, EmbeddingIndex};
use crate::plugin::{CreatePluginInstanceParams, PluginInstance};
use crate::task::Task;
use crate::transport::{ApiTransport, HttpTransport};

/// Entry point for talking to the service.
///
/// Holds the transport and the default workspace scope; handles created
/// through the facade inherit both.
pub struct Lodestone {
    transport: Arc<dyn ApiTransport>,
    default_space: Option<Space>,
}

impl Lodestone {
    /// Build a client over HTTP from resolved configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let default_space = config.space.value.clone().map(Space::Handle);
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self {
            transport,
            default_space,
        })
    }

    /// Build a client over any transport, e.g. the in-memory one.
    pub fn with_transport(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            default_space: None,
        }
    }

    /// Scope subsequently created handles to a workspace.
    pub fn with_default_space(mut self, space: Space) -> Self {
        self.default_space = Some(space);
        self
    }

    /// Create (or upsert) an index and return its handle.
    pub async fn create_index(&self, params: CreateIndexParams) -> Result<EmbeddingIndex> {
        EmbeddingIndex::create(self.transport.clone(), params, self.default_space.clone()).await
    }

    /// Handle to an existing index by id. No network call is made; a wrong
    /// id surfaces as not-found on first use.
    pub fn index(&self, id: impl Into<String>) -> EmbeddingIndex {
        EmbeddingIndex::new(
            self.transport.clone(),
            id.into(),
            None,
            self.default_space.clone(),
        )
    }

    /// Instantiate a deployed plugin.
    pub async fn create_plugin_instance(
        &self,
        params: CreatePluginInstanceParams,
    ) -> Result<PluginInstance> {
        PluginInstance::create(self.transport.clone(), params, self.default_space.clone()).await
    }

    /// Handle to an existing plugin instance by id. No network call is made.
    pub fn plugin_instance(&self, id: impl Into<String>) -> PluginInstance {
        PluginInstance::new(
            self.transport.clone(),
            id.into(),
            None,
            self.default_space.clone(),
        )
    }

    /// Attach to a task by id and fetch its current state.
    pub async fn task(&self, task_id: impl Into<String>) -> Result<Task> {
        let mut task = Task::attach(
            self.transport.clone(),
            task_id.into(),
            self.default_space.clone(),
        );
        task.refresh().await?;
        Ok(task)
    }
}
