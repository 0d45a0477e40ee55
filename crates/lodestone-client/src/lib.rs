//! Lodestone Client - typed access to the hosted embedding-index and plugin service
//!
//! The client is a thin marshaling layer: every operation composes a typed
//! request, posts it through the [`transport::ApiTransport`] port, and
//! decodes the typed response. All real work (embedding, nearest-neighbor
//! search, snapshots, training) happens server-side.

pub mod client;
pub mod index;
pub mod memory;
pub mod plugin;
pub mod task;
pub mod transport;

pub use client::Lodestone;
pub use index::{CreateIndexParams, EmbeddingIndex, InsertInput, InsertOptions, ItemFilter};
pub use plugin::{CreatePluginInstanceParams, PluginInstance};
pub use task::Task;
pub use transport::{ApiEnvelope, ApiTransport, HttpTransport};
