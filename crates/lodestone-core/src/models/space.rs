//! Workspace scoping.

use serde::{Deserialize, Serialize};

/// Selector for the logical workspace an operation is scoped to.
///
/// The service accepts either the workspace's server-assigned id or its
/// human-chosen handle; a call never needs both. When no selector is given
/// the service uses the API key's current workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Space {
    Id(String),
    Handle(String),
}

impl Space {
    pub fn id(id: impl Into<String>) -> Self {
        Space::Id(id.into())
    }

    pub fn handle(handle: impl Into<String>) -> Self {
        Space::Handle(handle.into())
    }
}
