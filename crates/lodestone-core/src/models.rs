//! Wire-level value objects for the Lodestone API.
//!
//! Every entity here mirrors a JSON payload. Identifiers are opaque strings
//! assigned by the server; local objects cache identifiers only and hold no
//! authoritative state.

pub mod index;
pub mod metadata;
pub mod plugin;
pub mod space;
pub mod task;

pub use index::{
    IndexItem, InsertResult, Query, SearchHit, SearchResult, Snapshot,
};
pub use metadata::Metadata;
pub use plugin::{Tag, TagResult, TrainingParameters};
pub use space::Space;
pub use task::{TaskState, TaskStatus};
