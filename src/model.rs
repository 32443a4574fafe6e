//! Graph model access for the plan pipeline.
//!
//! - [`store`]: the traits the validator and executor are written against
//! - [`memory`]: a JSON-backed implementation used by the CLI and tests
//! - [`types`]: records exchanged through the traits
mod memory;
mod store;
mod types;

pub use memory::MemoryModel;
pub use store::{
    EntityStore, FolderStore, ModelStore, StoreError, StoreResult, ViewStore,
};
pub use types::{
    Bounds, Element, EntityInfo, EntityKind, Folder, FolderRef, Relationship, View,
    VisualConnection, VisualObject,
};
