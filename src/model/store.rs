//! Narrow interfaces onto the host model.
//!
//! The plan pipeline never touches the host model directly; it goes through
//! these traits so each concern can be faked independently in tests.
use super::types::{Bounds, EntityInfo, FolderRef, Relationship, VisualConnection, VisualObject};
use crate::archimate::{ElementType, RelationshipType};
use std::collections::BTreeSet;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("view not found: {0}")]
    ViewNotFound(String),

    #[error("folder not found: {0}")]
    FolderNotFound(String),

    #[error("visual object {visual} is not on view {view}")]
    VisualNotOnView { view: String, visual: String },

    #[error("{id} is a {actual}, expected {expected}")]
    WrongKind {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("cannot delete {id}: {count} relationship(s) still attached")]
    StillConnected { id: String, count: usize },
}

/// Element and relationship lookup and mutation.
pub trait EntityStore {
    fn entity(&self, id: &str) -> Option<EntityInfo>;

    fn create_element(&mut self, element_type: ElementType, name: &str) -> StoreResult<String>;

    fn create_relationship(
        &mut self,
        relationship_type: RelationshipType,
        source: &str,
        target: &str,
        name: &str,
    ) -> StoreResult<String>;

    fn rename(&mut self, id: &str, name: &str) -> StoreResult<()>;

    fn property(&self, id: &str, key: &str) -> Option<String>;

    fn set_property(&mut self, id: &str, key: &str, value: &str) -> StoreResult<()>;

    /// Returns whether the key was present.
    fn remove_property(&mut self, id: &str, key: &str) -> StoreResult<bool>;

    fn set_documentation(&mut self, id: &str, documentation: &str) -> StoreResult<()>;

    /// Ids of relationships whose source or target is `id`.
    fn attached_relationships(&self, id: &str) -> Vec<String>;

    fn relationships(&self) -> Vec<Relationship>;

    /// Relationships that must go before `id` can be deleted: those attached
    /// to it and, transitively, those attached to them. Deepest come first so
    /// deleting in order never hits a still-connected relationship.
    fn cascade_relationships(&self, id: &str) -> Vec<String> {
        let mut seen = BTreeSet::from([id.to_string()]);
        let mut ordered = Vec::new();
        collect_cascade(self, id, &mut seen, &mut ordered);
        ordered
    }

    /// Delete a single entity. Callers cascade relationships first.
    fn delete(&mut self, id: &str) -> StoreResult<()>;
}

fn collect_cascade<S: EntityStore + ?Sized>(
    store: &S,
    id: &str,
    seen: &mut BTreeSet<String>,
    ordered: &mut Vec<String>,
) {
    for rel in store.attached_relationships(id) {
        if seen.insert(rel.clone()) {
            collect_cascade(store, &rel, seen, ordered);
            ordered.push(rel);
        }
    }
}

/// Views and their visual contents.
pub trait ViewStore {
    fn create_view(&mut self, name: &str) -> StoreResult<String>;

    /// Place an entity on a view, returning the visual object id.
    fn add_to_view(&mut self, view_id: &str, entity_id: &str, bounds: Bounds)
        -> StoreResult<String>;

    /// Draw a relationship between two visual objects on the same view.
    fn connect_in_view(
        &mut self,
        view_id: &str,
        relationship_id: &str,
        source_visual: &str,
        target_visual: &str,
    ) -> StoreResult<String>;

    fn view_children(&self, view_id: &str) -> StoreResult<Vec<VisualObject>>;

    fn view_connections(&self, view_id: &str) -> StoreResult<Vec<VisualConnection>>;
}

/// Folder tree navigation.
pub trait FolderStore {
    fn top_level_folders(&self) -> Vec<FolderRef>;

    fn child_folders(&self, folder_id: &str) -> StoreResult<Vec<FolderRef>>;

    /// Reparent an entity into `folder_id`, removing it from its old folder.
    fn move_to_folder(&mut self, folder_id: &str, entity_id: &str) -> StoreResult<()>;
}

/// Everything the executor needs from the host.
pub trait ModelStore: EntityStore + ViewStore + FolderStore {}

impl<T: EntityStore + ViewStore + FolderStore> ModelStore for T {}
