//! Model records shared by the store traits and the in-memory model.
use crate::archimate::{ElementType, RelationshipType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub documentation: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub documentation: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// An entity placed on a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualObject {
    pub id: String,
    pub entity_id: String,
    pub bounds: Bounds,
}

/// A relationship drawn between two visual objects on a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualConnection {
    pub id: String,
    pub relationship_id: String,
    pub source_visual: String,
    pub target_visual: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub documentation: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<VisualObject>,
    #[serde(default)]
    pub connections: Vec<VisualConnection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Folder identity without its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRef {
    pub id: String,
    pub name: String,
}

/// What an id points at in the live model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Element(ElementType),
    Relationship(RelationshipType),
    View,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Element(ty) => ty.label(),
            EntityKind::Relationship(_) => "Relationship",
            EntityKind::View => "View",
        }
    }
}

/// Lightweight lookup result for any entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntityKind::Relationship(ty) => write!(f, "{ty} relationship '{}'", self.id),
            kind => write!(f, "\"{}\" [{}]", self.name, kind.label()),
        }
    }
}
