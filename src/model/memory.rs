//! In-memory model backed by a JSON file.
//!
//! This is the stand-in host used by the CLI and by tests. Ids are allocated
//! from a counter so runs are deterministic for a given starting file.
use super::store::{EntityStore, FolderStore, StoreError, StoreResult, ViewStore};
use super::types::{
    Bounds, Element, EntityInfo, EntityKind, Folder, FolderRef, Relationship, View,
    VisualConnection, VisualObject,
};
use crate::archimate::{ElementType, Layer, RelationshipType};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

const DEFAULT_FOLDERS: &[(&str, &str)] = &[
    ("folder-strategy", "Strategy"),
    ("folder-business", "Business"),
    ("folder-application", "Application"),
    ("folder-technology", "Technology & Physical"),
    ("folder-motivation", "Motivation"),
    ("folder-implementation", "Implementation & Migration"),
    ("folder-other", "Other"),
    ("folder-relations", "Relations"),
    ("folder-views", "Views"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub next_id: u64,
}

impl MemoryModel {
    /// Empty model with the standard top-level folders.
    pub fn new(name: &str) -> Self {
        let folders = DEFAULT_FOLDERS
            .iter()
            .map(|(id, name)| Folder {
                id: id.to_string(),
                name: name.to_string(),
                folders: Vec::new(),
                members: Vec::new(),
            })
            .collect();
        Self {
            name: name.to_string(),
            folders,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read model {}", path.display()))?;
        let model: MemoryModel = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse model JSON {}", path.display()))?;
        Ok(model)
    }

    /// Write the model through a sibling temp file so a failed write never
    /// truncates an existing model.
    pub fn write(&self, path: &Path) -> Result<()> {
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create parent dir {}", parent.display()))?;
                parent
            }
            None => Path::new("."),
        };
        let text = serde_json::to_string_pretty(self).context("serialize model")?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        tmp.write_all(text.as_bytes())
            .with_context(|| format!("write {}", tmp.path().display()))?;
        tmp.persist(path)
            .with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|rel| rel.id == id)
    }

    pub fn view(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|view| view.id == id)
    }

    /// Id of the folder directly containing `entity_id`.
    pub fn folder_of(&self, entity_id: &str) -> Option<&str> {
        fn search<'a>(folders: &'a [Folder], entity_id: &str) -> Option<&'a str> {
            folders.iter().find_map(|folder| {
                if folder.members.iter().any(|member| member == entity_id) {
                    Some(folder.id.as_str())
                } else {
                    search(&folder.folders, entity_id)
                }
            })
        }
        search(&self.folders, entity_id)
    }

    /// Add a child folder, mostly for building fixtures.
    pub fn add_folder(&mut self, parent_id: &str, name: &str) -> StoreResult<String> {
        let id = self.allocate_id("folder");
        let parent = find_folder_mut(&mut self.folders, parent_id)
            .ok_or_else(|| StoreError::FolderNotFound(parent_id.to_string()))?;
        parent.folders.push(Folder {
            id: id.clone(),
            name: name.to_string(),
            folders: Vec::new(),
            members: Vec::new(),
        });
        Ok(id)
    }

    fn allocate_id(&mut self, prefix: &str) -> String {
        loop {
            self.next_id += 1;
            let candidate = format!("{prefix}-{}", self.next_id);
            if !self.id_taken(&candidate) {
                return candidate;
            }
        }
    }

    fn id_taken(&self, id: &str) -> bool {
        self.element(id).is_some()
            || self.relationship(id).is_some()
            || self.view(id).is_some()
            || self.views.iter().any(|view| {
                view.children.iter().any(|child| child.id == id)
                    || view.connections.iter().any(|conn| conn.id == id)
            })
            || find_folder(&self.folders, id).is_some()
    }

    fn file_into_default_folder(&mut self, folder_id: &str, entity_id: &str) {
        if let Some(folder) = find_folder_mut(&mut self.folders, folder_id) {
            folder.members.push(entity_id.to_string());
        }
    }

    fn properties_mut(&mut self, id: &str) -> StoreResult<&mut BTreeMap<String, String>> {
        if let Some(element) = self.elements.iter_mut().find(|e| e.id == id) {
            return Ok(&mut element.properties);
        }
        if let Some(rel) = self.relationships.iter_mut().find(|r| r.id == id) {
            return Ok(&mut rel.properties);
        }
        if let Some(view) = self.views.iter_mut().find(|v| v.id == id) {
            return Ok(&mut view.properties);
        }
        Err(StoreError::NotFound(id.to_string()))
    }

    fn view_mut(&mut self, id: &str) -> StoreResult<&mut View> {
        self.views
            .iter_mut()
            .find(|view| view.id == id)
            .ok_or_else(|| StoreError::ViewNotFound(id.to_string()))
    }

    fn require_endpoint(&self, id: &str) -> StoreResult<()> {
        match self.entity(id) {
            Some(info) if info.kind == EntityKind::View => Err(StoreError::WrongKind {
                id: id.to_string(),
                expected: "element or relationship",
                actual: "view",
            }),
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }
}

fn default_folder_id(element_type: ElementType) -> &'static str {
    match element_type.layer() {
        Layer::Strategy => "folder-strategy",
        Layer::Business => "folder-business",
        Layer::Application => "folder-application",
        Layer::Technology | Layer::Physical => "folder-technology",
        Layer::Motivation => "folder-motivation",
        Layer::Implementation => "folder-implementation",
        Layer::Other => "folder-other",
    }
}

fn find_folder<'a>(folders: &'a [Folder], id: &str) -> Option<&'a Folder> {
    folders.iter().find_map(|folder| {
        if folder.id == id {
            Some(folder)
        } else {
            find_folder(&folder.folders, id)
        }
    })
}

fn find_folder_mut<'a>(folders: &'a mut [Folder], id: &str) -> Option<&'a mut Folder> {
    for folder in folders.iter_mut() {
        if folder.id == id {
            return Some(folder);
        }
        if let Some(found) = find_folder_mut(&mut folder.folders, id) {
            return Some(found);
        }
    }
    None
}

fn remove_member(folders: &mut [Folder], entity_id: &str) {
    for folder in folders.iter_mut() {
        folder.members.retain(|member| member != entity_id);
        remove_member(&mut folder.folders, entity_id);
    }
}

fn folder_ref(folder: &Folder) -> FolderRef {
    FolderRef {
        id: folder.id.clone(),
        name: folder.name.clone(),
    }
}

impl EntityStore for MemoryModel {
    fn entity(&self, id: &str) -> Option<EntityInfo> {
        if let Some(element) = self.element(id) {
            return Some(EntityInfo {
                id: element.id.clone(),
                name: element.name.clone(),
                kind: EntityKind::Element(element.element_type),
            });
        }
        if let Some(rel) = self.relationship(id) {
            return Some(EntityInfo {
                id: rel.id.clone(),
                name: rel.name.clone(),
                kind: EntityKind::Relationship(rel.relationship_type),
            });
        }
        self.view(id).map(|view| EntityInfo {
            id: view.id.clone(),
            name: view.name.clone(),
            kind: EntityKind::View,
        })
    }

    fn create_element(&mut self, element_type: ElementType, name: &str) -> StoreResult<String> {
        let id = self.allocate_id("element");
        self.elements.push(Element {
            id: id.clone(),
            element_type,
            name: name.to_string(),
            documentation: String::new(),
            properties: BTreeMap::new(),
        });
        self.file_into_default_folder(default_folder_id(element_type), &id);
        Ok(id)
    }

    fn create_relationship(
        &mut self,
        relationship_type: RelationshipType,
        source: &str,
        target: &str,
        name: &str,
    ) -> StoreResult<String> {
        self.require_endpoint(source)?;
        self.require_endpoint(target)?;
        let id = self.allocate_id("relationship");
        self.relationships.push(Relationship {
            id: id.clone(),
            relationship_type,
            name: name.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            documentation: String::new(),
            properties: BTreeMap::new(),
        });
        self.file_into_default_folder("folder-relations", &id);
        Ok(id)
    }

    fn rename(&mut self, id: &str, name: &str) -> StoreResult<()> {
        if let Some(element) = self.elements.iter_mut().find(|e| e.id == id) {
            element.name = name.to_string();
        } else if let Some(rel) = self.relationships.iter_mut().find(|r| r.id == id) {
            rel.name = name.to_string();
        } else {
            self.view_mut(id)
                .map_err(|_| StoreError::NotFound(id.to_string()))?
                .name = name.to_string();
        }
        Ok(())
    }

    fn property(&self, id: &str, key: &str) -> Option<String> {
        let properties = if let Some(element) = self.element(id) {
            &element.properties
        } else if let Some(rel) = self.relationship(id) {
            &rel.properties
        } else {
            &self.view(id)?.properties
        };
        properties.get(key).cloned()
    }

    fn set_property(&mut self, id: &str, key: &str, value: &str) -> StoreResult<()> {
        self.properties_mut(id)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_property(&mut self, id: &str, key: &str) -> StoreResult<bool> {
        Ok(self.properties_mut(id)?.remove(key).is_some())
    }

    fn set_documentation(&mut self, id: &str, documentation: &str) -> StoreResult<()> {
        if let Some(element) = self.elements.iter_mut().find(|e| e.id == id) {
            element.documentation = documentation.to_string();
        } else if let Some(rel) = self.relationships.iter_mut().find(|r| r.id == id) {
            rel.documentation = documentation.to_string();
        } else {
            self.view_mut(id)
                .map_err(|_| StoreError::NotFound(id.to_string()))?
                .documentation = documentation.to_string();
        }
        Ok(())
    }

    fn attached_relationships(&self, id: &str) -> Vec<String> {
        self.relationships
            .iter()
            .filter(|rel| rel.source == id || rel.target == id)
            .map(|rel| rel.id.clone())
            .collect()
    }

    fn relationships(&self) -> Vec<Relationship> {
        self.relationships.clone()
    }

    fn delete(&mut self, id: &str) -> StoreResult<()> {
        let kind = self
            .entity(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .kind;
        let attached = self.attached_relationships(id).len();
        if attached > 0 {
            return Err(StoreError::StillConnected {
                id: id.to_string(),
                count: attached,
            });
        }
        match kind {
            EntityKind::Element(_) => {
                self.elements.retain(|element| element.id != id);
                for view in &mut self.views {
                    let removed: Vec<String> = view
                        .children
                        .iter()
                        .filter(|child| child.entity_id == id)
                        .map(|child| child.id.clone())
                        .collect();
                    view.children.retain(|child| child.entity_id != id);
                    view.connections.retain(|conn| {
                        !removed.contains(&conn.source_visual)
                            && !removed.contains(&conn.target_visual)
                    });
                }
            }
            EntityKind::Relationship(_) => {
                self.relationships.retain(|rel| rel.id != id);
                for view in &mut self.views {
                    view.connections.retain(|conn| conn.relationship_id != id);
                }
            }
            EntityKind::View => {
                self.views.retain(|view| view.id != id);
            }
        }
        remove_member(&mut self.folders, id);
        Ok(())
    }
}

impl ViewStore for MemoryModel {
    fn create_view(&mut self, name: &str) -> StoreResult<String> {
        let id = self.allocate_id("view");
        self.views.push(View {
            id: id.clone(),
            name: name.to_string(),
            documentation: String::new(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            connections: Vec::new(),
        });
        self.file_into_default_folder("folder-views", &id);
        Ok(id)
    }

    fn add_to_view(
        &mut self,
        view_id: &str,
        entity_id: &str,
        bounds: Bounds,
    ) -> StoreResult<String> {
        let kind = self
            .entity(entity_id)
            .ok_or_else(|| StoreError::NotFound(entity_id.to_string()))?
            .kind;
        let actual = match kind {
            EntityKind::Element(_) => None,
            EntityKind::Relationship(_) => Some("relationship"),
            EntityKind::View => Some("view"),
        };
        if let Some(actual) = actual {
            return Err(StoreError::WrongKind {
                id: entity_id.to_string(),
                expected: "element",
                actual,
            });
        }
        if self.view(view_id).is_none() {
            return Err(StoreError::ViewNotFound(view_id.to_string()));
        }
        let id = self.allocate_id("visual");
        self.view_mut(view_id)?.children.push(VisualObject {
            id: id.clone(),
            entity_id: entity_id.to_string(),
            bounds,
        });
        Ok(id)
    }

    fn connect_in_view(
        &mut self,
        view_id: &str,
        relationship_id: &str,
        source_visual: &str,
        target_visual: &str,
    ) -> StoreResult<String> {
        if self.relationship(relationship_id).is_none() {
            return Err(StoreError::NotFound(relationship_id.to_string()));
        }
        let view = self
            .view(view_id)
            .ok_or_else(|| StoreError::ViewNotFound(view_id.to_string()))?;
        for visual in [source_visual, target_visual] {
            if !view.children.iter().any(|child| child.id == visual) {
                return Err(StoreError::VisualNotOnView {
                    view: view_id.to_string(),
                    visual: visual.to_string(),
                });
            }
        }
        let id = self.allocate_id("connection");
        self.view_mut(view_id)?.connections.push(VisualConnection {
            id: id.clone(),
            relationship_id: relationship_id.to_string(),
            source_visual: source_visual.to_string(),
            target_visual: target_visual.to_string(),
        });
        Ok(id)
    }

    fn view_children(&self, view_id: &str) -> StoreResult<Vec<VisualObject>> {
        self.view(view_id)
            .map(|view| view.children.clone())
            .ok_or_else(|| StoreError::ViewNotFound(view_id.to_string()))
    }

    fn view_connections(&self, view_id: &str) -> StoreResult<Vec<VisualConnection>> {
        self.view(view_id)
            .map(|view| view.connections.clone())
            .ok_or_else(|| StoreError::ViewNotFound(view_id.to_string()))
    }
}

impl FolderStore for MemoryModel {
    fn top_level_folders(&self) -> Vec<FolderRef> {
        self.folders.iter().map(folder_ref).collect()
    }

    fn child_folders(&self, folder_id: &str) -> StoreResult<Vec<FolderRef>> {
        find_folder(&self.folders, folder_id)
            .map(|folder| folder.folders.iter().map(folder_ref).collect())
            .ok_or_else(|| StoreError::FolderNotFound(folder_id.to_string()))
    }

    fn move_to_folder(&mut self, folder_id: &str, entity_id: &str) -> StoreResult<()> {
        if self.entity(entity_id).is_none() {
            return Err(StoreError::NotFound(entity_id.to_string()));
        }
        if find_folder(&self.folders, folder_id).is_none() {
            return Err(StoreError::FolderNotFound(folder_id.to_string()));
        }
        remove_member(&mut self.folders, entity_id);
        self.file_into_default_folder(folder_id, entity_id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
