//! Apply-mode handlers, one per op.
use super::layout::GridCursor;
use super::Done;
use crate::model::{EntityKind, FolderStore, ModelStore};
use crate::oracle::{lookup_element_type, lookup_relationship_type, CompatibilityOracle};
use crate::plan::Action;
use anyhow::{anyhow, bail, Context, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Handles created during one apply run.
#[derive(Debug, Default)]
pub(super) struct ApplyContext {
    /// ref_id -> created element id
    element_refs: BTreeMap<String, String>,
    /// ref_id -> created view id
    view_refs: BTreeMap<String, String>,
    grid: GridCursor,
    pub(super) touched_views: BTreeSet<String>,
}

impl ApplyContext {
    /// Plan refs first, then the live model.
    fn resolve<S: ModelStore + ?Sized>(&self, store: &S, id: &str) -> Option<String> {
        if let Some(created) = self.element_refs.get(id).or_else(|| self.view_refs.get(id)) {
            return Some(created.clone());
        }
        store.entity(id).map(|info| info.id)
    }

    fn resolve_view<S: ModelStore + ?Sized>(&self, store: &S, id: &str) -> Result<String> {
        if let Some(created) = self.view_refs.get(id) {
            return Ok(created.clone());
        }
        match store.entity(id) {
            Some(info) if info.kind == EntityKind::View => Ok(info.id),
            Some(info) => bail!("{info} is not a view"),
            None => bail!("view '{id}' not found"),
        }
    }

    fn require<S: ModelStore + ?Sized>(&self, store: &S, id: &str) -> Result<String> {
        self.resolve(store, id)
            .ok_or_else(|| anyhow!("'{id}' not found"))
    }
}

pub(super) fn apply_action<S, O>(
    action: &Action,
    store: &mut S,
    oracle: &O,
    ctx: &mut ApplyContext,
) -> Result<Done>
where
    S: ModelStore + ?Sized,
    O: CompatibilityOracle + ?Sized,
{
    match action {
        Action::CreateElement {
            element_type,
            name,
            ref_id,
            documentation,
        } => {
            let ty = lookup_element_type(oracle, element_type)
                .ok_or_else(|| anyhow!("unknown element type '{element_type}'"))?;
            let id = store.create_element(ty, name)?;
            if let Some(documentation) = documentation.as_deref().filter(|d| !d.is_empty()) {
                store
                    .set_documentation(&id, documentation)
                    .context("set documentation on new element")?;
            }
            if let Some(ref_id) = ref_id {
                ctx.element_refs.insert(ref_id.clone(), id.clone());
            }
            Ok(Done::created(format!("Created {ty} \"{name}\""), id))
        }
        Action::RenameElement { id, name } => {
            let target = ctx.require(&*store, id)?;
            store.rename(&target, name)?;
            Ok(Done::new(format!("Renamed {target} to \"{name}\"")))
        }
        Action::DeleteElement { id } => {
            let target = ctx.require(&*store, id)?;
            let attached = store.cascade_relationships(&target);
            for rel in &attached {
                store
                    .delete(rel)
                    .with_context(|| format!("delete attached relationship {rel}"))?;
            }
            store.delete(&target)?;
            Ok(Done::new(format!(
                "Deleted {target} and {} attached relationship(s)",
                attached.len()
            )))
        }
        Action::SetProperty { id, key, value } => {
            let target = ctx.require(&*store, id)?;
            store.set_property(&target, key, value)?;
            Ok(Done::new(format!("Set {key} = \"{value}\" on {target}")))
        }
        Action::RemoveProperty { id, key } => {
            let target = ctx.require(&*store, id)?;
            let removed = store.remove_property(&target, key)?;
            let description = if removed {
                format!("Removed {key} from {target}")
            } else {
                format!("{key} was not set on {target}")
            };
            Ok(Done::new(description))
        }
        Action::SetDocumentation { id, documentation } => {
            let target = ctx.require(&*store, id)?;
            store.set_documentation(&target, documentation)?;
            Ok(Done::new(format!("Set documentation on {target}")))
        }
        Action::CreateRelationship {
            relationship_type,
            source_id,
            target_id,
            name,
        } => {
            let ty = lookup_relationship_type(oracle, relationship_type)
                .ok_or_else(|| anyhow!("unknown relationship type '{relationship_type}'"))?;
            let source = ctx
                .resolve(&*store, source_id)
                .ok_or_else(|| anyhow!("source '{source_id}' not found"))?;
            let target = ctx
                .resolve(&*store, target_id)
                .ok_or_else(|| anyhow!("target '{target_id}' not found"))?;
            let name = name.as_deref().unwrap_or("");
            let id = store.create_relationship(ty, &source, &target, name)?;
            Ok(Done::created(
                format!("Created {ty} relationship {source} -> {target}"),
                id,
            ))
        }
        Action::DeleteRelationship { id } => {
            match store.entity(id).map(|info| info.kind) {
                Some(EntityKind::Relationship(_)) => {}
                Some(kind) => bail!("'{id}' is not a relationship ({})", kind.label()),
                None => bail!("relationship '{id}' not found"),
            }
            store.delete(id)?;
            Ok(Done::new(format!("Deleted relationship {id}")))
        }
        Action::CreateView { name, ref_id } => {
            let id = store.create_view(name)?;
            if let Some(ref_id) = ref_id {
                ctx.view_refs.insert(ref_id.clone(), id.clone());
            }
            Ok(Done::created(format!("Created view \"{name}\""), id))
        }
        Action::AddToView {
            view_id,
            element_id,
            x,
            y,
            width,
            height,
        } => {
            let view = ctx.resolve_view(&*store, view_id)?;
            let element = ctx.require(&*store, element_id)?;
            let (bounds, placement) = ctx.grid.bounds_for(&view, *x, *y, *width, *height);
            let visual = store.add_to_view(&view, &element, bounds)?;
            ctx.grid.commit(&view, placement);
            ctx.touched_views.insert(view.clone());
            Ok(Done::created(
                format!(
                    "Added {element} to {view} at ({}, {}) size {}x{}",
                    bounds.x, bounds.y, bounds.width, bounds.height
                ),
                visual,
            ))
        }
        Action::MoveToFolder { id, folder_path } => {
            let target = ctx.require(&*store, id)?;
            let folder = find_folder(&*store, folder_path)?;
            store.move_to_folder(&folder, &target)?;
            Ok(Done::new(format!("Moved {target} to {folder_path}")))
        }
    }
}

/// Walk a slash-separated path: the top-level folder matches its name
/// case-insensitively, every later segment matches exactly.
pub(super) fn find_folder<S: FolderStore + ?Sized>(store: &S, path: &str) -> Result<String> {
    let mut segments = path.split('/').map(str::trim).filter(|s| !s.is_empty());
    let first = segments
        .next()
        .ok_or_else(|| anyhow!("folder path '{path}' is empty"))?;
    let mut current = store
        .top_level_folders()
        .into_iter()
        .find(|folder| folder.name.eq_ignore_ascii_case(first))
        .ok_or_else(|| anyhow!("top-level folder '{first}' not found"))?;
    for segment in segments {
        let parent = current.name.clone();
        current = store
            .child_folders(&current.id)?
            .into_iter()
            .find(|folder| folder.name == segment)
            .ok_or_else(|| anyhow!("folder '{segment}' not found under '{parent}'"))?;
    }
    Ok(current.id)
}
