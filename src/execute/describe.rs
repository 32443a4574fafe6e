//! Preview descriptions.
//!
//! Refs declared earlier in the plan are shown through placeholder records
//! since nothing has been created yet.
use super::layout::GridCursor;
use crate::archimate::ElementType;
use crate::model::EntityStore;
use crate::oracle::{lookup_element_type, lookup_relationship_type, CompatibilityOracle};
use crate::plan::Action;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

#[derive(Debug)]
struct Placeholder {
    name: String,
    element_type: ElementType,
}

#[derive(Debug, Default)]
pub(super) struct PreviewContext {
    element_refs: BTreeMap<String, Placeholder>,
    view_refs: BTreeMap<String, String>,
    grid: GridCursor,
}

impl PreviewContext {
    fn display<S: EntityStore + ?Sized>(&self, store: &S, id: &str) -> String {
        if let Some(placeholder) = self.element_refs.get(id) {
            return format!(
                "\"{}\" [{}] (new, ref {id})",
                placeholder.name, placeholder.element_type
            );
        }
        if let Some(name) = self.view_refs.get(id) {
            return format!("view \"{name}\" (new, ref {id})");
        }
        match store.entity(id) {
            Some(info) => info.to_string(),
            None => format!("'{id}'"),
        }
    }
}

pub(super) fn describe_action<S, O>(
    action: &Action,
    store: &S,
    oracle: &O,
    ctx: &mut PreviewContext,
) -> Result<String>
where
    S: EntityStore + ?Sized,
    O: CompatibilityOracle + ?Sized,
{
    let description = match action {
        Action::CreateElement {
            element_type,
            name,
            ref_id,
            ..
        } => {
            let ty = lookup_element_type(oracle, element_type)
                .ok_or_else(|| anyhow!("unknown element type '{element_type}'"))?;
            if let Some(ref_id) = ref_id {
                ctx.element_refs.insert(
                    ref_id.clone(),
                    Placeholder {
                        name: name.clone(),
                        element_type: ty,
                    },
                );
            }
            format!("Create {ty} \"{name}\"")
        }
        Action::RenameElement { id, name } => {
            format!("Rename {} to \"{name}\"", ctx.display(store, id))
        }
        Action::DeleteElement { id } => {
            let cascade = if ctx.element_refs.contains_key(id) {
                0
            } else {
                store.cascade_relationships(id).len()
            };
            match cascade {
                0 => format!("Delete {}", ctx.display(store, id)),
                n => format!(
                    "Delete {} and {n} attached relationship(s)",
                    ctx.display(store, id)
                ),
            }
        }
        Action::SetProperty { id, key, value } => {
            format!("Set {key} = \"{value}\" on {}", ctx.display(store, id))
        }
        Action::RemoveProperty { id, key } => {
            format!("Remove {key} from {}", ctx.display(store, id))
        }
        Action::SetDocumentation { id, .. } => {
            format!("Set documentation on {}", ctx.display(store, id))
        }
        Action::CreateRelationship {
            relationship_type,
            source_id,
            target_id,
            ..
        } => {
            let ty = lookup_relationship_type(oracle, relationship_type)
                .ok_or_else(|| anyhow!("unknown relationship type '{relationship_type}'"))?;
            format!(
                "Create {ty} relationship from {} to {}",
                ctx.display(store, source_id),
                ctx.display(store, target_id)
            )
        }
        Action::DeleteRelationship { id } => format!("Delete {}", ctx.display(store, id)),
        Action::CreateView { name, ref_id } => {
            if let Some(ref_id) = ref_id {
                ctx.view_refs.insert(ref_id.clone(), name.clone());
            }
            format!("Create view \"{name}\"")
        }
        Action::AddToView {
            view_id,
            element_id,
            x,
            y,
            width,
            height,
        } => {
            let (bounds, placement) = ctx.grid.bounds_for(view_id, *x, *y, *width, *height);
            ctx.grid.commit(view_id, placement);
            format!(
                "Add {} to {} at ({}, {}) size {}x{}",
                ctx.display(store, element_id),
                ctx.display(store, view_id),
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height
            )
        }
        Action::MoveToFolder { id, folder_path } => {
            format!("Move {} to folder {folder_path}", ctx.display(store, id))
        }
    };
    Ok(description)
}
