//! Semantic phase: reference resolution and graph-aware checks.
//!
//! Actions are visited strictly in order. Each one sees the refs declared and
//! the ids deleted by the actions before it, never after it.
use super::{Findings, Scope};
use crate::archimate::{ElementType, RelationshipType};
use crate::model::{EntityKind, EntityStore};
use crate::oracle::{lookup_element_type, lookup_relationship_type, CompatibilityOracle};
use crate::plan::Action;
use std::collections::{BTreeMap, BTreeSet};

/// Running tables threaded through the semantic walk.
#[derive(Debug, Default)]
pub struct ValidationContext {
    element_refs: BTreeMap<String, Option<ElementType>>,
    view_refs: BTreeSet<String>,
    /// Deleted id -> index of the action that deleted it.
    deleted: BTreeMap<String, usize>,
    renamed: BTreeSet<String>,
    documented: BTreeSet<String>,
    properties_set: BTreeSet<(String, String)>,
}

impl ValidationContext {
    pub fn is_deleted(&self, id: &str) -> bool {
        self.deleted.contains_key(id)
    }

    pub fn declares_ref(&self, ref_id: &str) -> bool {
        self.element_refs.contains_key(ref_id) || self.view_refs.contains(ref_id)
    }

    fn deleted_error(&self, id: &str) -> Option<String> {
        self.deleted
            .get(id)
            .map(|index| format!("'{id}' was deleted by action {index}"))
    }
}

/// What an id resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolved {
    Element(Option<ElementType>),
    Relationship(RelationshipType),
    View,
}

struct Resolver<'a, S: ?Sized> {
    store: &'a S,
    scope: Option<&'a Scope>,
}

impl<S: EntityStore + ?Sized> Resolver<'_, S> {
    /// Deleted ids first, then plan refs, then the live model.
    fn resolve(&self, ctx: &ValidationContext, id: &str) -> Result<Resolved, String> {
        if let Some(message) = ctx.deleted_error(id) {
            return Err(message);
        }
        if let Some(element_type) = ctx.element_refs.get(id) {
            return Ok(Resolved::Element(*element_type));
        }
        if ctx.view_refs.contains(id) {
            return Ok(Resolved::View);
        }
        let info = self
            .store
            .entity(id)
            .ok_or_else(|| format!("'{id}' not found in the model or earlier ref_ids"))?;
        match info.kind {
            EntityKind::View => Ok(Resolved::View),
            _ if !self.in_scope(id) => Err(format!("'{id}' is outside the selected scope")),
            EntityKind::Element(element_type) => Ok(Resolved::Element(Some(element_type))),
            EntityKind::Relationship(relationship_type) => {
                Ok(Resolved::Relationship(relationship_type))
            }
        }
    }

    fn in_scope(&self, id: &str) -> bool {
        self.scope.map_or(true, |scope| scope.contains(id))
    }
}

pub(super) fn check_actions<S, O>(
    actions: &[Action],
    store: &S,
    oracle: &O,
    scope: Option<&Scope>,
    ctx: &mut ValidationContext,
    findings: &mut Findings,
) where
    S: EntityStore + ?Sized,
    O: CompatibilityOracle + ?Sized,
{
    let resolver = Resolver { store, scope };
    for (index, action) in actions.iter().enumerate() {
        let before = findings.errors.len();
        check_action(index, action, &resolver, oracle, ctx, findings);
        tracing::debug!(
            index,
            op = action.op_name(),
            errors = findings.errors.len() - before,
            "semantic check"
        );
    }
}

fn check_action<S, O>(
    index: usize,
    action: &Action,
    resolver: &Resolver<'_, S>,
    oracle: &O,
    ctx: &mut ValidationContext,
    findings: &mut Findings,
) where
    S: EntityStore + ?Sized,
    O: CompatibilityOracle + ?Sized,
{
    let at = Some(index);
    match action {
        Action::CreateElement {
            element_type,
            ref_id,
            ..
        } => {
            if let Some(ref_id) = ref_id {
                if declare_ref(index, ref_id, resolver, ctx, findings) {
                    let element_type = lookup_element_type(oracle, element_type);
                    ctx.element_refs.insert(ref_id.clone(), element_type);
                }
            }
        }
        Action::CreateView { ref_id, .. } => {
            if let Some(ref_id) = ref_id {
                if declare_ref(index, ref_id, resolver, ctx, findings) {
                    ctx.view_refs.insert(ref_id.clone());
                }
            }
        }
        Action::CreateRelationship {
            relationship_type,
            source_id,
            target_id,
            ..
        } => {
            let source = resolve_endpoint(index, "source_id", source_id, resolver, ctx, findings);
            let target = resolve_endpoint(index, "target_id", target_id, resolver, ctx, findings);
            let relationship = lookup_relationship_type(oracle, relationship_type);
            if let (Some(source), Some(target), Some(relationship)) = (source, target, relationship)
            {
                check_compatibility(index, source, target, relationship, oracle, findings);
            }
        }
        Action::DeleteElement { id } => match resolver.resolve(ctx, id) {
            Err(message) => findings.error(at, Some("id"), message),
            Ok(Resolved::Relationship(_)) => findings.error(
                at,
                Some("id"),
                format!("'{id}' is a relationship; use delete_relationship"),
            ),
            Ok(_) => {
                let cascaded: Vec<String> = if ctx.declares_ref(id) {
                    Vec::new()
                } else {
                    resolver
                        .store
                        .cascade_relationships(id)
                        .into_iter()
                        .filter(|rel| !ctx.is_deleted(rel))
                        .collect()
                };
                if !cascaded.is_empty() {
                    findings.warning(
                        at,
                        Some("id"),
                        format!(
                            "deleting '{id}' also deletes {} attached relationship(s)",
                            cascaded.len()
                        ),
                    );
                }
                for rel in cascaded {
                    ctx.deleted.insert(rel, index);
                }
                ctx.deleted.insert(id.clone(), index);
            }
        },
        Action::DeleteRelationship { id } => {
            if let Some(message) = ctx.deleted_error(id) {
                findings.error(at, Some("id"), message);
                return;
            }
            match resolver.store.entity(id).map(|info| info.kind) {
                None => findings.error(
                    at,
                    Some("id"),
                    format!("relationship '{id}' not found in the model"),
                ),
                Some(EntityKind::Relationship(_)) if !resolver.in_scope(id) => findings.error(
                    at,
                    Some("id"),
                    format!("'{id}' is outside the selected scope"),
                ),
                Some(EntityKind::Relationship(_)) => {
                    ctx.deleted.insert(id.clone(), index);
                }
                Some(kind) => findings.error(
                    at,
                    Some("id"),
                    format!("'{id}' is not a relationship ({})", kind.label()),
                ),
            }
        }
        Action::RenameElement { id, .. } => {
            if resolve_target(index, id, resolver, ctx, findings) && !ctx.renamed.insert(id.clone())
            {
                findings.warning(
                    at,
                    Some("id"),
                    format!("'{id}' is renamed more than once"),
                );
            }
        }
        Action::SetProperty { id, key, .. } => {
            if resolve_target(index, id, resolver, ctx, findings)
                && !ctx.properties_set.insert((id.clone(), key.clone()))
            {
                findings.warning(
                    at,
                    Some("key"),
                    format!("property '{key}' on '{id}' is set more than once"),
                );
            }
        }
        Action::SetDocumentation { id, .. } => {
            if resolve_target(index, id, resolver, ctx, findings)
                && !ctx.documented.insert(id.clone())
            {
                findings.warning(
                    at,
                    Some("id"),
                    format!("documentation of '{id}' is set more than once"),
                );
            }
        }
        Action::RemoveProperty { id, .. } | Action::MoveToFolder { id, .. } => {
            resolve_target(index, id, resolver, ctx, findings);
        }
        Action::AddToView {
            view_id,
            element_id,
            ..
        } => {
            check_view_ref(index, view_id, resolver, ctx, findings);
            match resolver.resolve(ctx, element_id) {
                Err(message) => findings.error(at, Some("element_id"), message),
                Ok(Resolved::View) => findings.error(
                    at,
                    Some("element_id"),
                    format!("'{element_id}' is a view and cannot be placed on a view"),
                ),
                Ok(Resolved::Relationship(_)) => findings.error(
                    at,
                    Some("element_id"),
                    format!(
                        "'{element_id}' is a relationship; relationships are connected automatically"
                    ),
                ),
                Ok(Resolved::Element(_)) => {}
            }
        }
    }
}

/// Register-time checks for a new ref_id. Returns whether it may be declared.
fn declare_ref<S>(
    index: usize,
    ref_id: &str,
    resolver: &Resolver<'_, S>,
    ctx: &ValidationContext,
    findings: &mut Findings,
) -> bool
where
    S: EntityStore + ?Sized,
{
    if ctx.declares_ref(ref_id) {
        findings.error(
            Some(index),
            Some("ref_id"),
            format!("duplicate ref_id '{ref_id}'"),
        );
        return false;
    }
    if resolver.store.entity(ref_id).is_some() {
        findings.warning(
            Some(index),
            Some("ref_id"),
            format!("ref_id '{ref_id}' shadows an existing model id"),
        );
    }
    true
}

fn resolve_target<S>(
    index: usize,
    id: &str,
    resolver: &Resolver<'_, S>,
    ctx: &ValidationContext,
    findings: &mut Findings,
) -> bool
where
    S: EntityStore + ?Sized,
{
    match resolver.resolve(ctx, id) {
        Ok(_) => true,
        Err(message) => {
            findings.error(Some(index), Some("id"), message);
            false
        }
    }
}

/// Resolve one relationship endpoint; `Some` only when its element type is
/// known.
fn resolve_endpoint<S>(
    index: usize,
    field: &str,
    id: &str,
    resolver: &Resolver<'_, S>,
    ctx: &ValidationContext,
    findings: &mut Findings,
) -> Option<ElementType>
where
    S: EntityStore + ?Sized,
{
    match resolver.resolve(ctx, id) {
        Ok(Resolved::Element(element_type)) => element_type,
        Ok(Resolved::Relationship(_)) => None,
        Ok(Resolved::View) => {
            findings.error(
                Some(index),
                Some(field),
                format!("'{id}' is a view and cannot be a relationship endpoint"),
            );
            None
        }
        Err(message) => {
            findings.error(Some(index), Some(field), message);
            None
        }
    }
}

fn check_view_ref<S>(
    index: usize,
    view_id: &str,
    resolver: &Resolver<'_, S>,
    ctx: &ValidationContext,
    findings: &mut Findings,
) where
    S: EntityStore + ?Sized,
{
    let problem = if let Some(message) = ctx.deleted_error(view_id) {
        Some(message)
    } else if ctx.view_refs.contains(view_id) {
        None
    } else if ctx.element_refs.contains_key(view_id) {
        Some(format!("ref_id '{view_id}' names an element, not a view"))
    } else {
        match resolver.store.entity(view_id).map(|info| info.kind) {
            Some(EntityKind::View) => None,
            Some(kind) => Some(format!("'{view_id}' is not a view ({})", kind.label())),
            None => Some(format!("view '{view_id}' not found in the model or earlier ref_ids")),
        }
    };
    if let Some(message) = problem {
        findings.error(Some(index), Some("view_id"), message);
    }
}

fn check_compatibility<O>(
    index: usize,
    source: ElementType,
    target: ElementType,
    relationship: RelationshipType,
    oracle: &O,
    findings: &mut Findings,
) where
    O: CompatibilityOracle + ?Sized,
{
    if oracle.is_allowed(source, target, relationship) {
        return;
    }
    let allowed = oracle.allowed(source, target);
    let message = if allowed.is_empty() {
        format!(
            "{relationship} is not permitted from {source} to {target}; no relationship types are permitted"
        )
    } else {
        let names: Vec<&str> = allowed.iter().map(|ty| ty.label()).collect();
        format!(
            "{relationship} is not permitted from {source} to {target}; permitted: {}",
            names.join(", ")
        )
    };
    findings.warning(Some(index), Some("relationship_type"), message);
}

#[cfg(test)]
#[path = "semantic_tests.rs"]
mod tests;
