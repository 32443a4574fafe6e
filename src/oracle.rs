//! Relationship compatibility rules.
//!
//! The validator only needs yes/no answers and the list of permitted types for
//! a source/target pair, so the oracle is a narrow trait. `ArchimateRules` is a
//! condensed rule set derived from the ArchiMate 3.1 relationship tables; it
//! errs on the permissive side because violations are only advisory.
use crate::archimate::{spaced_label, Aspect, ElementType, Layer, RelationshipType};

pub trait CompatibilityOracle {
    /// Whether `relationship` may connect `source` to `target`.
    fn is_allowed(
        &self,
        source: ElementType,
        target: ElementType,
        relationship: RelationshipType,
    ) -> bool;

    /// Relationship types permitted from `source` to `target`.
    fn allowed(&self, source: ElementType, target: ElementType) -> Vec<RelationshipType> {
        RelationshipType::ALL
            .into_iter()
            .filter(|relationship| self.is_allowed(source, target, *relationship))
            .collect()
    }

    fn element_type_for_label(&self, label: &str) -> Option<ElementType> {
        ElementType::from_label(label)
    }

    fn relationship_type_for_label(&self, label: &str) -> Option<RelationshipType> {
        RelationshipType::from_label(label)
    }

    fn element_types(&self) -> Vec<ElementType> {
        ElementType::all().collect()
    }
}

/// Resolve an element type label, retrying concatenated labels
/// (`ApplicationComponent`) with spaces inserted before internal capitals.
pub fn lookup_element_type<O>(oracle: &O, label: &str) -> Option<ElementType>
where
    O: CompatibilityOracle + ?Sized,
{
    oracle
        .element_type_for_label(label)
        .or_else(|| respaced(label).and_then(|spaced| oracle.element_type_for_label(&spaced)))
}

/// Relationship counterpart of [`lookup_element_type`].
pub fn lookup_relationship_type<O>(oracle: &O, label: &str) -> Option<RelationshipType>
where
    O: CompatibilityOracle + ?Sized,
{
    oracle.relationship_type_for_label(label).or_else(|| {
        respaced(label).and_then(|spaced| oracle.relationship_type_for_label(&spaced))
    })
}

fn respaced(label: &str) -> Option<String> {
    let trimmed = label.trim();
    let spaced = spaced_label(trimmed);
    (spaced != trimmed).then_some(spaced)
}

/// Bundled ArchiMate rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchimateRules;

impl CompatibilityOracle for ArchimateRules {
    fn is_allowed(
        &self,
        source: ElementType,
        target: ElementType,
        relationship: RelationshipType,
    ) -> bool {
        if source == ElementType::Junction || target == ElementType::Junction {
            return relationship != RelationshipType::Specialization;
        }
        match relationship {
            RelationshipType::Association => true,
            RelationshipType::Specialization => source == target,
            RelationshipType::Composition | RelationshipType::Aggregation => {
                structural_allowed(source, target)
            }
            RelationshipType::Assignment => assignment_allowed(source, target),
            RelationshipType::Realization => realization_allowed(source, target),
            RelationshipType::Serving => serving_allowed(source, target),
            RelationshipType::Access => access_allowed(source, target),
            RelationshipType::Influence => influence_allowed(source, target),
            RelationshipType::Triggering | RelationshipType::Flow => {
                dynamic_allowed(source, target)
            }
        }
    }
}

fn is_behavioral(aspect: Aspect) -> bool {
    matches!(aspect, Aspect::Behavior | Aspect::Event | Aspect::Service)
}

fn is_active(aspect: Aspect) -> bool {
    matches!(aspect, Aspect::ActiveStructure | Aspect::Interface)
}

fn structural_allowed(source: ElementType, target: ElementType) -> bool {
    if source == target {
        return true;
    }
    match source {
        ElementType::Grouping | ElementType::Location | ElementType::Plateau => true,
        ElementType::Product => {
            let target_layer = target.layer();
            target_layer.is_core() || target == ElementType::Contract
        }
        _ => {
            let (sl, tl) = (source.layer(), target.layer());
            if sl != tl {
                return sl == Layer::Technology && tl == Layer::Physical
                    || sl == Layer::Physical && tl == Layer::Technology;
            }
            let (sa, ta) = (source.aspect(), target.aspect());
            sa == ta
                || is_active(sa) && is_active(ta)
                || is_behavioral(sa) && is_behavioral(ta)
                || sl == Layer::Motivation
        }
    }
}

fn assignment_allowed(source: ElementType, target: ElementType) -> bool {
    let (sa, ta) = (source.aspect(), target.aspect());
    match (source, target) {
        (ElementType::BusinessActor, ElementType::BusinessRole) => return true,
        (ElementType::Resource, ElementType::Capability) => return true,
        (ElementType::BusinessActor | ElementType::BusinessRole, ElementType::WorkPackage) => {
            return true
        }
        (_, ElementType::Artifact) => return source.layer() == Layer::Technology && is_active(sa),
        (ElementType::Stakeholder, _) => return false,
        _ => {}
    }
    source.layer().is_core()
        && is_active(sa)
        && is_behavioral(ta)
        && (source.layer() == target.layer()
            || source.layer() == Layer::Physical && target.layer() == Layer::Technology)
}

fn realization_allowed(source: ElementType, target: ElementType) -> bool {
    let (sl, tl) = (source.layer(), target.layer());
    let (sa, ta) = (source.aspect(), target.aspect());
    if matches!(
        target,
        ElementType::Requirement
            | ElementType::Principle
            | ElementType::Constraint
            | ElementType::Goal
            | ElementType::Outcome
    ) {
        return sl.is_core() || sl == Layer::Implementation || sl == Layer::Strategy;
    }
    match (source, target) {
        (ElementType::WorkPackage, ElementType::Deliverable) => return true,
        (ElementType::Deliverable, _) => return tl.is_core() || tl == Layer::Implementation,
        (ElementType::Artifact, ElementType::ApplicationComponent | ElementType::DataObject) => {
            return true
        }
        (ElementType::Artifact, ElementType::SystemSoftware) => return true,
        (ElementType::DataObject, ElementType::BusinessObject) => return true,
        (ElementType::BusinessObject, ElementType::Representation) => return false,
        (ElementType::Representation, ElementType::BusinessObject) => return true,
        (_, ElementType::Capability | ElementType::ValueStream) => {
            return sl.is_core() && (is_behavioral(sa) || is_active(sa))
        }
        _ => {}
    }
    if ta == Aspect::Service {
        return sl == tl && (is_behavioral(sa) || is_active(sa)) && sa != Aspect::Service;
    }
    match (sl.serving_rank(), tl.serving_rank()) {
        (Some(source_rank), Some(target_rank)) => {
            source_rank < target_rank && sa == ta && !matches!(sa, Aspect::Interface)
        }
        _ => false,
    }
}

fn serving_allowed(source: ElementType, target: ElementType) -> bool {
    let (sa, ta) = (source.aspect(), target.aspect());
    if source.layer() == Layer::Strategy && target.layer() == Layer::Strategy {
        return is_behavioral(sa) && is_behavioral(ta);
    }
    match (source.layer().serving_rank(), target.layer().serving_rank()) {
        (Some(source_rank), Some(target_rank)) => {
            source_rank <= target_rank
                && (is_behavioral(sa) || is_active(sa))
                && (is_behavioral(ta) || is_active(ta))
                && sa != Aspect::Event
        }
        _ => false,
    }
}

fn access_allowed(source: ElementType, target: ElementType) -> bool {
    let sa = source.aspect();
    target.aspect() == Aspect::PassiveStructure
        && target.layer().is_core()
        && source.layer().is_core()
        && (is_behavioral(sa) || is_active(sa))
}

fn influence_allowed(source: ElementType, target: ElementType) -> bool {
    target.layer() == Layer::Motivation && target != ElementType::Stakeholder
        || source.layer() == Layer::Motivation && target.layer() == Layer::Motivation
}

fn dynamic_allowed(source: ElementType, target: ElementType) -> bool {
    let (sl, tl) = (source.layer(), target.layer());
    let (sa, ta) = (source.aspect(), target.aspect());
    match (sl, tl) {
        (Layer::Strategy, Layer::Strategy) => is_behavioral(sa) && is_behavioral(ta),
        (Layer::Implementation, Layer::Implementation) => {
            matches!(sa, Aspect::Behavior | Aspect::Event)
                && matches!(ta, Aspect::Behavior | Aspect::Event)
        }
        _ if sl.is_core() && tl.is_core() => {
            (is_behavioral(sa) && is_behavioral(ta) || is_active(sa) && is_active(ta))
                && (sl == tl || sa != ta || sa == Aspect::Event)
        }
        _ => false,
    }
}
