//! ArchiMate type vocabulary.
//!
//! Element and relationship types are closed sets. Each type has a stable
//! kebab-case id (used in model JSON) and a human label (used in plans).
//! Lookups here are exact apart from ASCII case; the concatenated-label retry
//! lives with the oracle lookups in `crate::oracle`.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Architecture layer an element type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Strategy,
    Business,
    Application,
    Technology,
    Physical,
    Motivation,
    Implementation,
    Other,
}

impl Layer {
    /// Rank used for cross-layer serving: lower layers serve higher ones.
    pub fn serving_rank(self) -> Option<u8> {
        match self {
            Layer::Technology | Layer::Physical => Some(0),
            Layer::Application => Some(1),
            Layer::Business => Some(2),
            _ => None,
        }
    }

    /// Core layers share the active/behavior/passive aspect structure.
    pub fn is_core(self) -> bool {
        self.serving_rank().is_some()
    }
}

/// Structural aspect of an element type within its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aspect {
    ActiveStructure,
    Behavior,
    Event,
    Service,
    Interface,
    PassiveStructure,
    Composite,
    Motivation,
    Connector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    Resource,
    Capability,
    ValueStream,
    CourseOfAction,
    BusinessActor,
    BusinessRole,
    BusinessCollaboration,
    BusinessInterface,
    BusinessProcess,
    BusinessFunction,
    BusinessInteraction,
    BusinessEvent,
    BusinessService,
    BusinessObject,
    Contract,
    Representation,
    Product,
    ApplicationComponent,
    ApplicationCollaboration,
    ApplicationInterface,
    ApplicationFunction,
    ApplicationInteraction,
    ApplicationProcess,
    ApplicationEvent,
    ApplicationService,
    DataObject,
    Node,
    Device,
    SystemSoftware,
    TechnologyCollaboration,
    TechnologyInterface,
    Path,
    CommunicationNetwork,
    TechnologyFunction,
    TechnologyProcess,
    TechnologyInteraction,
    TechnologyEvent,
    TechnologyService,
    Artifact,
    Equipment,
    Facility,
    DistributionNetwork,
    Material,
    Stakeholder,
    Driver,
    Assessment,
    Goal,
    Outcome,
    Principle,
    Requirement,
    Constraint,
    Meaning,
    Value,
    WorkPackage,
    Deliverable,
    ImplementationEvent,
    Plateau,
    Gap,
    Grouping,
    Location,
    Junction,
}

/// Static facts about one element type.
#[derive(Debug)]
pub struct ElementTypeInfo {
    pub ty: ElementType,
    pub id: &'static str,
    pub label: &'static str,
    pub layer: Layer,
    pub aspect: Aspect,
}

macro_rules! element_info {
    ($ty:ident, $id:literal, $label:literal, $layer:ident, $aspect:ident) => {
        ElementTypeInfo {
            ty: ElementType::$ty,
            id: $id,
            label: $label,
            layer: Layer::$layer,
            aspect: Aspect::$aspect,
        }
    };
}

/// One entry per `ElementType`, in declaration order.
pub const ELEMENT_TYPES: &[ElementTypeInfo] = &[
    element_info!(Resource, "resource", "Resource", Strategy, ActiveStructure),
    element_info!(Capability, "capability", "Capability", Strategy, Behavior),
    element_info!(ValueStream, "value-stream", "Value Stream", Strategy, Behavior),
    element_info!(CourseOfAction, "course-of-action", "Course of Action", Strategy, Behavior),
    element_info!(BusinessActor, "business-actor", "Business Actor", Business, ActiveStructure),
    element_info!(BusinessRole, "business-role", "Business Role", Business, ActiveStructure),
    element_info!(BusinessCollaboration, "business-collaboration", "Business Collaboration", Business, ActiveStructure),
    element_info!(BusinessInterface, "business-interface", "Business Interface", Business, Interface),
    element_info!(BusinessProcess, "business-process", "Business Process", Business, Behavior),
    element_info!(BusinessFunction, "business-function", "Business Function", Business, Behavior),
    element_info!(BusinessInteraction, "business-interaction", "Business Interaction", Business, Behavior),
    element_info!(BusinessEvent, "business-event", "Business Event", Business, Event),
    element_info!(BusinessService, "business-service", "Business Service", Business, Service),
    element_info!(BusinessObject, "business-object", "Business Object", Business, PassiveStructure),
    element_info!(Contract, "contract", "Contract", Business, PassiveStructure),
    element_info!(Representation, "representation", "Representation", Business, PassiveStructure),
    element_info!(Product, "product", "Product", Business, Composite),
    element_info!(ApplicationComponent, "application-component", "Application Component", Application, ActiveStructure),
    element_info!(ApplicationCollaboration, "application-collaboration", "Application Collaboration", Application, ActiveStructure),
    element_info!(ApplicationInterface, "application-interface", "Application Interface", Application, Interface),
    element_info!(ApplicationFunction, "application-function", "Application Function", Application, Behavior),
    element_info!(ApplicationInteraction, "application-interaction", "Application Interaction", Application, Behavior),
    element_info!(ApplicationProcess, "application-process", "Application Process", Application, Behavior),
    element_info!(ApplicationEvent, "application-event", "Application Event", Application, Event),
    element_info!(ApplicationService, "application-service", "Application Service", Application, Service),
    element_info!(DataObject, "data-object", "Data Object", Application, PassiveStructure),
    element_info!(Node, "node", "Node", Technology, ActiveStructure),
    element_info!(Device, "device", "Device", Technology, ActiveStructure),
    element_info!(SystemSoftware, "system-software", "System Software", Technology, ActiveStructure),
    element_info!(TechnologyCollaboration, "technology-collaboration", "Technology Collaboration", Technology, ActiveStructure),
    element_info!(TechnologyInterface, "technology-interface", "Technology Interface", Technology, Interface),
    element_info!(Path, "path", "Path", Technology, ActiveStructure),
    element_info!(CommunicationNetwork, "communication-network", "Communication Network", Technology, ActiveStructure),
    element_info!(TechnologyFunction, "technology-function", "Technology Function", Technology, Behavior),
    element_info!(TechnologyProcess, "technology-process", "Technology Process", Technology, Behavior),
    element_info!(TechnologyInteraction, "technology-interaction", "Technology Interaction", Technology, Behavior),
    element_info!(TechnologyEvent, "technology-event", "Technology Event", Technology, Event),
    element_info!(TechnologyService, "technology-service", "Technology Service", Technology, Service),
    element_info!(Artifact, "artifact", "Artifact", Technology, PassiveStructure),
    element_info!(Equipment, "equipment", "Equipment", Physical, ActiveStructure),
    element_info!(Facility, "facility", "Facility", Physical, ActiveStructure),
    element_info!(DistributionNetwork, "distribution-network", "Distribution Network", Physical, ActiveStructure),
    element_info!(Material, "material", "Material", Physical, PassiveStructure),
    element_info!(Stakeholder, "stakeholder", "Stakeholder", Motivation, Motivation),
    element_info!(Driver, "driver", "Driver", Motivation, Motivation),
    element_info!(Assessment, "assessment", "Assessment", Motivation, Motivation),
    element_info!(Goal, "goal", "Goal", Motivation, Motivation),
    element_info!(Outcome, "outcome", "Outcome", Motivation, Motivation),
    element_info!(Principle, "principle", "Principle", Motivation, Motivation),
    element_info!(Requirement, "requirement", "Requirement", Motivation, Motivation),
    element_info!(Constraint, "constraint", "Constraint", Motivation, Motivation),
    element_info!(Meaning, "meaning", "Meaning", Motivation, Motivation),
    element_info!(Value, "value", "Value", Motivation, Motivation),
    element_info!(WorkPackage, "work-package", "Work Package", Implementation, Behavior),
    element_info!(Deliverable, "deliverable", "Deliverable", Implementation, PassiveStructure),
    element_info!(ImplementationEvent, "implementation-event", "Implementation Event", Implementation, Event),
    element_info!(Plateau, "plateau", "Plateau", Implementation, Composite),
    element_info!(Gap, "gap", "Gap", Implementation, PassiveStructure),
    element_info!(Grouping, "grouping", "Grouping", Other, Composite),
    element_info!(Location, "location", "Location", Other, Composite),
    element_info!(Junction, "junction", "Junction", Other, Connector),
];

impl ElementType {
    pub fn all() -> impl Iterator<Item = ElementType> {
        ELEMENT_TYPES.iter().map(|info| info.ty)
    }

    pub fn info(self) -> &'static ElementTypeInfo {
        &ELEMENT_TYPES[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.info().id
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn layer(self) -> Layer {
        self.info().layer
    }

    pub fn aspect(self) -> Aspect {
        self.info().aspect
    }

    /// Look up a type from its label or id.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        ELEMENT_TYPES
            .iter()
            .find(|info| info.label.eq_ignore_ascii_case(label) || info.id.eq_ignore_ascii_case(label))
            .map(|info| info.ty)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    Composition,
    Aggregation,
    Assignment,
    Realization,
    Serving,
    Access,
    Influence,
    Triggering,
    Flow,
    Specialization,
    Association,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 11] = [
        RelationshipType::Composition,
        RelationshipType::Aggregation,
        RelationshipType::Assignment,
        RelationshipType::Realization,
        RelationshipType::Serving,
        RelationshipType::Access,
        RelationshipType::Influence,
        RelationshipType::Triggering,
        RelationshipType::Flow,
        RelationshipType::Specialization,
        RelationshipType::Association,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RelationshipType::Composition => "Composition",
            RelationshipType::Aggregation => "Aggregation",
            RelationshipType::Assignment => "Assignment",
            RelationshipType::Realization => "Realization",
            RelationshipType::Serving => "Serving",
            RelationshipType::Access => "Access",
            RelationshipType::Influence => "Influence",
            RelationshipType::Triggering => "Triggering",
            RelationshipType::Flow => "Flow",
            RelationshipType::Specialization => "Specialization",
            RelationshipType::Association => "Association",
        }
    }

    /// Model id, e.g. `serving-relationship`.
    pub fn id(self) -> String {
        format!("{}-relationship", self.label().to_ascii_lowercase())
    }

    /// Look up a type from `Serving`, `Serving Relationship`, or
    /// `serving-relationship`.
    pub fn from_label(label: &str) -> Option<Self> {
        let lowered = label.trim().to_ascii_lowercase();
        let bare = lowered
            .strip_suffix(" relationship")
            .or_else(|| lowered.strip_suffix("-relationship"))
            .unwrap_or(&lowered);
        RelationshipType::ALL
            .into_iter()
            .find(|ty| ty.label().eq_ignore_ascii_case(bare))
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Insert a space before each internal capital: `ApplicationComponent` ->
/// `Application Component`.
pub fn spaced_label(label: &str) -> String {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let boundary = BOUNDARY
        .get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("regex for label boundaries"));
    boundary.replace_all(label, "$1 $2").into_owned()
}
