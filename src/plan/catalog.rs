//! Operation catalog: the single source of truth for what a plan may contain.
//!
//! Producers that use structured-output decoding cannot emit variable-shaped
//! objects, so the wire format is one flat action object carrying every field
//! any op uses. The catalog keeps the per-op contracts, generates that flat
//! schema, and normalizes incoming actions back to their own fields.
use serde_json::{json, Map, Value};

pub const SCHEMA_VERSIONS: &[&str] = &["1.0", "2.0"];
pub const PLAN_STATUSES: &[&str] = &["ready", "needs_clarification", "refusal"];
pub const TOP_LEVEL_FIELDS: &[&str] = &["schema_version", "status", "summary", "questions", "actions"];

pub const MAX_ACTIONS: usize = 100;
pub const MAX_SUMMARY_CHARS: usize = 2000;
pub const MAX_QUESTIONS: usize = 10;
pub const MAX_QUESTION_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    CreateElement,
    RenameElement,
    DeleteElement,
    SetProperty,
    RemoveProperty,
    SetDocumentation,
    CreateRelationship,
    DeleteRelationship,
    CreateView,
    AddToView,
    MoveToFolder,
}

/// Required and optional fields for one op.
#[derive(Debug)]
pub struct OpContract {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl OpContract {
    pub fn declares(&self, field: &str) -> bool {
        self.required.contains(&field) || self.optional.contains(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required.iter().chain(self.optional.iter()).copied()
    }
}

impl OpKind {
    pub const ALL: [OpKind; 11] = [
        OpKind::CreateElement,
        OpKind::RenameElement,
        OpKind::DeleteElement,
        OpKind::SetProperty,
        OpKind::RemoveProperty,
        OpKind::SetDocumentation,
        OpKind::CreateRelationship,
        OpKind::DeleteRelationship,
        OpKind::CreateView,
        OpKind::AddToView,
        OpKind::MoveToFolder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OpKind::CreateElement => "create_element",
            OpKind::RenameElement => "rename_element",
            OpKind::DeleteElement => "delete_element",
            OpKind::SetProperty => "set_property",
            OpKind::RemoveProperty => "remove_property",
            OpKind::SetDocumentation => "set_documentation",
            OpKind::CreateRelationship => "create_relationship",
            OpKind::DeleteRelationship => "delete_relationship",
            OpKind::CreateView => "create_view",
            OpKind::AddToView => "add_to_view",
            OpKind::MoveToFolder => "move_to_folder",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        OpKind::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn contract(self) -> &'static OpContract {
        match self {
            OpKind::CreateElement => &OpContract {
                required: &["type", "name"],
                optional: &["ref_id", "documentation"],
            },
            OpKind::RenameElement => &OpContract {
                required: &["id", "name"],
                optional: &[],
            },
            OpKind::DeleteElement => &OpContract {
                required: &["id"],
                optional: &[],
            },
            OpKind::SetProperty => &OpContract {
                required: &["id", "key", "value"],
                optional: &[],
            },
            OpKind::RemoveProperty => &OpContract {
                required: &["id", "key"],
                optional: &[],
            },
            OpKind::SetDocumentation => &OpContract {
                required: &["id", "documentation"],
                optional: &[],
            },
            OpKind::CreateRelationship => &OpContract {
                required: &["relationship_type", "source_id", "target_id"],
                optional: &["name"],
            },
            OpKind::DeleteRelationship => &OpContract {
                required: &["id"],
                optional: &[],
            },
            OpKind::CreateView => &OpContract {
                required: &["name"],
                optional: &["ref_id"],
            },
            OpKind::AddToView => &OpContract {
                required: &["view_id", "element_id"],
                optional: &["x", "y", "width", "height"],
            },
            OpKind::MoveToFolder => &OpContract {
                required: &["id", "folder_path"],
                optional: &[],
            },
        }
    }
}

/// Value constraint for an action field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { max_chars: usize, allow_empty: bool },
    ElementTypeLabel,
    RelationshipTypeLabel,
    Integer { min: i64, max: i64 },
}

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const ID_MAX: usize = 128;
pub const TYPE_LABEL_MAX: usize = 64;

const fn id_field(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text {
            max_chars: ID_MAX,
            allow_empty: false,
        },
    }
}

/// Every action field, in wire order after `op`.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "type",
        kind: FieldKind::ElementTypeLabel,
    },
    FieldSpec {
        name: "name",
        kind: FieldKind::Text {
            max_chars: 256,
            allow_empty: false,
        },
    },
    id_field("ref_id"),
    id_field("id"),
    FieldSpec {
        name: "key",
        kind: FieldKind::Text {
            max_chars: 128,
            allow_empty: false,
        },
    },
    FieldSpec {
        name: "value",
        kind: FieldKind::Text {
            max_chars: 4000,
            allow_empty: true,
        },
    },
    FieldSpec {
        name: "documentation",
        kind: FieldKind::Text {
            max_chars: 8000,
            allow_empty: true,
        },
    },
    FieldSpec {
        name: "relationship_type",
        kind: FieldKind::RelationshipTypeLabel,
    },
    id_field("source_id"),
    id_field("target_id"),
    id_field("view_id"),
    id_field("element_id"),
    FieldSpec {
        name: "x",
        kind: FieldKind::Integer { min: 0, max: 20000 },
    },
    FieldSpec {
        name: "y",
        kind: FieldKind::Integer { min: 0, max: 20000 },
    },
    FieldSpec {
        name: "width",
        kind: FieldKind::Integer { min: 10, max: 2000 },
    },
    FieldSpec {
        name: "height",
        kind: FieldKind::Integer { min: 10, max: 2000 },
    },
    FieldSpec {
        name: "folder_path",
        kind: FieldKind::Text {
            max_chars: 512,
            allow_empty: false,
        },
    },
];

pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.name == name)
}

pub fn op_names() -> Vec<&'static str> {
    OpKind::ALL.into_iter().map(OpKind::name).collect()
}

/// Force every field outside an action's own contract to null.
///
/// Actions whose `op` is missing or unknown are left alone so the schema
/// phase can report them. Running this twice changes nothing.
pub fn normalize(plan: &mut Value) {
    let Some(actions) = plan.get_mut("actions").and_then(Value::as_array_mut) else {
        return;
    };
    for action in actions.iter_mut() {
        normalize_action(action);
    }
}

pub fn normalize_action(action: &mut Value) {
    let Some(object) = action.as_object_mut() else {
        return;
    };
    let Some(op) = object
        .get("op")
        .and_then(Value::as_str)
        .and_then(OpKind::from_name)
    else {
        return;
    };
    let contract = op.contract();
    for (field, value) in object.iter_mut() {
        if field != "op" && !contract.declares(field) {
            *value = Value::Null;
        }
    }
}

/// Flattened JSON schema handed to the plan producer.
pub fn output_schema() -> Value {
    let mut properties = Map::new();
    properties.insert(
        "op".to_string(),
        json!({ "type": "string", "enum": op_names() }),
    );
    for spec in FIELDS {
        properties.insert(spec.name.to_string(), field_schema(spec));
    }
    let required: Vec<&str> = std::iter::once("op")
        .chain(FIELDS.iter().map(|spec| spec.name))
        .collect();

    json!({
        "type": "object",
        "additionalProperties": false,
        "required": TOP_LEVEL_FIELDS,
        "properties": {
            "schema_version": { "type": "string", "enum": SCHEMA_VERSIONS },
            "status": { "type": "string", "enum": PLAN_STATUSES },
            "summary": { "type": "string", "maxLength": MAX_SUMMARY_CHARS },
            "questions": {
                "type": ["array", "null"],
                "maxItems": MAX_QUESTIONS,
                "items": { "type": "string", "minLength": 1, "maxLength": MAX_QUESTION_CHARS }
            },
            "actions": {
                "type": "array",
                "maxItems": MAX_ACTIONS,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": required,
                    "properties": properties
                }
            }
        }
    })
}

fn field_schema(spec: &FieldSpec) -> Value {
    match spec.kind {
        FieldKind::Text {
            max_chars,
            allow_empty,
        } => {
            let mut schema = json!({ "type": ["string", "null"], "maxLength": max_chars });
            if !allow_empty {
                schema["minLength"] = json!(1);
            }
            schema
        }
        FieldKind::ElementTypeLabel | FieldKind::RelationshipTypeLabel => {
            json!({ "type": ["string", "null"], "minLength": 1, "maxLength": TYPE_LABEL_MAX })
        }
        FieldKind::Integer { min, max } => {
            json!({ "type": ["integer", "null"], "minimum": min, "maximum": max })
        }
    }
}
