//! Typed change plan.
//!
//! The wire format is flat and nullable; once the schema phase has accepted a
//! plan it is decoded into these types and nothing downstream sees the flat
//! shape again.
use super::catalog::OpKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[serde(rename = "1.0")]
    V1,
    #[serde(rename = "2.0")]
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Ready,
    NeedsClarification,
    Refusal,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Ready => "ready",
            PlanStatus::NeedsClarification => "needs_clarification",
            PlanStatus::Refusal => "refusal",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePlan {
    pub schema_version: SchemaVersion,
    pub status: PlanStatus,
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub questions: Vec<String>,
    pub actions: Vec<Action>,
}

impl ChangePlan {
    /// Decode a plan that has already passed the schema phase.
    pub fn from_value(value: &Value) -> Result<Self> {
        ChangePlan::deserialize(value).context("decode change plan")
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One plan step; each variant owns only the fields its op declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    CreateElement {
        #[serde(rename = "type")]
        element_type: String,
        name: String,
        ref_id: Option<String>,
        documentation: Option<String>,
    },
    RenameElement {
        id: String,
        name: String,
    },
    DeleteElement {
        id: String,
    },
    SetProperty {
        id: String,
        key: String,
        value: String,
    },
    RemoveProperty {
        id: String,
        key: String,
    },
    SetDocumentation {
        id: String,
        documentation: String,
    },
    CreateRelationship {
        relationship_type: String,
        source_id: String,
        target_id: String,
        name: Option<String>,
    },
    DeleteRelationship {
        id: String,
    },
    CreateView {
        name: String,
        ref_id: Option<String>,
    },
    AddToView {
        view_id: String,
        element_id: String,
        x: Option<i64>,
        y: Option<i64>,
        width: Option<i64>,
        height: Option<i64>,
    },
    MoveToFolder {
        id: String,
        folder_path: String,
    },
}

impl Action {
    pub fn kind(&self) -> OpKind {
        match self {
            Action::CreateElement { .. } => OpKind::CreateElement,
            Action::RenameElement { .. } => OpKind::RenameElement,
            Action::DeleteElement { .. } => OpKind::DeleteElement,
            Action::SetProperty { .. } => OpKind::SetProperty,
            Action::RemoveProperty { .. } => OpKind::RemoveProperty,
            Action::SetDocumentation { .. } => OpKind::SetDocumentation,
            Action::CreateRelationship { .. } => OpKind::CreateRelationship,
            Action::DeleteRelationship { .. } => OpKind::DeleteRelationship,
            Action::CreateView { .. } => OpKind::CreateView,
            Action::AddToView { .. } => OpKind::AddToView,
            Action::MoveToFolder { .. } => OpKind::MoveToFolder,
        }
    }

    pub fn op_name(&self) -> &'static str {
        self.kind().name()
    }
}
