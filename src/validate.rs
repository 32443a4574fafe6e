//! Two-phase plan validation.
//!
//! Validation never fails outright; it always returns a report so the caller
//! can hand every problem back to the producer in one round trip.
//!
//! ## Pipeline summary
//! - **Schema**: structure and per-op field contracts, checked on the raw
//!   (normalized) JSON without touching the model.
//! - **Semantic**: walks the decoded actions in order, resolving ids against
//!   earlier ref_ids and the live model, and tracking deletions.
//!
//! Schema errors stop validation before the semantic phase. Semantic
//! validation always visits every action.
//!
//! ## Example walkthrough
//! ```text
//! create_element    type="ApplicationComponent" ref_id="e1"  -> ok (label respaced)
//! create_relationship source_id="e1" target_id="e9"           -> error: target_id 'e9' not found
//! delete_element    id="crm"                                  -> warning: cascades 2 relationships
//! rename_element    id="crm"                                  -> error: deleted by action 2
//! ```
mod schema;
mod semantic;

use crate::model::EntityStore;
use crate::oracle::CompatibilityOracle;
use crate::plan::ChangePlan;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

pub use semantic::ValidationContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Schema,
    Semantic,
}

/// One validation finding, blocking or advisory depending on which list it
/// lands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.action_index, self.field.as_deref()) {
            (Some(index), Some(field)) => write!(f, "actions[{index}].{field}: {}", self.message),
            (Some(index), None) => write!(f, "actions[{index}]: {}", self.message),
            (None, Some(field)) => write!(f, "{field}: {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

/// Errors and warnings collected for one phase.
#[derive(Debug)]
pub(crate) struct Findings {
    phase: Phase,
    pub(crate) errors: Vec<Issue>,
    pub(crate) warnings: Vec<Issue>,
}

impl Findings {
    pub(crate) fn new(phase: Phase) -> Self {
        Self {
            phase,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn issue(&self, index: Option<usize>, field: Option<&str>, message: String) -> Issue {
        Issue {
            phase: self.phase,
            action_index: index,
            field: field.map(str::to_string),
            message,
        }
    }

    pub(crate) fn error(&mut self, index: Option<usize>, field: Option<&str>, message: String) {
        let issue = self.issue(index, field, message);
        self.errors.push(issue);
    }

    pub(crate) fn warning(&mut self, index: Option<usize>, field: Option<&str>, message: String) {
        let issue = self.issue(index, field, message);
        self.warnings.push(issue);
    }
}

/// Caller-supplied restriction on which live entities a plan may touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    ids: BTreeSet<String>,
}

impl Scope {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub schema_valid: bool,
    pub semantic_valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    /// Decoded plan, present whenever the schema phase passed.
    #[serde(skip)]
    pub plan: Option<ChangePlan>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.schema_valid && self.semantic_valid
    }
}

/// Validate a normalized plan value against the model.
///
/// `scope` only affects the semantic phase.
pub fn validate<S, O>(
    raw: &Value,
    store: &S,
    oracle: &O,
    scope: Option<&Scope>,
) -> ValidationReport
where
    S: EntityStore + ?Sized,
    O: CompatibilityOracle + ?Sized,
{
    let mut schema_findings = Findings::new(Phase::Schema);
    let plan = schema::check_plan(raw, oracle, &mut schema_findings);
    let schema_valid = schema_findings.errors.is_empty() && plan.is_some();
    tracing::debug!(
        errors = schema_findings.errors.len(),
        warnings = schema_findings.warnings.len(),
        "schema phase complete"
    );

    let mut errors = schema_findings.errors;
    let mut warnings = schema_findings.warnings;
    let mut semantic_valid = false;

    if let Some(plan) = plan.as_ref().filter(|_| schema_valid) {
        if plan.actions.is_empty() {
            semantic_valid = true;
        } else {
            let mut semantic_findings = Findings::new(Phase::Semantic);
            let mut ctx = ValidationContext::default();
            semantic::check_actions(
                &plan.actions,
                store,
                oracle,
                scope,
                &mut ctx,
                &mut semantic_findings,
            );
            semantic_valid = semantic_findings.errors.is_empty();
            errors.extend(semantic_findings.errors);
            warnings.extend(semantic_findings.warnings);
        }
    }

    tracing::info!(
        schema_valid,
        semantic_valid,
        errors = errors.len(),
        warnings = warnings.len(),
        "plan validation complete"
    );

    ValidationReport {
        schema_valid,
        semantic_valid,
        errors,
        warnings,
        plan: plan.filter(|_| schema_valid),
    }
}
