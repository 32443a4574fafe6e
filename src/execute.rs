//! Plan execution: preview and apply.
//!
//! Both modes walk the actions in order through a single match on
//! [`Action`]. Preview only describes; apply mutates the store, containing
//! each failure in that action's outcome. After an apply run the auto-connect
//! post-pass draws relationships between entities that now share a view.
mod apply;
mod connect;
mod describe;
mod layout;

use crate::model::{EntityStore, ModelStore};
use crate::oracle::CompatibilityOracle;
use crate::plan::{Action, ChangePlan, PlanStatus};
use serde::Serialize;

pub use connect::{auto_connect, ConnectReport};
pub use layout::{grid_position, GridCursor, Placement, DEFAULT_HEIGHT, DEFAULT_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Preview,
    Apply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub mode: Mode,
    /// Skip every action after the first failure.
    pub stop_on_error: bool,
    /// Run the auto-connect post-pass after applying.
    pub auto_connect: bool,
}

impl ExecuteOptions {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            stop_on_error: true,
            auto_connect: true,
        }
    }
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self::new(Mode::Apply)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Applied,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub index: usize,
    pub op: &'static str,
    pub status: OutcomeStatus,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_id: Option<String>,
}

impl ActionOutcome {
    fn applied(index: usize, action: &Action, done: Done) -> Self {
        Self {
            index,
            op: action.op_name(),
            status: OutcomeStatus::Applied,
            description: done.description,
            error: None,
            created_id: done.created_id,
        }
    }

    fn failed(index: usize, action: &Action, err: &anyhow::Error) -> Self {
        Self {
            index,
            op: action.op_name(),
            status: OutcomeStatus::Failed,
            description: String::new(),
            error: Some(format!("{err:#}")),
            created_id: None,
        }
    }

    fn skipped(index: usize, action: &Action) -> Self {
        Self {
            index,
            op: action.op_name(),
            status: OutcomeStatus::Skipped,
            description: "skipped after an earlier failure".to_string(),
            error: None,
            created_id: None,
        }
    }
}

/// What a successful handler reports back.
#[derive(Debug)]
struct Done {
    description: String,
    created_id: Option<String>,
}

impl Done {
    fn new(description: String) -> Self {
        Self {
            description,
            created_id: None,
        }
    }

    fn created(description: String, id: String) -> Self {
        Self {
            description,
            created_id: Some(id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub ok: bool,
    pub mode: Mode,
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<ActionOutcome>,
    pub auto_connected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_connect_error: Option<String>,
    /// Guard message for plans that were not executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<String>,
}

impl ExecutionResult {
    fn empty(mode: Mode) -> Self {
        Self {
            ok: true,
            mode,
            applied: 0,
            failed: 0,
            skipped: 0,
            outcomes: Vec::new(),
            auto_connected: 0,
            auto_connect_error: None,
            message: None,
            questions: Vec::new(),
        }
    }

    fn record(&mut self, outcome: ActionOutcome) {
        match outcome.status {
            OutcomeStatus::Applied => self.applied += 1,
            OutcomeStatus::Failed => self.failed += 1,
            OutcomeStatus::Skipped => self.skipped += 1,
        }
        self.ok = self.failed == 0;
        self.outcomes.push(outcome);
    }
}

/// Refuse plans that are not ready to run.
fn guard(plan: &ChangePlan, mode: Mode) -> Option<ExecutionResult> {
    let mut result = ExecutionResult::empty(mode);
    match plan.status {
        PlanStatus::Ready => return None,
        PlanStatus::NeedsClarification => {
            result.message = Some("plan needs clarification before it can run".to_string());
            result.questions = plan.questions.clone();
        }
        PlanStatus::Refusal => {
            result.message = Some(plan.summary.clone());
        }
    }
    result.ok = false;
    tracing::info!(status = %plan.status, "plan not executed");
    Some(result)
}

/// Run a plan in the mode given by `options`.
///
/// Preview borrows the store mutably here only to share one entry point; use
/// [`preview`] directly when only a shared borrow is available.
pub fn execute<S, O>(
    plan: &ChangePlan,
    store: &mut S,
    oracle: &O,
    options: &ExecuteOptions,
) -> ExecutionResult
where
    S: ModelStore + ?Sized,
    O: CompatibilityOracle + ?Sized,
{
    match options.mode {
        Mode::Preview => preview(plan, &*store, oracle),
        Mode::Apply => apply_plan(plan, store, oracle, options),
    }
}

/// Describe every action without touching the store.
pub fn preview<S, O>(plan: &ChangePlan, store: &S, oracle: &O) -> ExecutionResult
where
    S: EntityStore + ?Sized,
    O: CompatibilityOracle + ?Sized,
{
    if let Some(rejected) = guard(plan, Mode::Preview) {
        return rejected;
    }
    let mut result = ExecutionResult::empty(Mode::Preview);
    let mut ctx = describe::PreviewContext::default();
    for (index, action) in plan.actions.iter().enumerate() {
        let outcome = match describe::describe_action(action, store, oracle, &mut ctx) {
            Ok(description) => ActionOutcome::applied(index, action, Done::new(description)),
            Err(err) => ActionOutcome::failed(index, action, &err),
        };
        result.record(outcome);
    }
    tracing::info!(
        actions = plan.actions.len(),
        failed = result.failed,
        "plan previewed"
    );
    result
}

fn apply_plan<S, O>(
    plan: &ChangePlan,
    store: &mut S,
    oracle: &O,
    options: &ExecuteOptions,
) -> ExecutionResult
where
    S: ModelStore + ?Sized,
    O: CompatibilityOracle + ?Sized,
{
    if let Some(rejected) = guard(plan, Mode::Apply) {
        return rejected;
    }
    let mut result = ExecutionResult::empty(Mode::Apply);
    let mut ctx = apply::ApplyContext::default();
    let mut halted = false;

    for (index, action) in plan.actions.iter().enumerate() {
        if halted {
            result.record(ActionOutcome::skipped(index, action));
            continue;
        }
        match apply::apply_action(action, store, oracle, &mut ctx) {
            Ok(done) => {
                tracing::debug!(index, op = action.op_name(), "action applied");
                result.record(ActionOutcome::applied(index, action, done));
            }
            Err(err) => {
                tracing::warn!(index, op = action.op_name(), error = %format!("{err:#}"), "action failed");
                result.record(ActionOutcome::failed(index, action, &err));
                halted = options.stop_on_error;
            }
        }
    }

    if options.auto_connect && !ctx.touched_views.is_empty() {
        let report = auto_connect(store, &ctx.touched_views);
        result.auto_connected = report.added;
        if let Some(message) = report.error_message() {
            tracing::warn!(error = %message, added = report.added, "auto-connect incomplete");
            result.auto_connect_error = Some(message);
        }
    }

    tracing::info!(
        applied = result.applied,
        failed = result.failed,
        skipped = result.skipped,
        auto_connected = result.auto_connected,
        "plan applied"
    );
    result
}
