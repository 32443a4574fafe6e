//! Change plan wire format and typed model.
//!
//! - [`catalog`]: op contracts, normalization, producer schema
//! - [`envelope`]: extraction from raw producer output
//! - [`model`]: `ChangePlan` and the tagged `Action` enum
pub mod catalog;
mod envelope;
mod model;

pub use catalog::{normalize, output_schema, OpKind};
pub use envelope::{extract_plan, load_plan_value, ExtractedPlan, PlanSource};
pub use model::{Action, ChangePlan, PlanStatus, SchemaVersion};
