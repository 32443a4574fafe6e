//! Change plan pipeline for ArchiMate models.
//!
//! An LM proposes a batch of model mutations as a flat JSON plan. The pipeline
//! extracts and normalizes it ([`plan`]), validates it in two phases
//! ([`validate`]), and previews or applies it ([`execute`]) through the narrow
//! store traits in [`model`].
pub mod archimate;
pub mod cli;
pub mod config;
pub mod execute;
pub mod model;
pub mod oracle;
pub mod plan;
pub mod validate;
pub mod workflow;
