//! CLI argument parsing for the change plan pipeline.
//!
//! The CLI is thin: each command loads its inputs, calls one pipeline stage,
//! and prints the result.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "archplan",
    version,
    about = "Validate, preview, and apply LM change plans against an ArchiMate model",
    after_help = "Commands:\n  schema                               Print the flattened plan output schema\n  config                               Print a default config file\n  normalize --plan <file>              Null out fields outside each action's contract\n  validate --plan <file> --model <m>   Run schema and semantic validation\n  preview --plan <file> --model <m>    Describe what the plan would do\n  apply --plan <file> --model <m>      Apply the plan and write the model\n\nExamples:\n  archplan schema --out plan.schema.json\n  archplan config --out ~/.config/archplan/config.json\n  archplan validate --plan response.json --model model.json --scope element-3,element-7\n  archplan preview --plan response.json --model model.json\n  archplan apply --plan response.json --model model.json --out model.next.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Schema(SchemaArgs),
    Config(ConfigArgs),
    Normalize(NormalizeArgs),
    Validate(ValidateArgs),
    Preview(PreviewArgs),
    Apply(ApplyArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Print the flattened JSON schema handed to plan producers")]
pub struct SchemaArgs {
    /// Write the schema here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Print a config file holding every default")]
pub struct ConfigArgs {
    /// Write the config here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Normalize a plan so each action carries only its own fields")]
pub struct NormalizeArgs {
    /// Plan JSON or raw LM response containing one
    #[arg(long, value_name = "PATH")]
    pub plan: PathBuf,

    /// Write the normalized plan here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Validate a plan against a model")]
pub struct ValidateArgs {
    /// Plan JSON or raw LM response containing one
    #[arg(long, value_name = "PATH")]
    pub plan: PathBuf,

    /// Model JSON file
    #[arg(long, value_name = "PATH")]
    pub model: PathBuf,

    /// Comma-separated ids the plan may touch
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub scope: Option<Vec<String>>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Config file (defaults to $ARCHPLAN_CONFIG, then the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Describe each action without changing the model")]
pub struct PreviewArgs {
    /// Plan JSON or raw LM response containing one
    #[arg(long, value_name = "PATH")]
    pub plan: PathBuf,

    /// Model JSON file
    #[arg(long, value_name = "PATH")]
    pub model: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Config file (defaults to $ARCHPLAN_CONFIG, then the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Apply a validated plan and write the updated model")]
pub struct ApplyArgs {
    /// Plan JSON or raw LM response containing one
    #[arg(long, value_name = "PATH")]
    pub plan: PathBuf,

    /// Model JSON file
    #[arg(long, value_name = "PATH")]
    pub model: PathBuf,

    /// Write the updated model here instead of overwriting --model
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Keep applying after a failed action
    #[arg(long)]
    pub continue_on_error: bool,

    /// Skip drawing relationships between entities placed on the same view
    #[arg(long)]
    pub no_auto_connect: bool,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Config file (defaults to $ARCHPLAN_CONFIG, then the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
