use anyhow::Result;
use archplan::cli::{Command, RootArgs};
use archplan::workflow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ARCHPLAN_LOG";

fn main() -> Result<()> {
    let args = RootArgs::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match args.command {
        Command::Schema(args) => workflow::run_schema(args),
        Command::Config(args) => workflow::run_config(args),
        Command::Normalize(args) => workflow::run_normalize(args),
        Command::Validate(args) => workflow::run_validate(args),
        Command::Preview(args) => workflow::run_preview(args),
        Command::Apply(args) => workflow::run_apply(args),
    }
}
