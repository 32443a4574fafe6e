//! Command implementations behind the CLI.
use crate::cli::{ApplyArgs, ConfigArgs, NormalizeArgs, PreviewArgs, SchemaArgs, ValidateArgs};
use crate::config::{config_stub, resolve_config, EngineConfig};
use crate::execute::{execute, preview, ExecutionResult, Mode, OutcomeStatus};
use crate::model::MemoryModel;
use crate::oracle::ArchimateRules;
use crate::plan::{load_plan_value, normalize, output_schema, ChangePlan};
use crate::validate::{validate, Scope, ValidationReport};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub fn run_schema(args: SchemaArgs) -> Result<()> {
    let text =
        serde_json::to_string_pretty(&output_schema()).context("serialize output schema")?;
    emit(&text, args.out.as_deref())
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    emit(&config_stub()?, args.out.as_deref())
}

pub fn run_normalize(args: NormalizeArgs) -> Result<()> {
    let raw = load_normalized(&args.plan)?;
    let text = serde_json::to_string_pretty(&raw).context("serialize normalized plan")?;
    emit(&text, args.out.as_deref())
}

pub fn run_validate(args: ValidateArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    let raw = load_normalized(&args.plan)?;
    warn_on_version_mismatch(&raw, &config);
    let model = MemoryModel::load(&args.model)?;
    let scope = args.scope.map(Scope::new);
    let report = validate(&raw, &model, &ArchimateRules, scope.as_ref());

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("serialize validation report")?;
        println!("{text}");
    } else {
        print_report(&report);
    }
    if !report.is_valid() {
        return Err(anyhow!(
            "plan failed validation ({} error(s))",
            report.errors.len()
        ));
    }
    Ok(())
}

pub fn run_preview(args: PreviewArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    let raw = load_normalized(&args.plan)?;
    warn_on_version_mismatch(&raw, &config);
    let model = MemoryModel::load(&args.model)?;
    let plan = validated_plan(&raw, &model)?;
    let result = preview(&plan, &model, &ArchimateRules);
    finish(&result, args.json)
}

pub fn run_apply(args: ApplyArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    let mut options = config.execute_options(Mode::Apply);
    if args.continue_on_error {
        options.stop_on_error = false;
    }
    if args.no_auto_connect {
        options.auto_connect = false;
    }

    let raw = load_normalized(&args.plan)?;
    warn_on_version_mismatch(&raw, &config);
    let mut model = MemoryModel::load(&args.model)?;
    let plan = validated_plan(&raw, &model)?;
    let result = execute(&plan, &mut model, &ArchimateRules, &options);

    if result.applied > 0 {
        let out = args.out.as_deref().unwrap_or(args.model.as_path());
        model.write(out)?;
        if !args.json {
            eprintln!("wrote {}", out.display());
        }
    }
    finish(&result, args.json)
}

fn load_normalized(path: &Path) -> Result<Value> {
    let extracted = load_plan_value(path)?;
    tracing::debug!(source = ?extracted.source, "plan extracted");
    let mut raw = extracted.value;
    normalize(&mut raw);
    Ok(raw)
}

/// Validate and decode, refusing invalid plans; warnings go to stderr.
fn validated_plan(raw: &Value, model: &MemoryModel) -> Result<ChangePlan> {
    let report = validate(raw, model, &ArchimateRules, None);
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    if !report.is_valid() {
        for error in &report.errors {
            eprintln!("error: {error}");
        }
        return Err(anyhow!(
            "plan failed validation ({} error(s))",
            report.errors.len()
        ));
    }
    report
        .plan
        .ok_or_else(|| anyhow!("validated plan missing from report"))
}

fn warn_on_version_mismatch(raw: &Value, config: &EngineConfig) {
    if let Some(version) = raw.get("schema_version").and_then(Value::as_str) {
        if version != config.schema_version {
            eprintln!(
                "warning: plan schema_version {version} differs from configured {}",
                config.schema_version
            );
        }
    }
}

fn print_report(report: &ValidationReport) {
    let phase = |valid: bool| if valid { "ok" } else { "failed" };
    println!("schema: {}", phase(report.schema_valid));
    if report.schema_valid {
        println!("semantic: {}", phase(report.semantic_valid));
    } else {
        println!("semantic: skipped");
    }
    for error in &report.errors {
        println!("error: {error}");
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
}

fn finish(result: &ExecutionResult, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(result).context("serialize execution result")?;
        println!("{text}");
    } else {
        print_result(result);
    }
    if result.ok {
        return Ok(());
    }
    match &result.message {
        Some(message) => Err(anyhow!("plan not executed: {message}")),
        None => Err(anyhow!("{} action(s) failed", result.failed)),
    }
}

fn print_result(result: &ExecutionResult) {
    if let Some(message) = &result.message {
        println!("{message}");
        for question in &result.questions {
            println!("  ? {question}");
        }
        return;
    }
    for outcome in &result.outcomes {
        let marker = match outcome.status {
            OutcomeStatus::Applied => "+",
            OutcomeStatus::Failed => "!",
            OutcomeStatus::Skipped => "-",
        };
        match &outcome.error {
            Some(error) => println!("{marker} [{}] {}: {error}", outcome.index, outcome.op),
            None => println!("{marker} [{}] {}", outcome.index, outcome.description),
        }
    }
    println!(
        "applied={} failed={} skipped={} auto_connected={}",
        result.applied, result.failed, result.skipped, result.auto_connected
    );
    if let Some(error) = &result.auto_connect_error {
        println!("auto-connect failed: {error}");
    }
}

fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create parent dir {}", parent.display()))?;
            }
            fs::write(path, text.as_bytes())
                .with_context(|| format!("write {}", path.display()))?;
            eprintln!("wrote {}", path.display());
            Ok(())
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
