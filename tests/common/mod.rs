//! Shared test infrastructure for CLI integration tests.

use archplan::model::MemoryModel;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A temp directory holding a model file and any plans written by a test.
pub struct Workspace {
    dir: TempDir,
}

/// Captured result of one CLI invocation.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}):\n{}", self.stdout))
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Workspace seeded with an empty model that has the standard folders.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let workspace = Self { dir };
        workspace.write_model(&MemoryModel::new("fixture"));
        workspace
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn model_path(&self) -> PathBuf {
        self.path("model.json")
    }

    pub fn write_model(&self, model: &MemoryModel) {
        model.write(&self.model_path()).expect("write model");
    }

    pub fn model(&self) -> MemoryModel {
        read_model(&self.model_path())
    }

    pub fn write_text(&self, name: &str, text: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, text).expect("write fixture file");
        path
    }

    pub fn write_plan(&self, name: &str, plan: &Value) -> PathBuf {
        let text = serde_json::to_string_pretty(plan).expect("serialize plan");
        self.write_text(name, &text)
    }

    /// Run the archplan binary inside the workspace with config lookup isolated.
    pub fn run(&self, args: &[&str]) -> RunResult {
        let output = Command::new(env!("CARGO_BIN_EXE_archplan"))
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("ARCHPLAN_CONFIG")
            .env("XDG_CONFIG_HOME", self.dir.path())
            .env("HOME", self.dir.path())
            .output()
            .expect("run archplan");
        RunResult::from_output(output)
    }
}

pub fn read_model(path: &Path) -> MemoryModel {
    MemoryModel::load(path).expect("load model")
}
