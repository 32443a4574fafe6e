//! Engine configuration.
//!
//! Config is a small JSON file; every field has a default so an empty object
//! (or no file at all) is a valid configuration.
use crate::execute::{ExecuteOptions, Mode};
use crate::plan::catalog::SCHEMA_VERSIONS;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "ARCHPLAN_CONFIG";
pub const DEFAULT_SCHEMA_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Plans declaring another version are flagged before validation.
    pub schema_version: String,
    pub stop_on_error: bool,
    pub auto_connect: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            stop_on_error: true,
            auto_connect: true,
        }
    }
}

impl EngineConfig {
    pub fn execute_options(&self, mode: Mode) -> ExecuteOptions {
        ExecuteOptions {
            mode,
            stop_on_error: self.stop_on_error,
            auto_connect: self.auto_connect,
        }
    }
}

/// Render a pretty JSON config stub.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&EngineConfig::default()).context("serialize config stub")
}

pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: EngineConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &EngineConfig) -> Result<()> {
    if !SCHEMA_VERSIONS.contains(&config.schema_version.as_str()) {
        return Err(anyhow!(
            "unsupported schema_version {:?} (expected one of {})",
            config.schema_version,
            SCHEMA_VERSIONS.join(", ")
        ));
    }
    Ok(())
}

/// Config path with fallback: explicit arg > env var > user config dir.
///
/// The user config dir path is only returned when the file exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("archplan").join("config.json"))
        .filter(|path| path.is_file())
}

/// Load the resolved config, or defaults when none is configured.
pub fn resolve_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config(&path)
        }
        None => Ok(EngineConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").expect("write config");
        assert_eq!(load_config(&path).expect("load"), EngineConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"stop_on_error": false, "schema_version": "1.0"}"#)
            .expect("write config");
        let config = load_config(&path).expect("load");
        assert!(!config.stop_on_error);
        assert!(config.auto_connect);
        let options = config.execute_options(Mode::Apply);
        assert!(!options.stop_on_error);
        assert_eq!(options.mode, Mode::Apply);
    }

    #[test]
    fn unsupported_versions_and_unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"schema_version": "9.9"}"#).expect("write config");
        let err = load_config(&path).expect_err("bad version");
        assert!(err.to_string().contains("unsupported schema_version"));

        fs::write(&path, r#"{"stop_on_eror": false}"#).expect("write config");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let explicit = Path::new("/tmp/explicit.json");
        assert_eq!(
            resolve_config_path(Some(explicit)),
            Some(explicit.to_path_buf())
        );
    }

    #[test]
    fn stub_parses_back() {
        let stub = config_stub().expect("stub");
        let parsed: EngineConfig = serde_json::from_str(&stub).expect("parse stub");
        assert_eq!(parsed, EngineConfig::default());
    }
}
