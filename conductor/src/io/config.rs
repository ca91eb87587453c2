//! Conductor configuration stored in `conductor.toml` at the project root.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::atomic::write_atomic;
use crate::io::layout::{LayoutConfig, ProjectLayout};

/// Default config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "conductor.toml";

/// Conductor configuration (TOML).
///
/// Intended to be edited by humans. Missing fields default to the
/// `.claude/{agents,tasks}` layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConductorConfig {
    /// Reject session documents with missing sections or malformed phase
    /// lines instead of reading them permissively.
    pub strict_phase_lines: bool,

    pub layout: LayoutConfig,
}

impl ConductorConfig {
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        for (field, value) in [
            ("layout.control_dir", &layout.control_dir),
            ("layout.agents_dir", &layout.agents_dir),
            ("layout.tasks_dir", &layout.tasks_dir),
            ("layout.registry_file", &layout.registry_file),
            ("layout.session_prefix", &layout.session_prefix),
            ("layout.current_name", &layout.current_name),
        ] {
            validate_name(field, value)?;
        }
        if layout.current_name.parse::<u32>().is_ok() {
            return Err(anyhow!(
                "layout.current_name must not be numeric (collides with archived sessions)"
            ));
        }
        Ok(())
    }

    pub fn layout_for(&self, root: &Path) -> ProjectLayout {
        ProjectLayout::new(root, &self.layout)
    }
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{field} must not be empty"));
    }
    if value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(anyhow!("{field} must be a single path component (got '{value}')"));
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ConductorConfig::default()`.
pub fn load_config(path: &Path) -> Result<ConductorConfig> {
    if !path.exists() {
        let cfg = ConductorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ConductorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ConductorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join(CONFIG_FILE)).expect("load");
        assert_eq!(cfg, ConductorConfig::default());
        assert!(!cfg.strict_phase_lines);
        assert_eq!(cfg.layout.control_dir, ".claude");
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        let cfg = ConductorConfig {
            strict_phase_lines: true,
            layout: LayoutConfig {
                control_dir: ".orchestra".to_string(),
                ..LayoutConfig::default()
            },
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    /// Partial files only override the keys they name.
    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[layout]\ntasks_dir = \"runs\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.layout.tasks_dir, "runs");
        assert_eq!(cfg.layout.agents_dir, "agents");
        assert!(!cfg.strict_phase_lines);
    }

    #[test]
    fn validate_rejects_nested_or_numeric_names() {
        let mut cfg = ConductorConfig::default();
        cfg.layout.agents_dir = "a/b".to_string();
        let err = cfg.validate().expect_err("nested");
        assert!(err.to_string().contains("single path component"));

        let mut cfg = ConductorConfig::default();
        cfg.layout.current_name = "3".to_string();
        let err = cfg.validate().expect_err("numeric");
        assert!(err.to_string().contains("must not be numeric"));

        let mut cfg = ConductorConfig::default();
        cfg.layout.registry_file = " ".to_string();
        assert!(cfg.validate().is_err());
    }
}
