//! Executor configuration stored as TOML.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Host-level execution policy.
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Allow descriptors that request Docker.
    pub docker_enabled: bool,

    /// Allow descriptors that request Singularity/Apptainer.
    pub singularity_enabled: bool,

    /// Admission ceiling for `coresMin` declarations.
    pub max_cores: u32,

    /// Admission ceiling for `ramMin` declarations, in MiB.
    pub max_ram_mib: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            docker_enabled: true,
            singularity_enabled: true,
            max_cores: 4,
            max_ram_mib: 8192,
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_cores == 0 {
            return Err(anyhow!("max_cores must be > 0"));
        }
        if self.max_ram_mib == 0 {
            return Err(anyhow!("max_ram_mib must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ExecutorConfig::default()`.
pub fn load_config(path: &Path) -> Result<ExecutorConfig> {
    if !path.exists() {
        let cfg = ExecutorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ExecutorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ExecutorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
