//! Runtime configuration stored in `sifrun.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::compiler::RuntimeSpec;
use crate::core::mount::{MountEntry, parse_entries};

pub const DEFAULT_CONFIG_FILE: &str = "sifrun.toml";

/// sifrun configuration (TOML).
///
/// Intended to be edited by humans. Missing fields default to a Singularity
/// runtime with no site-wide mounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SifrunConfig {
    /// Keep at most this many bytes of captured stdout/stderr per stream.
    pub output_limit_bytes: usize,

    /// Mounts prepended to every task's mount list.
    pub mounts: Vec<MountEntry>,

    pub runtime: RuntimeSpec,
}

impl Default for SifrunConfig {
    fn default() -> Self {
        Self {
            output_limit_bytes: 1_000_000,
            mounts: Vec::new(),
            runtime: RuntimeSpec::default(),
        }
    }
}

impl SifrunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.runtime.binary.trim().is_empty() {
            return Err(anyhow!("runtime.binary must be non-empty"));
        }
        if self.runtime.subcommand.trim().is_empty() {
            return Err(anyhow!("runtime.subcommand must be non-empty"));
        }
        parse_entries(&self.mounts).context("mounts")?;
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SifrunConfig::default()`.
pub fn load_config(path: &Path) -> Result<SifrunConfig> {
    if !path.exists() {
        let cfg = SifrunConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SifrunConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SifrunConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
