//! Task file load with schema validation.
//!
//! A task file names a built-in task type (`task = "demo"`) or declares an
//! inline `[tool]`, plus its `[inputs]` and extra `mounts`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::Deserialize;

use crate::core::descriptor::ParameterDescriptor;
use crate::core::mount::{MountEntry, MountRule, parse_entries};
use crate::core::resolver::Inputs;
use crate::core::schema::Schema;
use crate::tasks::{Registry, TaskType};

/// JSON Schema every task file must satisfy (Draft 2020-12).
pub const TASK_FILE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/task_file.schema.json"
));

/// Parsed task file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaskFile {
    /// Built-in task type name.
    #[serde(default)]
    pub task: Option<String>,
    /// Inline tool definition, used instead of `task`.
    #[serde(default)]
    pub tool: Option<ToolDefinition>,
    /// Appended after the configured site mounts.
    #[serde(default)]
    pub mounts: Vec<MountEntry>,
    #[serde(default)]
    pub inputs: Inputs,
}

/// `[tool]` table: an ad-hoc task type.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    /// Inner command run inside the container.
    #[serde(default)]
    pub command: Option<String>,
    pub params: Vec<ParameterDescriptor>,
}

impl TaskFile {
    /// Read, schema-check and parse the task file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read task file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("load task file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let raw: toml::Value = toml::from_str(contents).context("parse task file toml")?;
        let instance = serde_json::to_value(&raw).context("convert task file to json")?;
        validate_schema(&instance)?;
        let task_file: TaskFile = toml::from_str(contents).context("deserialize task file")?;
        Ok(task_file)
    }

    /// Task type this file runs: a registry entry or the inline tool.
    pub fn task_type(&self, registry: &Registry) -> Result<TaskType> {
        match (&self.task, &self.tool) {
            (Some(name), None) => registry
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("unknown task type '{name}'")),
            (None, Some(tool)) => tool.task_type(),
            _ => Err(anyhow!("task file must set exactly one of 'task' or 'tool'")),
        }
    }

    /// `site` mounts followed by this file's own mounts.
    pub fn mount_rules(&self, site: &[MountEntry]) -> Result<Vec<MountRule>> {
        let mut rules = parse_entries(site).context("configured mounts")?;
        rules.extend(parse_entries(&self.mounts).context("task file mounts")?);
        Ok(rules)
    }
}

impl ToolDefinition {
    pub fn task_type(&self) -> Result<TaskType> {
        let schema = Schema::new(self.params.clone())
            .with_context(|| format!("tool '{}' parameters", self.name))?;
        Ok(TaskType {
            name: self.name.clone(),
            summary: self.summary.clone(),
            container_command: self.command.clone(),
            schema,
        })
    }
}

fn validate_schema(instance: &serde_json::Value) -> Result<()> {
    let schema_value: serde_json::Value =
        serde_json::from_str(TASK_FILE_SCHEMA).context("parse task file schema")?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(instance) {
        let messages = compiled
            .iter_errors(instance)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "task file schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}
