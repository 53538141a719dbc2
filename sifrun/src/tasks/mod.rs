//! Statically declared task types.
//!
//! Each task type pairs an extension schema with the inner command it runs.
//! Tables are built once by [`Registry::builtin`] and never mutated.

pub mod demo;
pub mod runtime;

use crate::core::command::CompiledCommand;
use crate::core::compiler::Compiler;
use crate::core::mount::MountRule;
use crate::core::probe::PathProbe;
use crate::core::resolver::Inputs;
use crate::core::schema::{Schema, merge};
use crate::core::value::Value;
use crate::error::CompileResult;

use runtime::CONTAINER_COMMAND_PARAM;

/// A tool integration: extension schema plus default inner command.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskType {
    pub name: String,
    pub summary: String,
    /// Default for `container_command` when the caller gives none.
    pub container_command: Option<String>,
    pub schema: Schema,
}

impl TaskType {
    /// Compile this task against `base`, filling the default inner command.
    pub fn compile<P: PathProbe>(
        &self,
        compiler: &Compiler<P>,
        base: &Schema,
        inputs: &Inputs,
        mounts: &[MountRule],
    ) -> CompileResult<CompiledCommand> {
        let mut inputs = inputs.clone();
        if let Some(command) = &self.container_command {
            inputs
                .entry(CONTAINER_COMMAND_PARAM.to_string())
                .or_insert_with(|| Value::Str(command.clone()));
        }
        compiler.compile(base, &self.schema, &inputs, mounts)
    }

    /// The merged table as the compiler sees it (shifted positions).
    pub fn merged_schema(&self, base: &Schema) -> CompileResult<Schema> {
        merge(base, &self.schema)
    }
}

/// Runtime base schema plus the built-in task types.
#[derive(Debug, Clone)]
pub struct Registry {
    base: Schema,
    tasks: Vec<TaskType>,
}

impl Registry {
    pub fn builtin() -> CompileResult<Self> {
        Ok(Self {
            base: runtime::runtime_schema()?,
            tasks: vec![demo::task()?],
        })
    }

    pub fn base(&self) -> &Schema {
        &self.base
    }

    pub fn tasks(&self) -> &[TaskType] {
        &self.tasks
    }

    pub fn get(&self, name: &str) -> Option<&TaskType> {
        self.tasks.iter().find(|task| task.name == name)
    }
}
