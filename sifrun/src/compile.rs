//! Compilation for `sifrun compile` and `sifrun run`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::command::CompiledCommand;
use crate::core::compiler::Compiler;
use crate::core::probe::PathProbe;
use crate::io::config::SifrunConfig;
use crate::io::task_file::TaskFile;
use crate::tasks::Registry;

/// Compiled task with the name of the task type that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutcome {
    pub task: String,
    pub command: CompiledCommand,
}

/// Compile a parsed task file against the registry's runtime base schema.
///
/// Configured mounts precede the task file's own mounts, so they win when
/// prefixes overlap.
#[instrument(skip_all, fields(task = task_file.task.as_deref()))]
pub fn compile_task<P: PathProbe>(
    task_file: &TaskFile,
    config: &SifrunConfig,
    registry: &Registry,
    probe: P,
) -> Result<CompileOutcome> {
    let task = task_file.task_type(registry)?;
    let mounts = task_file.mount_rules(&config.mounts)?;
    debug!(task = %task.name, mounts = mounts.len(), inputs = task_file.inputs.len(), "compiling task");

    let compiler = Compiler::new(config.runtime.clone(), probe);
    let command = task
        .compile(&compiler, registry.base(), &task_file.inputs, &mounts)
        .with_context(|| format!("compile task '{}'", task.name))?;
    debug!(tokens = command.tokens.len(), "compiled");
    Ok(CompileOutcome {
        task: task.name,
        command,
    })
}

/// Load the task file at `path` and compile it.
pub fn compile_path<P: PathProbe>(
    path: &Path,
    config: &SifrunConfig,
    registry: &Registry,
    probe: P,
) -> Result<CompileOutcome> {
    let task_file = TaskFile::load(path)?;
    compile_task(&task_file, config, registry, probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::io::config::SifrunConfig;
    use crate::test_support::FixedProbe;

    fn registry() -> Registry {
        Registry::builtin().expect("registry")
    }

    #[test]
    fn compiles_demo_task_with_default_inner_command() {
        let task_file = TaskFile::parse(
            r#"
task = "demo"
mounts = ["/data:/input"]

[inputs]
container = "/images/demo.sif"
dwiFile = "/data/sub1/dwi.nrrd"
returnParameterFile = true
"#,
        )
        .expect("parse");
        let probe = FixedProbe::new(["/images/demo.sif", "/data/sub1/dwi.nrrd"]);
        let outcome =
            compile_task(&task_file, &SifrunConfig::default(), &registry(), probe).expect("compile");
        assert_eq!(outcome.task, "demo");
        assert_eq!(
            outcome.command.cmdline(),
            "singularity run -B /data:/input /images/demo.sif mycmd \
             --dwiFile /input/sub1/dwi.nrrd --returnparameterfile dwi_params.txt"
        );
    }

    #[test]
    fn configured_mounts_precede_task_mounts() {
        let task_file = TaskFile::parse(
            r#"
task = "demo"
mounts = ["/data:/other"]

[inputs]
container = "/images/demo.sif"
"#,
        )
        .expect("parse");
        let config = SifrunConfig {
            mounts: vec![crate::core::mount::MountEntry::Joined("/data:/input".to_string())],
            ..SifrunConfig::default()
        };
        let outcome = compile_task(
            &task_file,
            &config,
            &registry(),
            FixedProbe::new(["/images/demo.sif"]),
        )
        .expect("compile");
        let binds: Vec<String> = outcome
            .command
            .tokens_for("bind_mounts")
            .map(|token| token.render())
            .collect();
        assert_eq!(binds, vec!["-B /data:/input", "-B /data:/other"]);
    }

    #[test]
    fn missing_container_keeps_typed_error() {
        let task_file = TaskFile::parse("task = \"demo\"\n").expect("parse");
        let err = compile_task(
            &task_file,
            &SifrunConfig::default(),
            &registry(),
            FixedProbe::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<CompileError>(),
            Some(&CompileError::MissingMandatoryParameter(
                "container".to_string()
            ))
        );
    }
}
