//! `sifrun run`: compile a task file, then execute the container command.

use anyhow::Result;
use tracing::{info, instrument};

use crate::compile::{CompileOutcome, compile_task};
use crate::core::probe::PathProbe;
use crate::io::config::SifrunConfig;
use crate::io::invoker::{InvocationOutput, Invoker};
use crate::io::task_file::TaskFile;
use crate::tasks::Registry;

/// A completed run: what was compiled and what the process produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub compiled: CompileOutcome,
    pub output: InvocationOutput,
}

/// Compile `task_file` and invoke the result.
///
/// Compilation errors return before the invoker is called. Invoker errors
/// are returned as [`crate::error::InvokeError`] inside the `anyhow` chain.
#[instrument(skip_all, fields(task = task_file.task.as_deref()))]
pub fn run_task<P: PathProbe, I: Invoker>(
    task_file: &TaskFile,
    config: &SifrunConfig,
    registry: &Registry,
    probe: P,
    invoker: &I,
) -> Result<RunOutcome> {
    let compiled = compile_task(task_file, config, registry, probe)?;
    let invocation = compiled.command.invocation();
    info!(task = %compiled.task, cmdline = %compiled.command.cmdline(), "invoking");
    let output = invoker.invoke(&invocation)?;
    Ok(RunOutcome { compiled, output })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::error::{CompileError, InvokeError};
    use crate::test_support::{FixedProbe, RecordingInvoker};

    fn registry() -> Registry {
        Registry::builtin().expect("registry")
    }

    #[test]
    fn missing_mandatory_never_invokes() {
        let task_file = TaskFile::parse(
            r#"
task = "demo"

[inputs]
myarg = "x"
"#,
        )
        .expect("parse");
        let invoker = RecordingInvoker::succeeding();
        let err = run_task(
            &task_file,
            &SifrunConfig::default(),
            &registry(),
            FixedProbe::default(),
            &invoker,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<CompileError>(),
            Some(&CompileError::MissingMandatoryParameter(
                "container".to_string()
            ))
        );
        assert!(invoker.calls().is_empty());
    }

    #[test]
    fn invokes_argv_with_log_redirect() {
        let task_file = TaskFile::parse(
            r#"
task = "demo"

[inputs]
container = "/images/demo.sif"
log_file = "/logs/run.log"
myarg = "7"
"#,
        )
        .expect("parse");
        let invoker = RecordingInvoker::succeeding();
        let outcome = run_task(
            &task_file,
            &SifrunConfig::default(),
            &registry(),
            FixedProbe::new(["/images/demo.sif"]),
            &invoker,
        )
        .expect("run");

        let calls = invoker.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].argv,
            vec![
                "singularity",
                "run",
                "/images/demo.sif",
                "mycmd",
                "--myarg",
                "7"
            ]
        );
        assert_eq!(calls[0].redirect, Some(PathBuf::from("/logs/run.log")));
        assert_eq!(outcome.output.exit_code, 0);
    }

    #[test]
    fn execution_failure_is_surfaced() {
        let task_file = TaskFile::parse(
            r#"
task = "demo"

[inputs]
container = "/images/demo.sif"
"#,
        )
        .expect("parse");
        let invoker = RecordingInvoker::failing(2, b"boom".to_vec());
        let err = run_task(
            &task_file,
            &SifrunConfig::default(),
            &registry(),
            FixedProbe::new(["/images/demo.sif"]),
            &invoker,
        )
        .unwrap_err();
        match err.downcast_ref::<InvokeError>() {
            Some(InvokeError::ExecutionFailed {
                exit_code, stderr, ..
            }) => {
                assert_eq!(*exit_code, Some(2));
                assert_eq!(stderr, b"boom");
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
        assert_eq!(invoker.calls().len(), 1);
    }
}
