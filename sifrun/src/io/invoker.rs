//! Command invoker: runs a compiled invocation as one blocking child process.
//!
//! The [`Invoker`] trait decouples orchestration from process spawning. Tests
//! use recording invokers that never start a process.

use std::path::PathBuf;
use std::process::Command;

use tracing::{info, instrument, warn};

use crate::core::command::Invocation;
use crate::error::InvokeError;
use crate::io::process::{CommandOutput, run_command_captured, run_command_redirected};

/// Result of a successful (exit code 0) invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    /// File that received combined output, when the command redirected it.
    pub log_path: Option<PathBuf>,
}

/// Abstraction over process execution.
pub trait Invoker {
    /// Run `invocation`. Non-zero exit is reported as [`InvokeError::ExecutionFailed`].
    fn invoke(&self, invocation: &Invocation) -> Result<InvocationOutput, InvokeError>;
}

/// Invoker that spawns the program directly (no shell).
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    output_limit_bytes: usize,
}

impl ProcessInvoker {
    pub fn new(output_limit_bytes: usize) -> Self {
        Self { output_limit_bytes }
    }
}

impl Invoker for ProcessInvoker {
    #[instrument(skip_all, fields(program = invocation.argv.first().map(String::as_str), redirected = invocation.redirect.is_some()))]
    fn invoke(&self, invocation: &Invocation) -> Result<InvocationOutput, InvokeError> {
        let (program, args) = invocation
            .argv
            .split_first()
            .ok_or(InvokeError::EmptyCommand)?;
        info!(argc = args.len(), "starting container command");

        let mut cmd = Command::new(program);
        cmd.args(args);

        let output = match &invocation.redirect {
            Some(log_path) => run_command_redirected(cmd, log_path),
            None => run_command_captured(cmd, self.output_limit_bytes),
        }
        .map_err(|err| InvokeError::Process(err.context(format!("run {program}"))))?;

        into_result(output, invocation.redirect.clone())
    }
}

fn into_result(
    output: CommandOutput,
    log_path: Option<PathBuf>,
) -> Result<InvocationOutput, InvokeError> {
    if !output.status.success() {
        warn!(exit_code = ?output.status.code(), "container command failed");
        return Err(InvokeError::ExecutionFailed {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        });
    }
    Ok(InvocationOutput {
        exit_code: output.status.code().unwrap_or(0),
        stdout: output.stdout,
        stderr: output.stderr,
        stdout_truncated: output.stdout_truncated,
        stderr_truncated: output.stderr_truncated,
        log_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_argv_is_rejected() {
        let err = ProcessInvoker::new(100)
            .invoke(&Invocation::new(Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, InvokeError::EmptyCommand));
    }

    #[test]
    fn missing_program_is_a_process_error() {
        let err = ProcessInvoker::new(100)
            .invoke(&Invocation::new(["sifrun-test-no-such-program"]))
            .unwrap_err();
        assert!(matches!(err, InvokeError::Process(_)));
        assert!(err.to_string().contains("sifrun-test-no-such-program"));
    }

    #[cfg(unix)]
    #[test]
    fn successful_command_returns_captured_streams() {
        let output = ProcessInvoker::new(1000)
            .invoke(&Invocation::new(["sh", "-c", "echo hello; echo oops >&2"]))
            .expect("invoke");
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout, b"hello\n");
        assert_eq!(output.stderr, b"oops\n");
        assert_eq!(output.log_path, None);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_code_and_streams() {
        let err = ProcessInvoker::new(1000)
            .invoke(&Invocation::new(["sh", "-c", "echo partial; echo bad >&2; exit 3"]))
            .unwrap_err();
        match err {
            InvokeError::ExecutionFailed {
                exit_code,
                stdout,
                stderr,
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stdout, b"partial\n");
                assert_eq!(stderr, b"bad\n");
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn redirect_writes_combined_output_to_log() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log_path = temp.path().join("logs").join("run.log");
        let output = ProcessInvoker::new(1000)
            .invoke(
                &Invocation::new(["sh", "-c", "echo to-out; echo to-err >&2"])
                    .redirect_to(&log_path),
            )
            .expect("invoke");
        assert!(output.stdout.is_empty());
        assert_eq!(output.log_path.as_deref(), Some(log_path.as_path()));
        let log = std::fs::read_to_string(&log_path).expect("read log");
        assert_eq!(log, "to-out\nto-err\n");
    }
}
