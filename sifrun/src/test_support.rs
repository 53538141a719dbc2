//! Test-only helpers: fixed filesystem probes, recording invokers and task
//! file fixtures.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::command::Invocation;
use crate::core::probe::PathProbe;
use crate::error::InvokeError;
use crate::io::invoker::{InvocationOutput, Invoker};

/// Probe that reports only the listed paths as existing.
#[derive(Debug, Clone, Default)]
pub struct FixedProbe(BTreeSet<PathBuf>);

impl FixedProbe {
    pub fn new<S: Into<PathBuf>>(paths: impl IntoIterator<Item = S>) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

impl PathProbe for FixedProbe {
    fn exists(&self, path: &Path) -> bool {
        self.0.contains(path)
    }
}

/// Invoker that records every invocation and never starts a process.
#[derive(Debug)]
pub struct RecordingInvoker {
    calls: RefCell<Vec<Invocation>>,
    failure: Option<(i32, Vec<u8>)>,
}

impl RecordingInvoker {
    /// Every call succeeds with exit code 0 and empty streams.
    pub fn succeeding() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            failure: None,
        }
    }

    /// Every call fails with `exit_code` and `stderr`.
    pub fn failing(exit_code: i32, stderr: Vec<u8>) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            failure: Some((exit_code, stderr)),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }
}

impl Invoker for RecordingInvoker {
    fn invoke(&self, invocation: &Invocation) -> Result<InvocationOutput, InvokeError> {
        self.calls.borrow_mut().push(invocation.clone());
        if let Some((exit_code, stderr)) = &self.failure {
            return Err(InvokeError::ExecutionFailed {
                exit_code: Some(*exit_code),
                stdout: Vec::new(),
                stderr: stderr.clone(),
            });
        }
        Ok(InvocationOutput {
            exit_code: 0,
            stdout: Vec::new(),
            stderr: Vec::new(),
            stdout_truncated: 0,
            stderr_truncated: 0,
            log_path: invocation.redirect.clone(),
        })
    }
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_task_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write task file");
    path
}

/// Create an empty file standing in for a container image.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, b"").expect("touch file");
}

/// Create a temp directory for a test.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}
