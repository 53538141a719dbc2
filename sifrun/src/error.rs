//! Typed errors for compilation and invocation.
//!
//! Compile-time errors are fatal to the compilation attempt and are raised
//! before any process is launched.

use thiserror::Error;

/// Errors raised while building a schema or compiling a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A mandatory parameter resolved to undefined.
    #[error("missing mandatory parameter: {0}")]
    MissingMandatoryParameter(String),

    /// Joined mount entry without a `host:container` separator.
    #[error("malformed mount rule '{0}' (expected host:container)")]
    MalformedMountRule(String),

    /// A parameter marked `exists_required` names a missing host path.
    #[error("parameter {name}: host path not found: {path}")]
    HostPathNotFound { name: String, path: String },

    /// Input names a parameter the task type does not declare.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// Value type does not fit the descriptor kind or template.
    #[error("parameter {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    /// Schema construction or merge failed.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("invalid template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// `name_source` references loop back to this parameter.
    #[error("derivation cycle through parameter {0}")]
    DerivationCycle(String),
}

/// Errors raised while running a compiled command.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The process exited non-zero (or was killed by a signal, `exit_code = None`).
    #[error("execution failed with exit code {exit_code:?}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },

    #[error("compiled command has no program")]
    EmptyCommand,

    /// Spawning, waiting on, or capturing the child failed.
    #[error(transparent)]
    Process(#[from] anyhow::Error),
}

pub type CompileResult<T> = std::result::Result<T, CompileError>;
