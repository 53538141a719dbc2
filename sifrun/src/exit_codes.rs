//! Stable exit codes for sifrun CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid config, task file or inputs, or a compile error.
pub const INVALID: i32 = 1;
/// `sifrun run` launched the container command and it exited non-zero.
pub const EXECUTION_FAILED: i32 = 3;
