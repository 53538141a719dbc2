//! Argument compilation and path translation for containerized tool runs.
//!
//! A task type declares its parameters as a static descriptor table. The
//! compiler merges that table with the container runtime's base table,
//! resolves every value (explicit or derived), rewrites host paths into
//! container paths, and emits one deterministically ordered command.
//!
//! - **[`core`]**: Pure, deterministic logic (mount translation, resolution,
//!   merge, compilation). No I/O beyond the [`core::probe::PathProbe`] seam.
//! - **[`io`]**: Side-effecting operations (config and task files, host
//!   filesystem, process execution). Isolated to enable mocking in tests.
//!
//! Orchestration modules ([`compile`], [`run`]) coordinate core logic with
//! I/O to implement CLI commands.

pub mod compile;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod run;
pub mod tasks;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
