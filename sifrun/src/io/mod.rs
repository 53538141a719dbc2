//! Side-effecting operations: config and task files, host filesystem probes,
//! and process execution.

pub mod config;
pub mod host;
pub mod invoker;
pub mod process;
pub mod task_file;
