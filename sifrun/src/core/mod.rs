//! Deterministic, pure logic for compiling container task commands.
//!
//! Core modules perform no I/O of their own. Host existence checks go through
//! the [`probe::PathProbe`] seam so callers decide what "exists" means.

pub mod command;
pub mod compiler;
pub mod descriptor;
pub mod mount;
pub mod probe;
pub mod resolver;
pub mod schema;
pub mod template;
pub mod value;
