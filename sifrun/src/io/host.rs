//! Host filesystem probe.

use std::path::Path;

use crate::core::probe::PathProbe;

/// Checks paths against the real host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFilesystem;

impl PathProbe for HostFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
