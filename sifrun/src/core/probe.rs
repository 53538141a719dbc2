//! Host filesystem existence checks used during compilation.

use std::path::Path;

/// Answers whether a host path exists.
///
/// Compilation only reads through this trait, so tests can supply a fixed
/// set of paths instead of touching the host filesystem.
pub trait PathProbe {
    fn exists(&self, path: &Path) -> bool;
}

impl<P: PathProbe + ?Sized> PathProbe for &P {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}
