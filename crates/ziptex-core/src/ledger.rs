//! Files made redundant by inlining.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;

/// Ordered, deduplicated record of files that were embedded into a
/// document and must not be archived on their own.
///
/// Paths are relative to the working area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    files: IndexSet<PathBuf>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an inlined file. Returns `false` if it was already recorded.
    pub fn record(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        tracing::debug!("ledger: {}", path.display());
        self.files.insert(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Delete every recorded file from `dir`. Missing files are ignored.
    pub fn purge(&self, dir: &Path) {
        for file in &self.files {
            let path = dir.join(file);
            match fs::remove_file(&path) {
                Ok(()) => tracing::info!("cleaning up {}", file.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("could not remove {}: {}", path.display(), e),
            }
        }
    }
}
