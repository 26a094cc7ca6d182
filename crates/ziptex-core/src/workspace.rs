//! Working area management.
//!
//! All copies of documents and their dependencies live in one scratch
//! directory inside the project:
//!
//! ```text
//! project/
//! ├── paper.tex
//! ├── figures/plot.pdf
//! └── LaTeX/             # working area, removed on drop
//!     ├── paper.tex      # flattened copy
//!     └── plot.pdf
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Scratch directory owning every working copy for one run.
///
/// The directory is removed when the value is dropped unless it was marked
/// to be kept, so early returns and panics clean up as well.
#[derive(Debug)]
pub struct WorkArea {
    path: PathBuf,
    keep: bool,
}

impl WorkArea {
    /// Create the working area. Fails if the path already exists, which
    /// protects leftovers of a crashed or debug run.
    pub fn create(path: impl Into<PathBuf>, keep: bool) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            return Err(Error::AlreadyExists(path));
        }
        fs::create_dir_all(&path)?;
        tracing::debug!("created working area {}", path.display());
        Ok(Self { path, keep })
    }

    /// Path of the working area.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory survives the drop.
    pub fn is_kept(&self) -> bool {
        self.keep
    }

    /// Resolve a relative path inside the working area.
    ///
    /// Returns `None` for absolute paths and paths escaping via `..`.
    pub fn resolve(&self, relative: &Path) -> Option<PathBuf> {
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            None
        } else {
            Some(self.path.join(relative))
        }
    }

    /// Copy `relative` from `root` into the working area, keeping its
    /// relative location.
    pub fn import(&self, root: &Path, relative: &Path) -> Result<PathBuf> {
        let dest = self.resolve(relative).ok_or_else(|| {
            Error::Validation(format!(
                "{} lies outside the project directory",
                relative.display()
            ))
        })?;
        copy_file(&root.join(relative), &dest)?;
        Ok(dest)
    }
}

impl Drop for WorkArea {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            tracing::warn!("could not remove {}: {}", self.path.display(), e);
        }
    }
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}
