//! Archive writers.
//!
//! Both formats open their destination with create-new semantics, so an
//! existing file at the target path is reported and never modified.

mod tarbz2;
mod zipfile;

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::toolchain::Toolchain;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Deflate-compressed ZIP
    Zip,
    /// tar compressed by the external bzip2
    TarBz2,
}

impl ArchiveFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarBz2 => "tar.bz2",
        }
    }

    /// Archive file name for `base`.
    pub fn file_name(self, base: &str) -> String {
        format!("{}.{}", base, self.extension())
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A file to store and the name it gets inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    pub name: String,
}

impl ArchiveEntry {
    pub fn new(source: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
        }
    }
}

/// What ended up in a written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,

    /// Entry names in archive order
    pub entries: Vec<String>,

    /// Sources that no longer existed at build time
    pub skipped: Vec<PathBuf>,
}

/// Write `entries` to `dest` in the given format.
///
/// Entries whose source is gone are skipped with a warning. Intermediate
/// files are created in `scratch`, never next to `dest`.
pub fn build(
    toolchain: &Toolchain,
    format: ArchiveFormat,
    entries: &[ArchiveEntry],
    dest: &Path,
    scratch: &Path,
) -> Result<ArchiveSummary> {
    let mut present = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for entry in entries {
        if entry.source.is_file() {
            present.push(entry);
        } else {
            tracing::warn!("skipping {}: file not found", entry.source.display());
            skipped.push(entry.source.clone());
        }
    }

    tracing::info!("writing {} ({} files)", dest.display(), present.len());
    match format {
        ArchiveFormat::Zip => zipfile::write(&present, dest)?,
        ArchiveFormat::TarBz2 => tarbz2::write(toolchain, &present, dest, scratch)?,
    }

    Ok(ArchiveSummary {
        path: dest.to_path_buf(),
        entries: present.iter().map(|e| e.name.clone()).collect(),
        skipped,
    })
}

/// Open `path` for writing, failing if anything exists there.
fn create_new(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                Error::AlreadyExists(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })
}

/// Remove a partially written archive.
fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("removed partial archive {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not remove partial archive {}: {}", path.display(), e),
    }
}
