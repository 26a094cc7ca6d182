//! tar.bz2 writer.
//!
//! The tar is built in a scratch directory owned by the caller and
//! compressed by the external bzip2, whose stdout becomes the archive.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tar::Builder;

use super::{ArchiveEntry, create_new};
use crate::error::{Error, Result};
use crate::toolchain::Toolchain;

/// Removes the intermediate tar however the build ends.
struct TransientFile(PathBuf);

impl Drop for TransientFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.0) {
            Ok(()) => tracing::debug!("removed {}", self.0.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("could not remove {}: {}", self.0.display(), e),
        }
    }
}

/// Path of the uncompressed tar for `dest` inside `scratch`
/// (`out/paper.tar.bz2` → `scratch/paper.tar`).
fn tar_path(dest: &Path, scratch: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(".bz2") {
        Some(stripped) => scratch.join(stripped),
        None => scratch.join(Path::new(&name).with_extension("tar")),
    }
}

pub(super) fn write(
    toolchain: &Toolchain,
    entries: &[&ArchiveEntry],
    dest: &Path,
    scratch: &Path,
) -> Result<()> {
    let mut out = create_new(dest)?;
    let result = compress(toolchain, entries, &tar_path(dest, scratch), &mut out);
    if result.is_err() {
        drop(out);
        super::discard_partial(dest);
    }
    result
}

fn compress(
    toolchain: &Toolchain,
    entries: &[&ArchiveEntry],
    tar: &Path,
    out: &mut fs::File,
) -> Result<()> {
    let tar_file = create_new(tar)?;
    let _guard = TransientFile(tar.to_path_buf());

    let mut builder = Builder::new(tar_file);
    for entry in entries {
        builder.append_path_with_name(&entry.source, &entry.name)?;
        tracing::debug!("tar: added {}", entry.name);
    }
    builder.into_inner()?.sync_all()?;

    let compressor = &toolchain.tools().compressor;
    let cwd = tar.parent().unwrap_or_else(|| Path::new("."));
    let args = vec!["-c".to_string(), tar.to_string_lossy().into_owned()];
    let output = toolchain.invoke(compressor, &args, cwd)?;
    if !output.success {
        return Err(Error::Io(std::io::Error::other(format!(
            "{} failed: {}",
            compressor,
            output.combined().trim()
        ))));
    }

    out.write_all(&output.stdout)?;
    out.sync_all()?;
    Ok(())
}
