//! ZIP writer.

use std::fs::File;
use std::io;
use std::path::Path;

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use super::{ArchiveEntry, create_new};
use crate::error::Result;

/// Write a deflate-compressed ZIP with one entry per file.
///
/// A partially written archive is removed on failure.
pub(super) fn write(entries: &[&ArchiveEntry], dest: &Path) -> Result<()> {
    let file = create_new(dest)?;
    let result = write_entries(file, entries);
    if result.is_err() {
        super::discard_partial(dest);
    }
    result
}

fn write_entries(file: File, entries: &[&ArchiveEntry]) -> Result<()> {
    let mut zip = ZipWriter::new(file);

    for entry in entries {
        let mut source = File::open(&entry.source)?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(permissions(&source)?);

        zip.start_file(entry.name.as_str(), options)?;
        io::copy(&mut source, &mut zip)?;
        tracing::debug!("zip: added {}", entry.name);
    }

    zip.finish()?;
    Ok(())
}

#[cfg(unix)]
fn permissions(file: &File) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(file.metadata()?.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions(_file: &File) -> Result<u32> {
    Ok(0o644)
}
