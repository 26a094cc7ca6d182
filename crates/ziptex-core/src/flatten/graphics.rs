//! Flattening of `\graphicspath` directories.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::directives;
use crate::document::Document;
use crate::error::Result;

use super::read_text;

/// What [`flatten_dirs`] did for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirsOutcome {
    /// Files moved, as `(from, to)` relative to the working area
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Files left in place because the target name was taken
    pub collisions: Vec<PathBuf>,
    /// Declared directories that do not exist in the working area
    pub missing: Vec<String>,
}

/// Move the files of every `\graphicspath` directory to the root of `dir`
/// and remove the declaration from the document.
///
/// Existing files at the root are never overwritten. Documents without a
/// declaration are left untouched.
pub fn flatten_dirs(dir: &Path, doc: &Document) -> Result<DirsOutcome> {
    let tex_path = dir.join(&doc.file_name);
    let content = read_text(&tex_path)?;
    let mut outcome = DirsOutcome::default();

    if !directives::has_graphics_path(&content) {
        return Ok(outcome);
    }

    let mut flattened: Vec<PathBuf> = Vec::new();
    for gfx in directives::graphics_paths(&content) {
        let relative = Path::new(&gfx);
        if flattened.iter().any(|done| relative.starts_with(done)) {
            tracing::debug!("{} was flattened with an enclosing directory", gfx);
            continue;
        }
        let is_local = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        let source = dir.join(relative);
        if !is_local || !source.is_dir() {
            tracing::warn!("graphicspath {} not found in working area", gfx);
            outcome.missing.push(gfx);
            continue;
        }

        tracing::info!("flattening {}", gfx);
        move_tree(dir, &source, &mut outcome)?;
        prune_empty(&source);
        flattened.push(relative.to_path_buf());
    }

    fs::write(&tex_path, directives::strip_graphics_path(&content))?;
    Ok(outcome)
}

/// Move every file below `current` to the root of `dir`, recursively.
fn move_tree(dir: &Path, current: &Path, outcome: &mut DirsOutcome) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(current)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            move_tree(dir, &path, outcome)?;
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        let from = path.strip_prefix(dir).unwrap_or(&path).to_path_buf();
        let target = dir.join(name);
        if target.exists() {
            tracing::warn!(
                "not moving {}: {} already exists",
                from.display(),
                Path::new(name).display()
            );
            outcome.collisions.push(from);
            continue;
        }
        fs::rename(&path, &target)?;
        tracing::debug!("moved {} to {}", from.display(), Path::new(name).display());
        outcome.moved.push((from, PathBuf::from(name)));
    }
    Ok(())
}

/// Remove `root` and its subdirectories bottom-up where they are empty.
fn prune_empty(root: &Path) {
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                prune_empty(&path);
            }
        }
    }
    // non-empty directories stay
    let _ = fs::remove_dir(root);
}

/// Remove empty directories directly inside `dir`. Best effort.
pub fn remove_empty_dirs(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() && fs::remove_dir(&path).is_ok() {
            tracing::debug!("removed empty directory {}", path.display());
        }
    }
}
