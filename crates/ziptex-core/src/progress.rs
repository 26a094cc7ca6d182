//! Progress reporting hooks.

use std::path::Path;

use crate::archive::ArchiveFormat;
use crate::badchars::BadCharReport;
use crate::document::Document;
use crate::error::Error;

/// Callback trait for packaging progress.
///
/// Every method has an empty default so implementors pick what they show.
pub trait PackCallback {
    /// A pipeline stage begins (e.g. "Flattening LaTeX files").
    fn on_stage(&self, _stage: &str) {}

    /// Processing of a document begins.
    fn on_document_started(&self, _document: &Document) {}

    /// An input was not processed.
    fn on_skipped(&self, _input: &Path, _reason: &str) {}

    /// The previous log of a document reports unrenderable glyphs.
    fn on_bad_characters(&self, _document: &Document, _reports: &[BadCharReport]) {}

    /// A bibliography source was added to the working area.
    fn on_bibliography(&self, _path: &Path) {}

    /// `file` was embedded into `document`.
    fn on_inlined(&self, _file: &Path, _document: &Document) {}

    /// A file was moved out of a nested directory.
    fn on_moved(&self, _from: &Path, _to: &Path) {}

    /// A non-fatal problem.
    fn on_warning(&self, _message: &str) {}

    /// A flattened document was recompiled.
    fn on_verified(&self, _document: &Document, _error: Option<&Error>) {}

    /// A redundant file is deleted before archiving.
    fn on_cleanup(&self, _path: &Path) {}

    /// An archive is about to be written.
    fn on_archive(&self, _format: ArchiveFormat, _path: &Path) {}
}

/// Callback that reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCallback;

impl PackCallback for SilentCallback {}
