//! Document flattening.
//!
//! Rewrites the working copies of the documents until they no longer
//! reference files the archive will not contain:
//!
//! ```text
//! paper.tex ─► expand ─► aux ─► class ─► dirs ─► self-contained paper.tex
//!              │         │       │        │
//!              latexpand │       │        └─ \graphicspath{{figures/}} → files moved up
//!                        │       └─ \documentclass{local} → local.cls embedded
//!                        └─ paper.aux embedded
//! ```
//!
//! Every step is best effort: a failure is recorded as a [`FlattenWarning`]
//! and the remaining steps still run. Verification afterwards catches the
//! breakage.

mod embed;
mod expand;
mod graphics;

use std::fmt;
use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::error::Error;
use crate::ledger::Ledger;
use crate::progress::{PackCallback, SilentCallback};
use crate::toolchain::Toolchain;

pub use embed::{class_files, inline_aux, inline_classes};
pub use expand::expand;
pub use graphics::{DirsOutcome, flatten_dirs, remove_empty_dirs};

/// The flatten steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenStep {
    /// `\input`/`\usepackage` expansion by the external expander
    Expand,
    /// Embedding of the document's `.aux` file
    Aux,
    /// Embedding of local class files
    Class,
    /// Moving graphics out of `\graphicspath` directories
    Dirs,
}

impl FlattenStep {
    pub const ALL: [FlattenStep; 4] = [Self::Expand, Self::Aux, Self::Class, Self::Dirs];

    /// Suffix used for debug snapshots (`paper.tex.after_<name>`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Expand => "expand",
            Self::Aux => "aux",
            Self::Class => "class",
            Self::Dirs => "dirs",
        }
    }
}

impl fmt::Display for FlattenStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Expand => "macro expansion",
            Self::Aux => "aux inlining",
            Self::Class => "class inlining",
            Self::Dirs => "directory flattening",
        };
        f.write_str(text)
    }
}

/// A flatten step that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenWarning {
    pub step: FlattenStep,
    /// Document file name, when the failure concerns one document
    pub document: Option<String>,
    pub message: String,
}

impl fmt::Display for FlattenWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.document {
            Some(doc) => write!(f, "{} failed for {}: {}", self.step, doc, self.message),
            None => write!(f, "{} failed: {}", self.step, self.message),
        }
    }
}

/// Result of flattening a set of documents.
#[derive(Debug, Default)]
pub struct FlattenOutcome {
    /// Files embedded into documents
    pub ledger: Ledger,

    /// Steps that failed
    pub warnings: Vec<FlattenWarning>,
}

/// Runs the flatten steps over the documents in a working area.
pub struct Flattener<'a> {
    toolchain: &'a Toolchain,
    dir: &'a Path,
    snapshots: bool,
    callback: &'a dyn PackCallback,
}

impl<'a> Flattener<'a> {
    /// Create a flattener for documents at the root of `dir`.
    pub fn new(toolchain: &'a Toolchain, dir: &'a Path) -> Self {
        Self {
            toolchain,
            dir,
            snapshots: false,
            callback: &SilentCallback,
        }
    }

    /// Write `<document>.after_<step>` copies after each step.
    pub fn with_snapshots(mut self, snapshots: bool) -> Self {
        self.snapshots = snapshots;
        self
    }

    /// Report progress to `callback`.
    pub fn with_callback(mut self, callback: &'a dyn PackCallback) -> Self {
        self.callback = callback;
        self
    }

    /// Run every step over every document.
    pub fn flatten(&self, documents: &[Document]) -> FlattenOutcome {
        let mut outcome = FlattenOutcome::default();

        for doc in documents {
            if let Err(e) = expand(self.toolchain, self.dir, doc) {
                self.warn(&mut outcome, FlattenStep::Expand, Some(doc), &e);
            }
        }
        self.snapshot(documents, FlattenStep::Expand);

        tracing::info!("looking for aux files to embed");
        for doc in documents {
            match inline_aux(self.dir, doc, &mut outcome.ledger) {
                Ok(Some(aux)) => self.callback.on_inlined(Path::new(&aux), doc),
                Ok(None) => {}
                Err(e) => self.warn(&mut outcome, FlattenStep::Aux, Some(doc), &e),
            }
        }
        self.snapshot(documents, FlattenStep::Aux);

        tracing::info!("looking for cls files to embed");
        match class_files(self.dir) {
            Ok(classes) if !classes.is_empty() => {
                for doc in documents {
                    match inline_classes(self.dir, doc, &classes, &mut outcome.ledger) {
                        Ok(inlined) => {
                            for cls in inlined {
                                self.callback.on_inlined(Path::new(&cls), doc);
                            }
                        }
                        Err(e) => self.warn(&mut outcome, FlattenStep::Class, Some(doc), &e),
                    }
                }
            }
            Ok(_) => {}
            Err(e) => self.warn(&mut outcome, FlattenStep::Class, None, &e),
        }
        self.snapshot(documents, FlattenStep::Class);

        for doc in documents {
            match flatten_dirs(self.dir, doc) {
                Ok(dirs) => {
                    for (from, to) in &dirs.moved {
                        self.callback.on_moved(from, to);
                    }
                    for path in &dirs.collisions {
                        self.warn_message(
                            &mut outcome,
                            FlattenStep::Dirs,
                            Some(doc),
                            format!("{} not moved, a file with that name already exists", path.display()),
                        );
                    }
                    for gfx in &dirs.missing {
                        self.warn_message(
                            &mut outcome,
                            FlattenStep::Dirs,
                            Some(doc),
                            format!("graphicspath \"{}\" not found", gfx),
                        );
                    }
                }
                Err(e) => self.warn(&mut outcome, FlattenStep::Dirs, Some(doc), &e),
            }
        }
        remove_empty_dirs(self.dir);
        self.snapshot(documents, FlattenStep::Dirs);

        outcome
    }

    fn warn(
        &self,
        outcome: &mut FlattenOutcome,
        step: FlattenStep,
        doc: Option<&Document>,
        error: &Error,
    ) {
        let message = match error {
            Error::Flatten { message, .. } => message.clone(),
            other => other.to_string(),
        };
        self.warn_message(outcome, step, doc, message);
    }

    fn warn_message(
        &self,
        outcome: &mut FlattenOutcome,
        step: FlattenStep,
        doc: Option<&Document>,
        message: String,
    ) {
        let warning = FlattenWarning {
            step,
            document: doc.map(|d| d.file_name.clone()),
            message,
        };
        tracing::warn!("{}", warning);
        self.callback.on_warning(&warning.to_string());
        outcome.warnings.push(warning);
    }

    fn snapshot(&self, documents: &[Document], step: FlattenStep) {
        if !self.snapshots {
            return;
        }
        for doc in documents {
            let src = self.dir.join(&doc.file_name);
            let dst = self
                .dir
                .join(format!("{}.after_{}", doc.file_name, step.name()));
            if let Err(e) = fs::copy(&src, &dst) {
                tracing::debug!("snapshot {} failed: {}", dst.display(), e);
            }
        }
    }
}

/// Read a document's working copy as text.
pub(crate) fn read_text(path: &Path) -> crate::error::Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("cannot read {}: {}", path.display(), e),
        ))
    })
}
