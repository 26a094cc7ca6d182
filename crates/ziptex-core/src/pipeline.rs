//! The packaging pipeline.
//!
//! ```text
//! probe tools ─► pre-flight ─► per document: bad chars, resolve, import
//!      ─► flatten ─► verify ─► resolve again ─► purge ─► archives
//! ```
//!
//! Every external tool runs with the project root or the working area as
//! its working directory. The process directory is never changed.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::archive::{self, ArchiveEntry, ArchiveSummary};
use crate::badchars;
use crate::config::PackConfig;
use crate::directives;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::flatten::Flattener;
use crate::ledger::Ledger;
use crate::progress::{PackCallback, SilentCallback};
use crate::resolve::{DependencySet, resolve};
use crate::toolchain::Toolchain;
use crate::verify::verify;
use crate::workspace::{WorkArea, copy_file};

/// Suffixes of generated files deleted before archiving.
const CLEANUP_EXTENSIONS: [&str; 2] = ["out", "bak"];

/// Result of a successful run.
#[derive(Debug)]
pub struct PackReport {
    /// Documents that were flattened and archived
    pub documents: Vec<Document>,

    /// Written archives
    pub archives: Vec<ArchiveSummary>,

    /// Non-fatal problems, in order of occurrence
    pub warnings: Vec<String>,

    /// Working area left on disk in debug mode
    pub work_dir_kept: Option<PathBuf>,
}

/// Packages documents of one project into archives.
pub struct Packer<'a> {
    config: PackConfig,
    toolchain: Toolchain,
    callback: &'a dyn PackCallback,
}

impl<'a> Packer<'a> {
    pub fn new(config: PackConfig, toolchain: Toolchain) -> Self {
        Self {
            config,
            toolchain,
            callback: &SilentCallback,
        }
    }

    /// Report progress to `callback`.
    pub fn with_callback(mut self, callback: &'a dyn PackCallback) -> Self {
        self.callback = callback;
        self
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Run the whole pipeline.
    pub fn run(&self) -> Result<PackReport> {
        let mut warnings = Vec::new();

        if self.config.formats.is_empty() {
            return Err(Error::Validation(
                "at least one archive format is required".to_string(),
            ));
        }

        self.callback.on_stage("Checking tools");
        self.toolchain.verify(self.config.needs_compressor())?;

        let candidates = self.validate_inputs(&mut warnings);
        if candidates.is_empty() {
            return Err(Error::NoDocuments);
        }

        for format in &self.config.formats {
            let dest = self.config.archive_path(*format);
            if dest.exists() {
                return Err(Error::AlreadyExists(dest));
            }
        }
        let work = WorkArea::create(self.config.work_dir(), self.config.debug)?;
        tracing::info!("working area {}", work.path().display());

        self.callback.on_stage("Collecting dependencies");
        let mut documents = Vec::new();
        let mut bibliographies = DependencySet::new();
        for doc in candidates {
            if self.import_document(&work, &doc, &mut bibliographies, &mut warnings)? {
                documents.push(doc);
            }
        }
        if documents.is_empty() {
            return Err(Error::NoDocuments);
        }

        self.callback.on_stage("Flattening LaTeX files");
        let outcome = Flattener::new(&self.toolchain, work.path())
            .with_snapshots(self.config.debug)
            .with_callback(self.callback)
            .flatten(&documents);
        warnings.extend(outcome.warnings.iter().map(ToString::to_string));

        self.callback.on_stage("Verifying flattened files");
        self.verify_all(work.path(), &documents, &mut warnings)?;

        let files = self.final_file_set(
            work.path(),
            &documents,
            &bibliographies,
            &outcome.ledger,
            &mut warnings,
        )?;

        self.callback.on_stage("Cleaning up");
        self.cleanup(work.path(), &outcome.ledger);

        self.callback.on_stage("Creating archives");
        let entries: Vec<ArchiveEntry> = files
            .iter()
            .map(|file| {
                ArchiveEntry::new(
                    work.path().join(file),
                    entry_name(&self.config.work_dir_name, file),
                )
            })
            .collect();

        let mut archives = Vec::new();
        for format in &self.config.formats {
            let dest = self.config.archive_path(*format);
            self.callback.on_archive(*format, &dest);
            let summary =
                archive::build(&self.toolchain, *format, &entries, &dest, work.path())?;
            for skipped in &summary.skipped {
                self.warn(
                    &mut warnings,
                    format!("{} vanished before archiving", skipped.display()),
                );
            }
            archives.push(summary);
        }

        let work_dir_kept = work.is_kept().then(|| work.path().to_path_buf());
        Ok(PackReport {
            documents,
            archives,
            warnings,
            work_dir_kept,
        })
    }

    /// Turn the raw inputs into documents, skipping invalid ones.
    fn validate_inputs(&self, warnings: &mut Vec<String>) -> Vec<Document> {
        let mut documents: Vec<Document> = Vec::new();
        for input in &self.config.inputs {
            match Document::from_arg(&self.config.project_root, input) {
                Ok(doc) if documents.iter().any(|d| d.file_name == doc.file_name) => {
                    let reason = format!("another document is already named {}", doc.file_name);
                    self.skip(input, &reason, warnings);
                }
                Ok(doc) => documents.push(doc),
                Err(e) => self.skip(input, &e.to_string(), warnings),
            }
        }
        documents
    }

    /// Check one document and copy it with its dependencies into the
    /// working area. Returns `false` when the document is skipped.
    fn import_document(
        &self,
        work: &WorkArea,
        doc: &Document,
        bibliographies: &mut DependencySet,
        warnings: &mut Vec<String>,
    ) -> Result<bool> {
        let root = &self.config.project_root;
        let source_dir = root.join(doc.source.parent().unwrap_or(Path::new("")));
        self.callback.on_document_started(doc);

        let log = source_dir.join(doc.log_name());
        if log.is_file() {
            let reports = badchars::report(&log, &source_dir)?;
            if !reports.is_empty() {
                self.callback.on_bad_characters(doc, &reports);
                let glyphs: Vec<String> = reports.into_iter().map(|r| r.glyph).collect();
                let err = Error::BadCharacters {
                    document: doc.file_name.clone(),
                    glyphs,
                };
                if !self.config.force {
                    return Err(err);
                }
                self.warn(warnings, err.to_string());
            }
        }

        let deps = match resolve(&self.toolchain, root, &doc.source) {
            Ok(deps) => deps,
            Err(e) if self.config.force => {
                self.skip(&doc.source, &e.to_string(), warnings);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        for dep in &deps {
            if !root.join(dep).is_file() {
                tracing::debug!("{} is not a project file, not copied", dep.display());
                continue;
            }
            if let Err(e) = work.import(root, dep) {
                self.warn(warnings, format!("failed to copy {}: {}", dep.display(), e));
            }
        }

        let working_copy = work.path().join(&doc.file_name);
        if !working_copy.is_file() {
            copy_file(&root.join(&doc.source), &working_copy)?;
        }

        let content = fs::read(root.join(&doc.source))?;
        for bib in directives::bibliography_files(&String::from_utf8_lossy(&content)) {
            if !root.join(&bib).is_file() {
                self.warn(warnings, format!("bibliography {} not found", bib.display()));
                continue;
            }
            match work.import(root, &bib) {
                Ok(_) => {
                    self.callback.on_bibliography(&bib);
                    bibliographies.insert(bib);
                }
                Err(e) => {
                    self.warn(warnings, format!("failed to copy {}: {}", bib.display(), e))
                }
            }
        }

        Ok(true)
    }

    /// Recompile every flattened document. Without force the first failure
    /// is returned once all documents were tried.
    fn verify_all(
        &self,
        dir: &Path,
        documents: &[Document],
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let mut first_failure = None;
        for doc in documents {
            let result = verify(&self.toolchain, dir, Path::new(&doc.file_name));
            self.callback.on_verified(doc, result.as_ref().err());
            if let Err(e) = result {
                if self.config.force {
                    self.warn(warnings, e.to_string());
                } else if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Post-flatten dependencies of every document plus bibliography
    /// sources, minus inlined and `.out` files.
    fn final_file_set(
        &self,
        dir: &Path,
        documents: &[Document],
        bibliographies: &DependencySet,
        ledger: &Ledger,
        warnings: &mut Vec<String>,
    ) -> Result<DependencySet> {
        let mut files = DependencySet::new();

        for doc in documents {
            files.insert(&doc.file_name);
            match resolve(&self.toolchain, dir, Path::new(&doc.file_name)) {
                Ok(deps) => files.extend(&deps),
                Err(e) if self.config.force => self.warn(warnings, e.to_string()),
                Err(e) => return Err(e),
            }
        }

        let mut root_bibs: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| PathBuf::from(entry.file_name()))
            .filter(|name| has_extension(name, "bib"))
            .collect();
        root_bibs.sort();
        for bib in root_bibs {
            files.insert(bib);
        }
        files.extend(bibliographies);

        let mut kept = DependencySet::new();
        for file in &files {
            if ledger.contains(file) || has_extension(file, "out") || !is_local(file) {
                tracing::debug!("excluding {}", file.display());
                continue;
            }
            kept.insert(file.clone());
        }
        Ok(kept)
    }

    /// Delete inlined files and leftovers from the working area.
    fn cleanup(&self, dir: &Path, ledger: &Ledger) {
        for file in ledger.iter() {
            if dir.join(file).exists() {
                self.callback.on_cleanup(file);
            }
        }
        ledger.purge(dir);

        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let name = PathBuf::from(entry.file_name());
            if !CLEANUP_EXTENSIONS.iter().any(|ext| has_extension(&name, ext)) {
                continue;
            }
            if fs::remove_file(entry.path()).is_ok() {
                self.callback.on_cleanup(&name);
            }
        }
    }

    fn skip(&self, input: &Path, reason: &str, warnings: &mut Vec<String>) {
        tracing::warn!("skipping {}: {}", input.display(), reason);
        self.callback.on_skipped(input, reason);
        warnings.push(format!("skipped {}: {}", input.display(), reason));
    }

    fn warn(&self, warnings: &mut Vec<String>, message: String) {
        tracing::warn!("{}", message);
        self.callback.on_warning(&message);
        warnings.push(message);
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

fn is_local(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Archive entry name: `<work dir>/<path>` with `/` separators.
fn entry_name(work_dir_name: &str, file: &Path) -> String {
    let mut name = work_dir_name.to_string();
    for component in file.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    name
}
