//! Dependency discovery through the compiler's file recorder.
//!
//! The compiler runs in `-record` mode and writes `<stem>.fls`:
//!
//! ```text
//! PWD /home/ada/paper
//! INPUT /usr/share/texmf-dist/tex/latex/base/article.cls
//! INPUT paper.tex
//! INPUT ./figures/plot.pdf
//! OUTPUT paper.log
//! ```
//!
//! Only relative `INPUT` entries are project dependencies.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::toolchain::Toolchain;

/// Upper bound on compiler output carried in a resolve error.
const ERROR_TAIL_CHARS: usize = 1000;

/// Ordered set of relative paths a document needs to compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    paths: IndexSet<PathBuf>,
}

impl DependencySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path; returns `false` if it was already present.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    /// Union with another set, keeping first-occurrence order.
    pub fn extend(&mut self, other: &DependencySet) {
        for path in &other.paths {
            self.paths.insert(path.clone());
        }
    }

    /// Whether `path` is in the set.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Iterate in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a PathBuf;
    type IntoIter = indexmap::set::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Parse a recorder file into a dependency set.
pub fn parse_record(text: &str) -> DependencySet {
    let mut deps = DependencySet::new();

    for line in text.lines() {
        let Some(entry) = line.strip_prefix("INPUT ") else {
            continue;
        };

        let entry = entry.trim_end_matches('\r');
        if entry.is_empty() || Path::new(entry).is_absolute() {
            continue;
        }

        let entry = entry.strip_prefix("./").unwrap_or(entry);
        deps.insert(entry);
    }

    deps
}

/// Compile `tex` inside `dir` in recording mode and collect its inputs.
///
/// `tex` is relative to `dir`; the record file lands in `dir`.
pub fn resolve(toolchain: &Toolchain, dir: &Path, tex: &Path) -> Result<DependencySet> {
    let document = Document::from_relative(tex)?;
    let compiler = &toolchain.tools().compiler;

    let args = vec![
        "-draft".to_string(),
        "-record".to_string(),
        "-halt-on-error".to_string(),
        "-interaction=nonstopmode".to_string(),
        tex.to_string_lossy().into_owned(),
    ];
    let output = toolchain.invoke(compiler, &args, dir)?;

    if !output.success {
        return Err(Error::Compile {
            document: tex.display().to_string(),
            output: tail(&output.combined(), ERROR_TAIL_CHARS),
        });
    }

    let record = dir.join(document.record_name());
    let text = fs::read_to_string(&record).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("error reading {}: {}", record.display(), e),
        ))
    })?;

    let deps = parse_record(&text);
    tracing::debug!("{} depends on {} files", tex.display(), deps.len());
    Ok(deps)
}

/// Last `max` characters of `text`, prefixed with `...` when cut.
fn tail(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let start = text
        .char_indices()
        .nth(count - max)
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!("...{}", &text[start..])
}
