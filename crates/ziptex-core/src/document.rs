//! LaTeX source documents under processing.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Recognized source suffix.
pub const TEX_EXTENSION: &str = "tex";

/// One LaTeX source file.
///
/// `source` is relative to the project root. Inside the working area the
/// document always sits at the root under its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the project root
    pub source: PathBuf,

    /// File name (e.g. `paper.tex`)
    pub file_name: String,

    /// File name without suffix (e.g. `paper`)
    pub stem: String,
}

impl Document {
    /// Validate a command-line argument and build a document from it.
    ///
    /// Absolute paths are accepted only inside `project_root`.
    pub fn from_arg(project_root: &Path, arg: impl AsRef<Path>) -> Result<Self> {
        let arg = arg.as_ref();

        let relative = if arg.is_absolute() {
            arg.strip_prefix(project_root)
                .map(Path::to_path_buf)
                .map_err(|_| {
                    Error::Validation(format!(
                        "{} is outside the project directory {}",
                        arg.display(),
                        project_root.display()
                    ))
                })?
        } else {
            arg.to_path_buf()
        };

        if relative.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(Error::Validation(format!(
                "{} is outside the project directory",
                arg.display()
            )));
        }

        let full = project_root.join(&relative);
        if full.is_dir() {
            return Err(Error::Validation(format!("{} is a directory", arg.display())));
        }
        if relative.extension().and_then(|e| e.to_str()) != Some(TEX_EXTENSION) {
            return Err(Error::Validation(format!("{} is not a .tex file", arg.display())));
        }
        if !full.is_file() {
            return Err(Error::Validation(format!("{} does not exist", arg.display())));
        }

        Self::from_relative(relative)
    }

    /// Build a document from a path already known to be a `.tex` file.
    pub fn from_relative(source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Validation(format!("{} has no file name", source.display())))?;
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            source,
            file_name,
            stem,
        })
    }

    /// Compiler log (`<stem>.log`).
    pub fn log_name(&self) -> String {
        format!("{}.log", self.stem)
    }

    /// Dependency record written by `-record` (`<stem>.fls`).
    pub fn record_name(&self) -> String {
        format!("{}.fls", self.stem)
    }

    /// Auxiliary file (`<stem>.aux`).
    pub fn aux_name(&self) -> String {
        format!("{}.aux", self.stem)
    }

    /// Bibliography output (`<stem>.bbl`).
    pub fn bbl_name(&self) -> String {
        format!("{}.bbl", self.stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_derived_names() {
        let doc = Document::from_relative("chapters/paper.tex").unwrap();
        assert_eq!(doc.file_name, "paper.tex");
        assert_eq!(doc.stem, "paper");
        assert_eq!(doc.log_name(), "paper.log");
        assert_eq!(doc.record_name(), "paper.fls");
        assert_eq!(doc.aux_name(), "paper.aux");
        assert_eq!(doc.bbl_name(), "paper.bbl");
    }

    #[test]
    fn test_from_arg_validation() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path();
        fs::write(root.join("paper.tex"), "\\documentclass{article}").unwrap();
        fs::write(root.join("notes.txt"), "hi").unwrap();
        fs::create_dir(root.join("dir.tex")).unwrap();

        let doc = Document::from_arg(root, "paper.tex").unwrap();
        assert_eq!(doc.source, PathBuf::from("paper.tex"));

        let abs = Document::from_arg(root, root.join("paper.tex")).unwrap();
        assert_eq!(abs.source, PathBuf::from("paper.tex"));

        assert!(Document::from_arg(root, "notes.txt").is_err());
        assert!(Document::from_arg(root, "dir.tex").is_err());
        assert!(Document::from_arg(root, "missing.tex").is_err());
        assert!(Document::from_arg(root, "../paper.tex").is_err());
        assert!(Document::from_arg(root, "/elsewhere/paper.tex").is_err());
    }
}
