//! Error types for ziptex-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::flatten::FlattenStep;

/// Result type for ziptex-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while packaging a document.
#[derive(Debug, Error)]
pub enum Error {
    /// A required external program is absent or unusable.
    #[error("{tool} not found or not working: {reason}")]
    ToolMissing { tool: String, reason: String },

    /// Bad arguments or an input that cannot be processed.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A path that must not exist already does.
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// The LaTeX compiler failed on a document.
    #[error("LaTeX compilation failed for {document}:\n{output}")]
    Compile { document: String, output: String },

    /// The previous compilation log reports glyphs the font cannot render.
    #[error("cannot continue processing {document} due to bad characters: {}", glyphs.join(" "))]
    BadCharacters {
        document: String,
        glyphs: Vec<String>,
    },

    /// A flatten step failed.
    #[error("{step} failed: {message}")]
    Flatten { step: FlattenStep, message: String },

    /// None of the inputs was a usable document.
    #[error("no valid tex files to process")]
    NoDocuments,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP writer error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    /// Render the error followed by a recovery hint, when one applies.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Error::ToolMissing { tool, .. } => match tool.as_str() {
                "bzip2" => Some("Please install bzip2".to_string()),
                "latexpand" => Some("latexpand should be included with TeX Live".to_string()),
                _ => Some("Please install MacTeX or TeX Live".to_string()),
            },
            Error::AlreadyExists(path) => Some(format!(
                "Please remove {} or choose a different output directory",
                path.display()
            )),
            Error::Compile { .. } | Error::BadCharacters { .. } => {
                Some("Rerun with -f to continue anyway".to_string())
            }
            _ => None,
        };

        match hint {
            Some(hint) => format!("{}\n{}", self, hint),
            None => self.to_string(),
        }
    }
}
