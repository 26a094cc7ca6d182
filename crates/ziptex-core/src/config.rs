//! Run configuration.

use std::path::{Path, PathBuf};

use crate::archive::ArchiveFormat;
use crate::toolchain::ToolNames;

/// Name of the scratch directory created inside the project root.
pub const DEFAULT_WORK_DIR: &str = "LaTeX";

/// Configuration for one packaging run.
#[derive(Debug, Clone)]
pub struct PackConfig {
    /// Directory the documents and their relative dependencies live in
    pub project_root: PathBuf,

    /// Existing directory the archives are written to
    pub output_dir: PathBuf,

    /// Documents as given on the command line
    pub inputs: Vec<PathBuf>,

    /// Archive formats to produce
    pub formats: Vec<ArchiveFormat>,

    /// Continue past bad characters and compile failures
    pub force: bool,

    /// Keep the working area and write per-step snapshots
    pub debug: bool,

    /// Name of the working area inside `project_root`
    pub work_dir_name: String,

    /// External tool names
    pub tools: ToolNames,
}

impl PackConfig {
    /// Create a configuration with default settings.
    pub fn new(project_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            output_dir: output_dir.into(),
            inputs: Vec::new(),
            formats: Vec::new(),
            force: false,
            debug: false,
            work_dir_name: DEFAULT_WORK_DIR.to_string(),
            tools: ToolNames::default(),
        }
    }

    /// Add documents to process.
    pub fn with_inputs<I, P>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Request an archive format.
    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        if !self.formats.contains(&format) {
            self.formats.push(format);
        }
        self
    }

    /// Set the force flag.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the debug flag.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Use a different working area name.
    pub fn with_work_dir_name(mut self, name: impl Into<String>) -> Self {
        self.work_dir_name = name.into();
        self
    }

    /// Absolute path of the working area.
    pub fn work_dir(&self) -> PathBuf {
        self.project_root.join(&self.work_dir_name)
    }

    /// Archive base name: the basename of the project root.
    pub fn archive_base_name(&self) -> String {
        base_name(&self.project_root)
    }

    /// Destination path for an archive format.
    pub fn archive_path(&self, format: ArchiveFormat) -> PathBuf {
        self.output_dir
            .join(format.file_name(&self.archive_base_name()))
    }

    /// Whether a tar.bz2 archive was requested (needs the compressor).
    pub fn needs_compressor(&self) -> bool {
        self.formats.contains(&ArchiveFormat::TarBz2)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string())
}
