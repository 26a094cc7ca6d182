//! Pack command implementation for the ziptex CLI.
//!
//! Resolves the output directory, runs the pipeline and prints progress.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use ziptex_core::{
    ArchiveFormat, BadCharReport, Document, Error, PackCallback, PackConfig, Packer,
    SystemRunner, Toolchain,
};

use crate::colors;

/// Command-line options of a packaging run.
pub struct PackOptions {
    pub files: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub zip: bool,
    pub bzip2: bool,
    pub force: bool,
    pub debug: bool,
}

/// Prints pipeline progress to the terminal.
struct ProgressCallback;

impl PackCallback for ProgressCallback {
    fn on_stage(&self, stage: &str) {
        println!("{}{}{}", colors::bold(), stage, colors::reset());
    }

    fn on_document_started(&self, document: &Document) {
        println!(
            "  processing {}{}{}",
            colors::cyan(),
            document.source.display(),
            colors::reset()
        );
    }

    fn on_skipped(&self, input: &Path, reason: &str) {
        eprintln!(
            "  {}skipping{} {}: {}",
            colors::yellow(),
            colors::reset(),
            input.display(),
            reason
        );
    }

    fn on_bad_characters(&self, document: &Document, reports: &[BadCharReport]) {
        eprintln!(
            "  {}bad characters{} in {}:",
            colors::red(),
            colors::reset(),
            document.file_name
        );
        for report in reports {
            eprintln!("    {}", report.glyph);
            for location in &report.locations {
                eprintln!("      {}{}{}", colors::dim(), location, colors::reset());
            }
        }
    }

    fn on_bibliography(&self, path: &Path) {
        println!("  adding bibliography {}", path.display());
    }

    fn on_inlined(&self, file: &Path, document: &Document) {
        println!("  embedded {} into {}", file.display(), document.file_name);
    }

    fn on_moved(&self, from: &Path, to: &Path) {
        println!(
            "  {}moved {} to {}{}",
            colors::dim(),
            from.display(),
            to.display(),
            colors::reset()
        );
    }

    fn on_warning(&self, message: &str) {
        eprintln!("  {}warning:{} {}", colors::yellow(), colors::reset(), message);
    }

    fn on_verified(&self, document: &Document, error: Option<&Error>) {
        match error {
            None => println!(
                "  {}✓{} {} compiles",
                colors::green(),
                colors::reset(),
                document.file_name
            ),
            Some(_) => eprintln!(
                "  {}✗{} {} does not compile",
                colors::red(),
                colors::reset(),
                document.file_name
            ),
        }
    }

    fn on_cleanup(&self, path: &Path) {
        println!("  {}removing {}{}", colors::dim(), path.display(), colors::reset());
    }

    fn on_archive(&self, format: ArchiveFormat, path: &Path) {
        println!("  writing {} ({})", path.display(), format);
    }
}

/// Package the given documents.
pub fn execute(options: &PackOptions) -> anyhow::Result<()> {
    let start = Instant::now();

    let project_root = std::env::current_dir().context("cannot determine current directory")?;
    let output_dir = resolve_output_dir(options.output.as_deref())?;

    let mut config = PackConfig::new(&project_root, &output_dir)
        .with_inputs(options.files.iter().cloned())
        .with_force(options.force)
        .with_debug(options.debug);
    if options.zip {
        config = config.with_format(ArchiveFormat::Zip);
    }
    if options.bzip2 {
        config = config.with_format(ArchiveFormat::TarBz2);
    }
    if config.formats.is_empty() {
        bail!("at least one of -z or -j is required");
    }

    println!(
        "\n{}ziptex{} - packaging {}{}{}",
        colors::bold(),
        colors::reset(),
        colors::cyan(),
        config.archive_base_name(),
        colors::reset()
    );
    println!("{}", "─".repeat(50));

    let toolchain = Toolchain::new(Box::new(SystemRunner), config.tools.clone());
    let progress = ProgressCallback;
    let report = Packer::new(config, toolchain)
        .with_callback(&progress)
        .run()?;

    println!("\n{}", "─".repeat(50));
    for archive in &report.archives {
        println!(
            "{}Created{} {} ({} files)",
            colors::green(),
            colors::reset(),
            archive.path.display(),
            archive.entries.len()
        );
    }
    if !report.warnings.is_empty() {
        println!(
            "{}{} warning(s){}, check the output above",
            colors::yellow(),
            report.warnings.len(),
            colors::reset()
        );
    }
    if let Some(work_dir) = &report.work_dir_kept {
        print_debug_notice(work_dir);
    }
    println!(
        "Packaged {} document(s) in {:.2}s",
        report.documents.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Resolve the output directory to an absolute path that exists.
fn resolve_output_dir(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => default_output_dir()?,
    };

    let resolved = dir
        .canonicalize()
        .with_context(|| format!("output directory {} does not exist", dir.display()))?;
    if !resolved.is_dir() {
        bail!("output path {} is not a directory", resolved.display());
    }
    Ok(resolved)
}

/// `~/Desktop` when it exists, otherwise the current directory.
fn default_output_dir() -> anyhow::Result<PathBuf> {
    if let Some(desktop) = dirs::home_dir()
        .map(|home| home.join("Desktop"))
        .filter(|desktop| desktop.is_dir())
    {
        return Ok(desktop);
    }
    std::env::current_dir().context("cannot determine current directory")
}

fn print_debug_notice(work_dir: &Path) {
    println!(
        "\n{}Debug mode:{} working directory kept at {}",
        colors::yellow(),
        colors::reset(),
        work_dir.display()
    );
    println!("It contains a <file>.after_<step> snapshot for every flatten step.");
    println!(
        "Remove it before running ziptex again: rm -rf {}",
        work_dir.display()
    );
}
