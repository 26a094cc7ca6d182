//! ziptex - package a LaTeX document and everything it needs into an archive.

mod colors;
mod pack;

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser)]
#[command(name = "ziptex")]
#[command(about = "Package LaTeX documents with their dependencies for submission")]
#[command(version)]
#[command(group(
    ArgGroup::new("format")
        .required(true)
        .multiple(true)
        .args(["zip", "bzip2"])
))]
struct Cli {
    /// Continue past bad characters and compile failures
    #[arg(short, long)]
    force: bool,

    /// Create a ZIP archive
    #[arg(short = 'z', long)]
    zip: bool,

    /// Create a tar.bz2 archive
    #[arg(short = 'j', long)]
    bzip2: bool,

    /// Keep the working directory and snapshot each flatten step
    #[arg(long)]
    debug: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output directory (default: ~/Desktop if present, else the current directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// LaTeX files to package
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format ziptex-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<ziptex_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    let options = pack::PackOptions {
        files: cli.files,
        output: cli.output,
        zip: cli.zip,
        bzip2: cli.bzip2,
        force: cli.force,
        debug: cli.debug,
    };
    pack::execute(&options).map_err(format_error)?;

    Ok(())
}
