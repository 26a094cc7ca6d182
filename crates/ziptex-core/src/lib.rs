//! Core engine for ziptex, a LaTeX submission packager.
//!
//! This crate provides:
//! - Dependency discovery through the compiler's file recorder
//! - Detection of glyphs the compiler cannot render
//! - Flattening of documents into self-contained sources
//! - Standalone verification of the flattened documents
//! - ZIP and tar.bz2 archive writers
//!
//! External programs are reached only through [`ToolRunner`], so every stage
//! can run against a fake toolchain.

pub mod archive;
pub mod badchars;
pub mod config;
pub mod directives;
pub mod document;
pub mod error;
pub mod flatten;
pub mod ledger;
pub mod pipeline;
pub mod progress;
pub mod resolve;
pub mod toolchain;
pub mod verify;
pub mod workspace;

pub use archive::{ArchiveEntry, ArchiveFormat, ArchiveSummary};
pub use badchars::BadCharReport;
pub use config::{DEFAULT_WORK_DIR, PackConfig};
pub use document::Document;
pub use error::{Error, Result};
pub use flatten::{FlattenOutcome, FlattenStep, FlattenWarning, Flattener};
pub use ledger::Ledger;
pub use pipeline::{PackReport, Packer};
pub use progress::{PackCallback, SilentCallback};
pub use resolve::DependencySet;
pub use toolchain::{SystemRunner, ToolNames, ToolOutput, ToolRunner, Toolchain};
pub use workspace::WorkArea;
