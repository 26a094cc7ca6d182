//! External tool management.
//!
//! The LaTeX compiler, the macro expander and the compressor are black boxes
//! reached through [`ToolRunner`]. [`Toolchain`] pairs a runner with the
//! executable names and provides the availability probe.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

#[cfg(test)]
use mockall::automock;

use crate::error::{Error, Result};

/// Captured result of a single tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Whether the process exited with status zero
    pub success: bool,

    /// Raw stdout
    pub stdout: Vec<u8>,

    /// Raw stderr
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// A successful invocation with the given stdout.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// A failed invocation with the given stderr.
    pub fn failed(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr, lossily decoded.
    pub fn combined(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text
    }
}

/// Capability to run an external program to completion.
///
/// Implementations must report a program that cannot be found as an
/// [`io::ErrorKind::NotFound`] error, and must not change the current
/// directory of the calling process.
#[cfg_attr(test, automock)]
pub trait ToolRunner {
    /// Run `program` with `args` inside `cwd`, capturing its output.
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<ToolOutput>;
}

/// Runs tools as real subprocesses found on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<ToolOutput> {
        let path = which::which(program)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))?;

        tracing::debug!("running {} {} in {}", program, args.join(" "), cwd.display());

        let output = Command::new(path)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Executable names of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNames {
    /// LaTeX compiler with `-record` support
    pub compiler: String,

    /// Macro expander that inlines `\input` and `\usepackage`
    pub expander: String,

    /// bzip2-compatible compressor
    pub compressor: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            compiler: "pdflatex".to_string(),
            expander: "latexpand".to_string(),
            compressor: "bzip2".to_string(),
        }
    }
}

/// A tool runner bound to the configured tool names.
pub struct Toolchain {
    runner: Box<dyn ToolRunner>,
    tools: ToolNames,
}

impl Toolchain {
    /// Create a toolchain from a runner and tool names.
    pub fn new(runner: Box<dyn ToolRunner>, tools: ToolNames) -> Self {
        Self { runner, tools }
    }

    /// Toolchain running the default tools as real subprocesses.
    pub fn system() -> Self {
        Self::new(Box::new(SystemRunner), ToolNames::default())
    }

    /// Configured tool names.
    pub fn tools(&self) -> &ToolNames {
        &self.tools
    }

    /// Verify that every required tool can be invoked.
    ///
    /// Must run before anything is created or modified on disk.
    pub fn verify(&self, require_compressor: bool) -> Result<()> {
        self.check_tool(&self.tools.compiler)?;
        self.check_tool(&self.tools.expander)?;
        if require_compressor {
            self.check_tool(&self.tools.compressor)?;
        }
        Ok(())
    }

    /// Run a tool, mapping a missing executable to [`Error::ToolMissing`].
    pub fn invoke(&self, tool: &str, args: &[String], cwd: &Path) -> Result<ToolOutput> {
        self.runner.run(tool, args, cwd).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::ToolMissing {
                    tool: tool.to_string(),
                    reason: "command not found in PATH".to_string(),
                }
            } else {
                Error::Io(e)
            }
        })
    }

    /// Probe one tool with `--version`.
    ///
    /// Some tools exit nonzero on a version query; that is accepted as long
    /// as they printed something.
    fn check_tool(&self, tool: &str) -> Result<()> {
        let output = self.invoke(tool, &["--version".to_string()], Path::new("."))?;
        if !output.success && output.stdout.is_empty() && output.stderr.is_empty() {
            return Err(Error::ToolMissing {
                tool: tool.to_string(),
                reason: "command failed without output".to_string(),
            });
        }
        tracing::debug!("found {}", tool);
        Ok(())
    }
}
