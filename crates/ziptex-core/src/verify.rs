//! Standalone recompilation of flattened documents.

use std::path::Path;

use crate::error::{Error, Result};
use crate::toolchain::Toolchain;

/// Compile `tex` inside `dir` in draft mode and fail with the full compiler
/// output if it does not build.
///
/// Whether a failure is fatal is left to the caller.
pub fn verify(toolchain: &Toolchain, dir: &Path, tex: &Path) -> Result<()> {
    let args = vec![
        "-draft".to_string(),
        "-halt-on-error".to_string(),
        "-interaction=nonstopmode".to_string(),
        tex.to_string_lossy().into_owned(),
    ];
    let output = toolchain.invoke(&toolchain.tools().compiler, &args, dir)?;

    if !output.success {
        return Err(Error::Compile {
            document: tex.display().to_string(),
            output: output.combined(),
        });
    }

    tracing::info!("{} compiles standalone", tex.display());
    Ok(())
}
