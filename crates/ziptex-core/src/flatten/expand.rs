//! Macro and package expansion through the external expander.

use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::toolchain::Toolchain;

use super::FlattenStep;

/// Expand `\input`, `\include` and `\usepackage` of local files in place.
///
/// The document is moved aside to `<stem>_tmp.tex` and the expander writes
/// the result back under the original name. If a `.bbl` for the document
/// exists it is inlined as well. On failure the original file is restored.
pub fn expand(toolchain: &Toolchain, dir: &Path, doc: &Document) -> Result<()> {
    let tex = dir.join(&doc.file_name);
    let tmp_name = format!("{}_tmp.tex", doc.stem);
    let tmp = dir.join(&tmp_name);

    fs::rename(&tex, &tmp).map_err(|e| Error::Flatten {
        step: FlattenStep::Expand,
        message: format!("failed to move {} aside: {}", doc.file_name, e),
    })?;

    let expander = &toolchain.tools().expander;
    let mut args = vec![
        "--verbose".to_string(),
        "--fatal".to_string(),
        "--expand-usepackage".to_string(),
    ];
    let bbl = doc.bbl_name();
    if dir.join(&bbl).is_file() {
        args.push("--expand-bbl".to_string());
        args.push(bbl);
    }
    args.push("-o".to_string());
    args.push(doc.file_name.clone());
    args.push(tmp_name);

    let failure = match toolchain.invoke(expander, &args, dir) {
        Ok(output) if output.success && tex.is_file() => None,
        Ok(output) if output.success => Some(Error::Flatten {
            step: FlattenStep::Expand,
            message: format!("{} produced no {}", expander, doc.file_name),
        }),
        Ok(output) => Some(Error::Flatten {
            step: FlattenStep::Expand,
            message: format!(
                "{} failed to process {}:\n{}",
                expander,
                doc.file_name,
                output.combined()
            ),
        }),
        Err(e) => Some(e),
    };

    if let Some(err) = failure {
        if let Err(e) = fs::rename(&tmp, &tex) {
            tracing::warn!("could not restore {}: {}", tex.display(), e);
        }
        return Err(err);
    }

    if let Err(e) = fs::remove_file(&tmp) {
        tracing::debug!("could not remove {}: {}", tmp.display(), e);
    }
    tracing::info!("expanded {}", doc.file_name);
    Ok(())
}
