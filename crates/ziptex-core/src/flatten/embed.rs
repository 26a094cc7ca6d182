//! Embedding of auxiliary and class files into documents.

use std::fs;
use std::path::Path;

use crate::directives;
use crate::document::Document;
use crate::error::Result;
use crate::ledger::Ledger;

use super::read_text;

/// Embed `<stem>.aux` into the document if it exists.
///
/// Returns the name of the embedded file.
pub fn inline_aux(dir: &Path, doc: &Document, ledger: &mut Ledger) -> Result<Option<String>> {
    let aux = doc.aux_name();
    let aux_path = dir.join(&aux);
    if !aux_path.is_file() {
        return Ok(None);
    }

    let tex_path = dir.join(&doc.file_name);
    let content = read_text(&tex_path)?;
    let aux_content = read_text(&aux_path)?;

    fs::write(&tex_path, directives::embed_file(&aux, &aux_content, &content))?;
    ledger.record(&aux);
    tracing::info!("embedded {} into {}", aux, doc.file_name);
    Ok(Some(aux))
}

/// Names of the `.cls` files directly inside `dir`, sorted.
pub fn class_files(dir: &Path) -> Result<Vec<String>> {
    let mut classes: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".cls"))
        .collect();
    classes.sort();
    Ok(classes)
}

/// Embed every class in `classes` that the document declares.
///
/// The document is re-read through each iteration since embedding changes
/// it. An unreadable class file is skipped. Returns the embedded names.
pub fn inline_classes(
    dir: &Path,
    doc: &Document,
    classes: &[String],
    ledger: &mut Ledger,
) -> Result<Vec<String>> {
    let tex_path = dir.join(&doc.file_name);
    let mut content = read_text(&tex_path)?;
    let mut inlined = Vec::new();

    for cls in classes {
        let class_name = cls.trim_end_matches(".cls");
        if !directives::declares_class(&content, class_name) {
            continue;
        }

        let class_content = match read_text(&dir.join(cls)) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("error reading class file {}: {}", cls, e);
                continue;
            }
        };

        content = directives::embed_file(cls, &class_content, &content);
        fs::write(&tex_path, &content)?;
        ledger.record(cls);
        tracing::info!("embedded {} into {}", cls, doc.file_name);
        inlined.push(cls.clone());
    }

    Ok(inlined)
}
