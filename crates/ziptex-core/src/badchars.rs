//! Detection of glyphs the compiler's fonts cannot render.
//!
//! A previous compile leaves lines like
//! `Missing character: There is no ≥ (U+2265) in font cmr10!` in the log.
//! The detector pulls out the glyphs and finds where they occur in the
//! project's `.tex` and `.bib` sources.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

static RE_MISSING_GLYPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"There is no (.) \(.*?\) in font").expect("valid missing glyph regex")
});

/// Source suffixes searched for offending glyphs. `.bbl` is generated and
/// deliberately absent.
const SOURCE_EXTENSIONS: [&str; 2] = ["tex", "bib"];

/// An offending glyph and where it appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadCharReport {
    pub glyph: String,
    pub locations: Vec<String>,
}

/// Distinct offending glyphs in a compiler log, in order of appearance.
pub fn scan(log_path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(log_path)?;
    Ok(scan_text(&String::from_utf8_lossy(&bytes)))
}

/// Same as [`scan`] on log text already in memory.
pub fn scan_text(log: &str) -> Vec<String> {
    let mut glyphs: Vec<String> = Vec::new();
    for caps in RE_MISSING_GLYPH.captures_iter(log) {
        let glyph = &caps[1];
        if !glyphs.iter().any(|g| g == glyph) {
            glyphs.push(glyph.to_string());
        }
    }
    glyphs
}

/// Every line of the sources directly inside `dir` containing `glyph`,
/// formatted as `file:line: trimmed text`.
pub fn locate(glyph: &str, dir: &Path) -> Result<Vec<String>> {
    let mut locations = Vec::new();

    for ext in SOURCE_EXTENSIONS {
        let mut files: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(ext))
            .collect();
        files.sort();

        for file in files {
            let Ok(bytes) = fs::read(&file) else {
                tracing::debug!("skipping unreadable {}", file.display());
                continue;
            };
            let content = String::from_utf8_lossy(&bytes);
            if !content.contains(glyph) {
                continue;
            }

            let name = file.strip_prefix(dir).unwrap_or(&file).display().to_string();
            for (i, line) in content.lines().enumerate() {
                if line.contains(glyph) {
                    locations.push(format!("{}:{}: {}", name, i + 1, line.trim()));
                }
            }
        }
    }

    Ok(locations)
}

/// Scan a log and locate every offending glyph in `dir`.
pub fn report(log_path: &Path, dir: &Path) -> Result<Vec<BadCharReport>> {
    scan(log_path)?
        .into_iter()
        .map(|glyph| {
            let locations = locate(&glyph, dir)?;
            Ok(BadCharReport { glyph, locations })
        })
        .collect()
}
