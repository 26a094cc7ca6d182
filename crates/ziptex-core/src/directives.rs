//! Recognition and rewriting of the few LaTeX directives the flattener
//! touches: `\documentclass`, `\bibliography` and `\graphicspath`.
//!
//! This is pattern based and does not understand comments or arbitrarily
//! nested braces. Callers only go through the functions below, so the
//! scanner can be replaced by a tokenizer without touching them.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

static RE_BIBLIOGRAPHY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\bibliography\s*\{([^}]+)\}").expect("valid bibliography regex")
});
static RE_DOCUMENTCLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\documentclass\s*(?:\[[^\]]*\])?\s*\{([^}]*)\}").expect("valid documentclass regex")
});
static RE_GRAPHICSPATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\graphicspath\s*\{((?:\s*\{[^{}]*\})+)\s*\}").expect("valid graphicspath regex")
});
static RE_BRACE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid brace group regex"));

/// Bibliography source files named by the first `\bibliography{...}`.
///
/// `\bibliography{refs}` yields `refs.bib`; a list such as
/// `\bibliography{refs, extra.bib}` yields one file per entry.
pub fn bibliography_files(src: &str) -> Vec<PathBuf> {
    let Some(caps) = RE_BIBLIOGRAPHY.captures(src) else {
        return Vec::new();
    };

    caps[1]
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            if name.ends_with(".bib") {
                PathBuf::from(name)
            } else {
                PathBuf::from(format!("{}.bib", name))
            }
        })
        .collect()
}

/// Whether a `\documentclass` in `src` names exactly `class`.
pub fn declares_class(src: &str, class: &str) -> bool {
    RE_DOCUMENTCLASS
        .captures_iter(src)
        .any(|caps| caps[1].trim() == class)
}

/// Directories declared by the first `\graphicspath`, in declaration order.
///
/// Trailing `/` and a leading `./` are removed: `{{./figures/}}` gives
/// `figures`.
pub fn graphics_paths(src: &str) -> Vec<String> {
    let Some(caps) = RE_GRAPHICSPATH.captures(src) else {
        return Vec::new();
    };

    RE_BRACE_GROUP
        .captures_iter(&caps[1])
        .map(|group| {
            let dir = group[1].trim();
            let dir = dir.strip_prefix("./").unwrap_or(dir);
            dir.trim_end_matches('/').to_string()
        })
        .filter(|dir| !dir.is_empty())
        .collect()
}

/// Whether `src` contains a `\graphicspath` declaration.
pub fn has_graphics_path(src: &str) -> bool {
    RE_GRAPHICSPATH.is_match(src)
}

/// Remove every whole `\graphicspath{...}` command from `src`.
pub fn strip_graphics_path(src: &str) -> String {
    RE_GRAPHICSPATH.replace_all(src, "").into_owned()
}

/// Prepend `content` to `document` wrapped in a `filecontents` block, so
/// compiling the document recreates the file `name`.
pub fn embed_file(name: &str, content: &str, document: &str) -> String {
    let mut out = String::with_capacity(content.len() + document.len() + name.len() + 48);
    out.push_str("\\begin{filecontents}{");
    out.push_str(name);
    out.push_str("}\n");
    out.push_str(content);
    if !content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("\\end{filecontents}\n");
    out.push_str(document);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bibliography_single() {
        let src = "\\bibliographystyle{plain}\n\\bibliography{refs}\n";
        assert_eq!(bibliography_files(src), vec![PathBuf::from("refs.bib")]);
    }

    #[test]
    fn test_bibliography_list() {
        let src = "\\bibliography{refs, extra.bib}";
        assert_eq!(
            bibliography_files(src),
            vec![PathBuf::from("refs.bib"), PathBuf::from("extra.bib")]
        );
    }

    #[test]
    fn test_bibliography_absent() {
        assert!(bibliography_files("\\bibliographystyle{plain}").is_empty());
    }

    #[test]
    fn test_declares_class() {
        let src = "\\documentclass[11pt,twocolumn]{ieeeconf}\n\\usepackage{amsmath}";
        assert!(declares_class(src, "ieeeconf"));
        assert!(!declares_class(src, "ieee"));
        assert!(!declares_class(src, "amsmath"));
        assert!(declares_class("\\documentclass{ mythesis }", "mythesis"));
    }

    #[test]
    fn test_graphics_paths() {
        assert_eq!(graphics_paths("\\graphicspath{{figures/}}"), vec!["figures"]);
        assert_eq!(
            graphics_paths("\\graphicspath{ {./img/} {plots} }"),
            vec!["img", "plots"]
        );
        assert!(graphics_paths("\\includegraphics{figures/a}").is_empty());
    }

    #[test]
    fn test_strip_graphics_path_removes_whole_command() {
        let src = "\\usepackage{graphicx}\n\\graphicspath{{figures/}{more/}}\n\\begin{document}";
        let stripped = strip_graphics_path(src);
        assert_eq!(stripped, "\\usepackage{graphicx}\n\n\\begin{document}");
        assert!(!has_graphics_path(&stripped));
    }

    #[test]
    fn test_embed_file() {
        let out = embed_file("my.cls", "\\ProvidesClass{my}", "\\documentclass{my}\n");
        assert_eq!(
            out,
            "\\begin{filecontents}{my.cls}\n\\ProvidesClass{my}\n\\end{filecontents}\n\\documentclass{my}\n"
        );
    }
}
