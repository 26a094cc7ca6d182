//! End-to-end runs of the packaging pipeline against a fake TeX toolchain.

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use ziptex_core::{
    ArchiveFormat, Document, Error, PackCallback, PackConfig, Packer, ToolNames, ToolOutput,
    ToolRunner, Toolchain,
};

/// Stand-in for pdflatex, latexpand and bzip2.
///
/// The compiler records the files a document "uses" by looking at its text;
/// the expander inlines `\input` and the bibliography and leaves a `.bak`
/// behind; the compressor returns its input unchanged.
#[derive(Default)]
struct FakeTex {
    fail_verify: bool,
}

impl FakeTex {
    fn record(&self, cwd: &Path, tex: &str) -> io::Result<()> {
        let content = fs::read_to_string(cwd.join(tex))?;
        let stem = tex.trim_end_matches(".tex");
        let mut record = format!(
            "PWD {}\nINPUT /usr/share/texmf-dist/tex/latex/base/article.cls\nINPUT ./{}\n",
            cwd.display(),
            tex
        );

        let mut inputs = Vec::new();
        if content.contains("\\documentclass{mine}") {
            inputs.push("mine.cls".to_string());
        }
        if content.contains("\\input{intro}") {
            inputs.push("intro.tex".to_string());
        }
        if content.contains("\\bibliography{") {
            inputs.push(format!("{}.bbl", stem));
        }
        if content.contains("\\includegraphics{img}") {
            if content.contains("\\graphicspath") {
                inputs.push("figures/img.png".to_string());
            } else {
                inputs.push("img.png".to_string());
            }
        }
        inputs.push(format!("{}.aux", stem));

        // hyperref bookmarks, regenerated on every run
        fs::write(cwd.join(format!("{}.out", stem)), "\\BOOKMARK\n")?;
        inputs.push(format!("{}.out", stem));

        for input in inputs {
            if cwd.join(&input).is_file() {
                record.push_str(&format!("INPUT {}\n", input));
            }
        }
        record.push_str(&format!("INPUT ./{}\nOUTPUT {}.log\n", tex, stem));
        fs::write(cwd.join(format!("{}.fls", stem)), record)
    }

    fn expand(&self, cwd: &Path, args: &[String]) -> io::Result<ToolOutput> {
        let position = |flag: &str| args.iter().position(|a| a == flag);
        let output = position("-o").map(|i| args[i + 1].clone());
        let bbl = position("--expand-bbl").map(|i| args[i + 1].clone());
        let (Some(output), Some(input)) = (output, args.last()) else {
            return Ok(ToolOutput::failed("usage: latexpand [options] FILE"));
        };

        let mut content = fs::read_to_string(cwd.join(input))?;
        if content.contains("\\input{intro}") {
            let intro = fs::read_to_string(cwd.join("intro.tex"))?;
            content = content.replace("\\input{intro}", intro.trim_end());
        }
        if let Some(bbl) = bbl {
            let bibliography = fs::read_to_string(cwd.join(&bbl))?;
            content = content.replace("\\bibliography{refs}", bibliography.trim_end());
        }
        let backup = format!("{}.bak", output.trim_end_matches(".tex"));
        fs::write(cwd.join(backup), "editor backup\n")?;
        fs::write(cwd.join(output), content)?;
        Ok(ToolOutput::ok(""))
    }
}

impl ToolRunner for FakeTex {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<ToolOutput> {
        if args.first().map(String::as_str) == Some("--version") {
            return Ok(ToolOutput::ok(format!("{} (fake) 1.0", program)));
        }
        let last = args.last().cloned().unwrap_or_default();

        match program {
            "pdflatex" if args.iter().any(|a| a == "-record") => {
                self.record(cwd, &last)?;
                Ok(ToolOutput::ok("Output written on paper.pdf"))
            }
            "pdflatex" if self.fail_verify => Ok(ToolOutput::failed(
                "! LaTeX Error: File `missing.sty' not found.",
            )),
            "pdflatex" => Ok(ToolOutput::ok("Output written on paper.pdf")),
            "latexpand" => self.expand(cwd, args),
            "bzip2" => Ok(ToolOutput::ok(fs::read(cwd.join(&last))?)),
            other => Err(io::Error::new(io::ErrorKind::NotFound, other.to_string())),
        }
    }
}

/// Records callback events as strings.
#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<String>>,
}

impl PackCallback for Recorder {
    fn on_inlined(&self, file: &Path, document: &Document) {
        self.events
            .borrow_mut()
            .push(format!("inlined {} into {}", file.display(), document.file_name));
    }

    fn on_moved(&self, from: &Path, to: &Path) {
        self.events
            .borrow_mut()
            .push(format!("moved {} to {}", from.display(), to.display()));
    }

    fn on_bibliography(&self, path: &Path) {
        self.events.borrow_mut().push(format!("bib {}", path.display()));
    }

    fn on_archive(&self, format: ArchiveFormat, _path: &Path) {
        self.events.borrow_mut().push(format!("archive {}", format));
    }
}

struct Project {
    _temp: TempDir,
    root: PathBuf,
    out: PathBuf,
}

/// A project using a local class, an aux file, `\input`, a graphics
/// directory and a bibliography.
fn full_project() -> Project {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let root = temp.path().join("paper-2024");
    let out = temp.path().join("out");
    fs::create_dir_all(root.join("figures")).unwrap();
    fs::create_dir(&out).unwrap();

    fs::write(
        root.join("paper.tex"),
        "\\documentclass{mine}\n\
         \\graphicspath{{figures/}}\n\
         \\begin{document}\n\
         \\input{intro}\n\
         \\includegraphics{img}\n\
         \\bibliography{refs}\n\
         \\end{document}\n",
    )
    .unwrap();
    fs::write(root.join("intro.tex"), "Welcome to the introduction.\n").unwrap();
    fs::write(root.join("mine.cls"), "\\LoadClass{article}\n").unwrap();
    fs::write(root.join("paper.aux"), "\\relax\n").unwrap();
    fs::write(root.join("paper.bbl"), "\\begin{thebibliography}{1}\n\\end{thebibliography}\n").unwrap();
    fs::write(root.join("refs.bib"), "@book{knuth84, title={The TeXbook}}\n").unwrap();
    fs::write(root.join("figures/img.png"), "png").unwrap();
    fs::write(root.join("unused.txt"), "not a dependency").unwrap();

    Project {
        _temp: temp,
        root,
        out,
    }
}

fn packer<'a>(config: PackConfig, fake: FakeTex) -> Packer<'a> {
    Packer::new(config, Toolchain::new(Box::new(fake), ToolNames::default()))
}

fn zip_entries(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

fn zip_text(path: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut text = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text
}

#[test]
fn test_full_project_zip() {
    let project = full_project();
    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["paper.tex"])
        .with_format(ArchiveFormat::Zip);
    let recorder = Recorder::default();

    let report = packer(config, FakeTex::default())
        .with_callback(&recorder)
        .run()
        .expect("pipeline should succeed");

    let zip_path = project.out.join("paper-2024.zip");
    assert_eq!(report.archives.len(), 1);
    assert_eq!(report.archives[0].path, zip_path);
    assert_eq!(
        zip_entries(&zip_path),
        vec!["LaTeX/img.png", "LaTeX/paper.tex", "LaTeX/refs.bib"]
    );

    let tex = zip_text(&zip_path, "LaTeX/paper.tex");
    assert!(tex.contains("\\begin{filecontents}{mine.cls}"));
    assert!(tex.contains("\\begin{filecontents}{paper.aux}"));
    assert!(tex.contains("Welcome to the introduction."));
    assert!(tex.contains("\\begin{thebibliography}"));
    assert!(!tex.contains("\\graphicspath"));

    let events = recorder.events.borrow();
    assert!(events.contains(&"bib refs.bib".to_string()));
    assert!(events.contains(&"inlined paper.aux into paper.tex".to_string()));
    assert!(events.contains(&"inlined mine.cls into paper.tex".to_string()));
    assert!(events.contains(&"moved figures/img.png to img.png".to_string()));
    assert!(events.contains(&"archive zip".to_string()));

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert!(report.work_dir_kept.is_none());
    assert!(!project.root.join("LaTeX").exists());
    // the project itself is untouched
    assert!(project.root.join("figures/img.png").exists());
}

#[test]
fn test_both_formats() {
    let project = full_project();
    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["paper.tex"])
        .with_format(ArchiveFormat::Zip)
        .with_format(ArchiveFormat::TarBz2);

    let report = packer(config, FakeTex::default()).run().unwrap();
    assert_eq!(report.archives.len(), 2);

    // the fake compressor is the identity, so the archive is a plain tar
    let tar_path = project.out.join("paper-2024.tar.bz2");
    let mut archive = tar::Archive::new(File::open(&tar_path).unwrap());
    let mut names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|entry| entry.unwrap().path().unwrap().display().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["LaTeX/img.png", "LaTeX/paper.tex", "LaTeX/refs.bib"]);
    assert!(!project.out.join("paper-2024.tar").exists());
}

#[test]
fn test_tar_intermediate_never_touches_output_dir() {
    let project = full_project();
    let own_tar = project.out.join("paper-2024.tar");
    fs::write(&own_tar, "a tar the user made").unwrap();

    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["paper.tex"])
        .with_format(ArchiveFormat::Zip)
        .with_format(ArchiveFormat::TarBz2)
        .with_debug(true);

    let report = packer(config, FakeTex::default()).run().unwrap();

    assert_eq!(report.archives.len(), 2);
    assert!(project.out.join("paper-2024.zip").is_file());
    assert!(project.out.join("paper-2024.tar.bz2").is_file());
    assert_eq!(fs::read_to_string(&own_tar).unwrap(), "a tar the user made");
    assert!(!project.root.join("LaTeX/paper-2024.tar").exists());
}

#[test]
fn test_existing_archive_aborts_before_work_area() {
    let project = full_project();
    let existing = project.out.join("paper-2024.zip");
    fs::write(&existing, "older submission").unwrap();

    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["paper.tex"])
        .with_format(ArchiveFormat::Zip);

    match packer(config, FakeTex::default()).run() {
        Err(Error::AlreadyExists(path)) => assert_eq!(path, existing),
        other => panic!("expected AlreadyExists, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(&existing).unwrap(), "older submission");
    assert!(!project.root.join("LaTeX").exists());
    assert!(!project.root.join("paper.fls").exists());
}

#[test]
fn test_existing_work_area_aborts() {
    let project = full_project();
    fs::create_dir(project.root.join("LaTeX")).unwrap();
    fs::write(project.root.join("LaTeX/leftover.tex"), "keep me").unwrap();

    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["paper.tex"])
        .with_format(ArchiveFormat::Zip);

    assert!(matches!(
        packer(config, FakeTex::default()).run(),
        Err(Error::AlreadyExists(_))
    ));
    assert!(project.root.join("LaTeX/leftover.tex").exists());
    assert!(!project.out.join("paper-2024.zip").exists());
}

#[test]
fn test_bad_characters_stop_unless_forced() {
    let project = full_project();
    fs::write(
        project.root.join("paper.log"),
        "Missing character: There is no ≥ (U+2265) in font cmr10!\n",
    )
    .unwrap();
    fs::write(project.root.join("intro.tex"), "We need x ≥ 0.\n").unwrap();

    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["paper.tex"])
        .with_format(ArchiveFormat::Zip);

    match packer(config.clone(), FakeTex::default()).run() {
        Err(Error::BadCharacters { document, glyphs }) => {
            assert_eq!(document, "paper.tex");
            assert_eq!(glyphs, vec!["≥"]);
        }
        other => panic!("expected BadCharacters, got {:?}", other),
    }
    assert!(!project.root.join("LaTeX").exists());

    let report = packer(config.with_force(true), FakeTex::default())
        .run()
        .unwrap();
    assert!(report.warnings.iter().any(|w| w.contains("bad characters")));
    assert!(project.out.join("paper-2024.zip").exists());
}

#[test]
fn test_verify_failure_is_fatal_unless_forced() {
    let project = full_project();
    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["paper.tex"])
        .with_format(ArchiveFormat::Zip);

    let fake = FakeTex { fail_verify: true };
    assert!(matches!(
        packer(config.clone(), fake).run(),
        Err(Error::Compile { .. })
    ));
    assert!(!project.out.join("paper-2024.zip").exists());

    let fake = FakeTex { fail_verify: true };
    let report = packer(config.with_force(true), fake).run().unwrap();
    assert!(report.warnings.iter().any(|w| w.contains("missing.sty")));
    assert!(project.out.join("paper-2024.zip").exists());
}

#[test]
fn test_invalid_inputs_skipped() {
    let project = full_project();
    fs::create_dir(project.root.join("chapters")).unwrap();
    fs::write(project.root.join("chapters/paper.tex"), "duplicate name").unwrap();

    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["paper.tex", "notes.md", "ghost.tex", "chapters/paper.tex"])
        .with_format(ArchiveFormat::Zip);

    let report = packer(config, FakeTex::default()).run().unwrap();

    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.warnings.len(), 3, "{:?}", report.warnings);
}

#[test]
fn test_no_valid_documents() {
    let project = full_project();
    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["ghost.tex"])
        .with_format(ArchiveFormat::Zip);

    assert!(matches!(
        packer(config, FakeTex::default()).run(),
        Err(Error::NoDocuments)
    ));
    assert!(!project.root.join("LaTeX").exists());
}

#[test]
fn test_debug_keeps_work_area_with_snapshots() {
    let project = full_project();
    let config = PackConfig::new(&project.root, &project.out)
        .with_inputs(["paper.tex"])
        .with_format(ArchiveFormat::Zip)
        .with_debug(true);

    let report = packer(config, FakeTex::default()).run().unwrap();

    let work = project.root.join("LaTeX");
    assert_eq!(report.work_dir_kept.as_deref(), Some(work.as_path()));
    assert!(work.join("paper.tex.after_expand").exists());
    assert!(work.join("paper.tex.after_dirs").exists());
    assert!(!work.join("mine.cls").exists());
    assert!(!work.join("paper.out").exists());
    assert!(!work.join("paper.bak").exists());
    let entries = zip_entries(&project.out.join("paper-2024.zip"));
    assert!(!entries.iter().any(|name| name.contains("after_")));
    assert!(!entries.iter().any(|name| name.ends_with(".bak")));
}
