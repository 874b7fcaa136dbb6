//! Content scanning.
//!
//! Stage 1 of the build. Walks each locale root and produces an ordered
//! [`LocaleTour`] that the page generator consumes.
//!
//! ## Directory Structure
//!
//! ```text
//! tour/                            # English locale root (content root)
//! ├── index.md                     # Landing page text
//! ├── index.mbt                    # Landing page code
//! ├── 01_intro/                    # Chapter "intro"
//! │   ├── 01_hello/                # Lesson "hello"
//! │   │   ├── index.md
//! │   │   └── index.mbt
//! │   └── 02_types/
//! ├── 02_control_flow/             # Chapter "control flow"
//! │   └── 01_for_loops/
//! └── zh/                          # Chinese locale root, same layout
//! ```
//!
//! ## Ordering
//!
//! Chapters and lessons are ordered by their numeric prefix. Every directory
//! must follow `NN_name`; anything else, and two siblings sharing a number,
//! abort the scan with the offending path. Hidden entries are ignored, as are
//! the roots of other locales nested inside this one.
//!
//! ## Lesson Numbering
//!
//! Lesson `index` is the position in the flattened sequence of all lessons of
//! the locale, not the position inside its chapter, and `total` is the length
//! of that sequence.

use crate::config::SiteConfig;
use crate::naming::{self, NameError, ParsedName};
use crate::types::{Chapter, Intro, Lesson, Locale, LocaleTour, Tour};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot list {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("missing file: {0}")]
    MissingFile(PathBuf),
    #[error("malformed directory name {path}: {reason}")]
    MalformedName { path: PathBuf, reason: NameError },
    #[error("duplicate number {number} in {dir}")]
    DuplicateNumber { number: u32, dir: PathBuf },
    #[error("chapter has no lessons: {0}")]
    EmptyChapter(PathBuf),
    #[error("no chapters found in {0}")]
    EmptyTour(PathBuf),
}

/// Scan every configured locale of the tour under `source`.
///
/// The locales are scanned independently; they only share the locale tag
/// carried by each lesson.
pub fn scan(source: &Path, config: &SiteConfig) -> Result<Tour, ScanError> {
    let roots: Vec<(Locale, PathBuf)> = Locale::ALL
        .iter()
        .map(|&l| (l, config.locales.get(l).resolve_root(source)))
        .collect();

    let mut locales = Vec::with_capacity(roots.len());
    for (locale, root) in &roots {
        let skip: Vec<PathBuf> = roots
            .iter()
            .filter(|(other, _)| other != locale)
            .map(|(_, path)| path.clone())
            .collect();
        locales.push(scan_locale(root, *locale, &config.code_extension, &skip)?);
    }

    Ok(Tour { locales })
}

/// Scan a single locale root into ordered chapters and lessons.
///
/// `skip` lists directories that are never chapters (other locale roots).
pub fn scan_locale(
    root: &Path,
    locale: Locale,
    code_extension: &str,
    skip: &[PathBuf],
) -> Result<LocaleTour, ScanError> {
    let code_file = format!("index.{code_extension}");
    let intro = Intro {
        markdown: read_required(&root.join("index.md"))?,
        code: read_required(&root.join(&code_file))?,
    };

    let mut chapters = Vec::new();
    for (parsed, chapter_dir) in numbered_dirs(root, skip)? {
        let mut lessons = Vec::new();
        for (lesson_name, lesson_dir) in numbered_dirs(&chapter_dir, &[])? {
            lessons.push(Lesson {
                chapter: parsed.display_title.clone(),
                lesson: lesson_name.display_title,
                index: 0,
                total: 0,
                markdown: read_required(&lesson_dir.join("index.md"))?,
                code: read_required(&lesson_dir.join(&code_file))?,
                locale,
                source_dir: relative(&lesson_dir, root),
            });
        }
        if lessons.is_empty() {
            return Err(ScanError::EmptyChapter(chapter_dir));
        }
        chapters.push(Chapter {
            name: parsed.display_title,
            number: parsed.number,
            source_dir: relative(&chapter_dir, root),
            lessons,
        });
    }

    if chapters.is_empty() {
        return Err(ScanError::EmptyTour(root.to_path_buf()));
    }

    number_lessons(&mut chapters);
    debug!(
        locale = locale.code(),
        chapters = chapters.len(),
        lessons = chapters.iter().map(|c| c.lessons.len()).sum::<usize>(),
        "scanned locale"
    );

    Ok(LocaleTour {
        locale,
        intro,
        chapters,
    })
}

/// Assign flattened positions: index counts across chapter boundaries.
fn number_lessons(chapters: &mut [Chapter]) {
    let total = chapters.iter().map(|c| c.lessons.len()).sum();
    for (index, lesson) in chapters
        .iter_mut()
        .flat_map(|c| c.lessons.iter_mut())
        .enumerate()
    {
        lesson.index = index;
        lesson.total = total;
    }
}

/// List the `NN_name` subdirectories of `dir`, sorted by number.
fn numbered_dirs(dir: &Path, skip: &[PathBuf]) -> Result<Vec<(ParsedName, PathBuf)>, ScanError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || skip.iter().any(|s| s == entry.path()) {
            continue;
        }
        let parsed =
            naming::parse_entry_name(&name).map_err(|reason| ScanError::MalformedName {
                path: entry.path().to_path_buf(),
                reason,
            })?;
        entries.push((parsed, entry.path().to_path_buf()));
    }

    entries.sort_by_key(|(parsed, _)| parsed.number);
    if let Some(pair) = entries.windows(2).find(|w| w[0].0.number == w[1].0.number) {
        return Err(ScanError::DuplicateNumber {
            number: pair[0].0.number,
            dir: dir.to_path_buf(),
        });
    }
    Ok(entries)
}

fn read_required(path: &Path) -> Result<String, ScanError> {
    if !path.is_file() {
        return Err(ScanError::MissingFile(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
