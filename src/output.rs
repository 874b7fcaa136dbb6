//! CLI output formatting for all stages.
//!
//! # Information-First Display
//!
//! Every entity (chapter, lesson, page) leads with its positional index and
//! display name; the directory it came from or the file it produced is shown
//! as secondary context. The output reads as a content inventory while still
//! letting authors trace each entry back to the filesystem.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! English (3 lessons)
//!     Intro: index.md
//! 001 intro
//!     Source: 01_intro/
//!     001 hello
//!         Source: 01_intro/01_hello/
//!     002 types
//!         Source: 01_intro/02_types/
//! 002 loops
//!     Source: 02_loops/
//!     003 for
//!         Source: 02_loops/01_for/
//!
//! 中文 (3 lessons)
//! ...
//!
//! Config
//!     config.toml
//! ```
//!
//! ## Build
//!
//! ```text
//! Home → index.html
//! 001 hello → intro/hello/index.html
//! 002 types → intro/types/index.html
//! Table of Contents → table-of-contents/index.html
//!
//! Generated 10 pages (20 files)
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::generate::TOC_PAGE_SEGMENT;
use crate::playground::{Diagnostic, OutputPane, OutputStatus};
use crate::types::{Page, Tour};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Scan
// ============================================================================

/// Format the scanned tour: per locale, chapters with their lessons.
///
/// Lesson indices are the flattened positions, so they keep counting across
/// chapters exactly as the lesson counter on the pages does.
pub fn format_scan_output(tour: &Tour, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    for (n, locale_tour) in tour.locales.iter().enumerate() {
        if n > 0 {
            lines.push(String::new());
        }
        let lesson_count = locale_tour.lessons().count();
        lines.push(format!(
            "{} ({})",
            locale_tour.locale.label(),
            plural(lesson_count, "lesson")
        ));
        let intro = match locale_tour.locale.slug_prefix() {
            Some(prefix) => format!("{prefix}/index.md"),
            None => "index.md".to_string(),
        };
        lines.push(format!("{}Intro: {}", indent(1), intro));

        for (i, chapter) in locale_tour.chapters.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), chapter.name));
            lines.push(format!("{}Source: {}/", indent(1), chapter.source_dir));
            for lesson in &chapter.lessons {
                lines.push(format!(
                    "{}{} {}",
                    indent(1),
                    format_index(lesson.index + 1),
                    lesson.lesson
                ));
                lines.push(format!("{}Source: {}/", indent(2), lesson.source_dir));
            }
        }
    }

    let extras: Vec<&str> = ["config.toml", "template.html"]
        .into_iter()
        .filter(|name| source_root.join(name).is_file())
        .collect();
    if !extras.is_empty() {
        lines.push(String::new());
        lines.push("Config".to_string());
        for name in extras {
            lines.push(format!("{}{}", indent(1), name));
        }
    }

    lines
}

pub fn print_scan_output(tour: &Tour, source_root: &Path) {
    for line in format_scan_output(tour, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Display name of a page: "Home", the TOC title, or the lesson name.
fn page_label(page: &Page) -> String {
    if page.path == page.locale.prefixed("") {
        return "Home".to_string();
    }
    let bare = page
        .title
        .strip_suffix(&format!(" - {}", page.home_page))
        .unwrap_or(&page.title);
    if page.path.ends_with(TOC_PAGE_SEGMENT) {
        bare.to_string()
    } else {
        format!("{} {}", format_index(page.index), bare)
    }
}

pub fn format_generate_output(pages: &[Page]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut previous = None;
    for page in pages {
        if previous.is_some_and(|locale| locale != page.locale) {
            lines.push(String::new());
        }
        previous = Some(page.locale);
        lines.push(format!("{} → {}", page_label(page), page.html_path()));
    }
    lines.push(String::new());
    lines.push(format!(
        "Generated {} ({} files)",
        plural(pages.len(), "page"),
        pages.len() * 2
    ));
    lines
}

pub fn print_generate_output(pages: &[Page]) {
    for line in format_generate_output(pages) {
        println!("{}", line);
    }
}

/// One-line summary for `check`.
pub fn format_check_output(tour: &Tour, pages: &[Page]) -> String {
    let lessons: usize = tour.locales.iter().map(|t| t.lessons().count()).sum();
    format!(
        "OK: {}, {}, {}",
        plural(tour.locales.len(), "locale"),
        plural(lessons, "lesson"),
        plural(pages.len(), "page")
    )
}

// ============================================================================
// Run
// ============================================================================

pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.to_string()).collect()
}

/// Final state of the output pane after `run`.
pub fn format_pane(pane: &OutputPane) -> Vec<String> {
    match &pane.status {
        OutputStatus::Failed(diagnostics) => format_diagnostics(diagnostics),
        _ => pane.lines.clone(),
    }
}
