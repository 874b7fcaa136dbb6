//! Static page and route-state generation.
//!
//! Stage 2 of the build. Turns the scanned [`Tour`] into one [`Page`] per
//! lesson, one index page and one table-of-contents page per locale, then
//! writes each page twice: as HTML through the template and as the JSON route
//! state the client fetches on navigation.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html / index.json                  # English landing page
//! ├── table-of-contents/index.{html,json}      # Optional TOC page
//! ├── intro/
//! │   ├── hello/index.{html,json}              # slug "intro/hello"
//! │   └── types/index.{html,json}
//! └── zh/
//!     ├── index.html / index.json
//!     └── intro/hello/index.{html,json}
//! ```
//!
//! ## Navigation
//!
//! Lessons of a locale are flattened across chapters. The first lesson links
//! back to the locale's index page, the last one has a disabled next link,
//! every other link points at the adjacent lesson. The index page is counted
//! as 1 of 1 and links forward to the first lesson.
//!
//! ## Rendering
//!
//! Markdown goes through pulldown-cmark, code is escaped into a
//! `pre.shiki > code` block and the TOC, links and disabled links are built
//! with [maud](https://maud.lambda.xyz/). Each page is a pure function of its
//! lesson, its neighbours and the locale's TOC string, so pages are computed
//! in parallel.

use crate::config::{LocaleConfig, SiteConfig};
use crate::template::{Template, TemplateError};
use crate::toc::TocTree;
use crate::types::{Lesson, Locale, LocaleTour, Page, Tour, page_href};
use maud::html;
use pulldown_cmark::{Options, Parser, html as md_html};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Path segment of the table-of-contents page.
pub const TOC_PAGE_SEGMENT: &str = "table-of-contents";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("two pages share the path \"{path}\" ({first} and {second})")]
    DuplicateSlug {
        path: String,
        first: String,
        second: String,
    },
    #[error("locale {0} has no lessons")]
    EmptyLocale(&'static str),
}

/// Compute every page of the tour.
///
/// Pages come out per locale: index page, lessons in flattened order, then
/// the TOC page when enabled.
pub fn collect(tour: &Tour, config: &SiteConfig) -> Result<Vec<Page>, GenerateError> {
    let mut pages = Vec::new();
    for locale_tour in &tour.locales {
        pages.extend(collect_locale(locale_tour, config)?);
    }
    check_unique_paths(&pages)?;
    info!(pages = pages.len(), "collected pages");
    Ok(pages)
}

fn collect_locale(tour: &LocaleTour, config: &SiteConfig) -> Result<Vec<Page>, GenerateError> {
    let locale = tour.locale;
    let labels = config.locales.get(locale);
    let lessons: Vec<&Lesson> = tour.lessons().collect();
    let first = lessons
        .first()
        .ok_or(GenerateError::EmptyLocale(locale.code()))?;

    let toc = TocTree::from_chapters(&tour.chapters).render();
    let home_path = locale.prefixed("");
    let home_href = page_href(&home_path);

    let mut pages = Vec::with_capacity(lessons.len() + 2);
    pages.push(Page {
        title: labels.title.clone(),
        toc: toc.clone(),
        markdown_html: render_markdown(&tour.intro.markdown),
        code: tour.intro.code.clone(),
        code_html: render_code(&tour.intro.code),
        back: disabled(&labels.back),
        next: link(&page_href(&first.slug()), &labels.next),
        index: 1,
        total: 1,
        ..page_shell(home_path, locale, labels)
    });

    let lesson_pages: Vec<Page> = lessons
        .par_iter()
        .enumerate()
        .map(|(i, lesson)| {
            let back = match i.checked_sub(1) {
                Some(prev) => page_href(&lessons[prev].slug()),
                None => home_href.clone(),
            };
            let next = match lessons.get(i + 1) {
                Some(next) => link(&page_href(&next.slug()), &labels.next),
                None => disabled(&labels.next),
            };
            Page {
                title: format!("{} - {}", lesson.lesson, labels.title),
                toc: toc.clone(),
                markdown_html: render_markdown(&lesson.markdown),
                code: lesson.code.clone(),
                code_html: render_code(&lesson.code),
                back: link(&back, &labels.back),
                next,
                index: lesson.index + 1,
                total: lesson.total,
                ..page_shell(lesson.slug(), locale, labels)
            }
        })
        .collect();
    pages.extend(lesson_pages);

    if config.toc_page {
        let markdown = toc_markdown(tour, &labels.toc_title);
        pages.push(Page {
            title: format!("{} - {}", labels.toc_title, labels.title),
            toc: toc.clone(),
            markdown_html: render_markdown(&markdown),
            code: String::new(),
            code_html: render_code(""),
            back: disabled(&labels.back),
            next: disabled(&labels.next),
            index: 1,
            total: 1,
            ..page_shell(locale.prefixed(TOC_PAGE_SEGMENT), locale, labels)
        });
    }

    debug!(locale = locale.code(), pages = pages.len(), "built locale pages");
    Ok(pages)
}

/// A page with the locale-dependent fields filled in and empty content.
fn page_shell(path: String, locale: Locale, labels: &LocaleConfig) -> Page {
    let neutral = locale.unprefixed(&path).to_string();
    Page {
        title: String::new(),
        toc: String::new(),
        markdown_html: String::new(),
        code: String::new(),
        code_html: String::new(),
        back: String::new(),
        next: String::new(),
        index: 0,
        total: 0,
        locale,
        en_href: page_href(&Locale::En.prefixed(&neutral)),
        zh_href: page_href(&Locale::Zh.prefixed(&neutral)),
        home_page: labels.title.clone(),
        home_page_href: page_href(&locale.prefixed("")),
        path,
    }
}

fn check_unique_paths(pages: &[Page]) -> Result<(), GenerateError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(pages.len());
    for page in pages {
        if !seen.insert(&page.path) {
            let first = pages
                .iter()
                .find(|p| p.path == page.path)
                .map(|p| p.title.clone())
                .unwrap_or_default();
            return Err(GenerateError::DuplicateSlug {
                path: page.path.clone(),
                first,
                second: page.title.clone(),
            });
        }
    }
    Ok(())
}

fn toc_markdown(tour: &LocaleTour, heading: &str) -> String {
    let mut md = format!("# {heading}\n");
    for chapter in &tour.chapters {
        md.push_str(&format!("\n## {}\n\n", chapter.name));
        for lesson in &chapter.lessons {
            md.push_str(&format!(
                "- [{}]({})\n",
                lesson.lesson,
                page_href(&lesson.slug())
            ));
        }
    }
    md
}

// ============================================================================
// Fragments
// ============================================================================

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

pub fn render_code(code: &str) -> String {
    html! {
        pre.shiki {
            code { (code) }
        }
    }
    .into_string()
}

fn link(href: &str, label: &str) -> String {
    html! { a href=(href) { (label) } }.into_string()
}

fn disabled(label: &str) -> String {
    html! { span.text-zinc-500 { (label) } }.into_string()
}

// ============================================================================
// Output
// ============================================================================

/// Substitute the page into the template.
pub fn render(template: &Template, page: &Page) -> String {
    template.render(&page.placeholders())
}

/// Serialize the page's route state.
pub fn route(page: &Page) -> Result<String, serde_json::Error> {
    serde_json::to_string(&page.route_state())
}

/// Write `<path>/index.html` and `<path>/index.json` for every page.
pub fn write_site(pages: &[Page], template: &Template, out_dir: &Path) -> Result<(), GenerateError> {
    pages.par_iter().try_for_each(|page| {
        let dir = out_dir.join(&page.path);
        fs::create_dir_all(&dir).map_err(|source| GenerateError::Io {
            path: dir.clone(),
            source,
        })?;
        write_file(&out_dir.join(page.html_path()), &render(template, page))?;
        write_file(&out_dir.join(page.json_path()), &route(page)?)
    })?;
    info!(out = %out_dir.display(), files = pages.len() * 2, "site written");
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), GenerateError> {
    fs::write(path, contents).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })
}
