//! Shared types used across the build and the client runtime.
//!
//! The scanner produces [`Tour`] → [`LocaleTour`] → [`Chapter`] → [`Lesson`],
//! the generator turns lessons into [`Page`]s, and every page is serialized
//! into a [`RouteState`] that the client router fetches and broadcasts. The
//! route state is the only type that crosses the build/runtime boundary, so
//! its JSON shape is fixed here.

use crate::naming::slug_segment;
use serde::{Deserialize, Serialize};

/// The two locales a tour is published in.
///
/// English is the default locale and lives at the site root; Chinese pages
/// live under a `zh/` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Zh,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Zh];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }

    /// Label shown in the locale switcher.
    pub fn label(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Zh => "中文",
        }
    }

    /// Path segment prepended to every slug of this locale.
    pub fn slug_prefix(self) -> Option<&'static str> {
        match self {
            Locale::En => None,
            Locale::Zh => Some("zh"),
        }
    }

    /// Prefix a locale-neutral path with this locale's segment.
    ///
    /// ```text
    /// En.prefixed("intro/hello") → "intro/hello"
    /// Zh.prefixed("intro/hello") → "zh/intro/hello"
    /// Zh.prefixed("")            → "zh"
    /// ```
    pub fn prefixed(self, path: &str) -> String {
        match self.slug_prefix() {
            None => path.to_string(),
            Some(prefix) if path.is_empty() => prefix.to_string(),
            Some(prefix) => format!("{prefix}/{path}"),
        }
    }

    /// Remove this locale's segment from one of its page paths, yielding the
    /// neutral path. Paths of other locales are returned unchanged.
    ///
    /// ```text
    /// Zh.unprefixed("zh/intro/hello") → "intro/hello"
    /// Zh.unprefixed("zh")             → ""
    /// En.unprefixed("zh/basics")      → "zh/basics"
    /// ```
    pub fn unprefixed(self, path: &str) -> &str {
        match self.slug_prefix() {
            None => path,
            Some(prefix) if path == prefix => "",
            Some(prefix) => path
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(path),
        }
    }

    /// Locale whose switcher label is `label`.
    pub fn from_label(label: &str) -> Option<Locale> {
        Locale::ALL.into_iter().find(|l| l.label() == label)
    }
}

/// A single lesson: explanatory markdown plus a runnable code sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lesson {
    /// Display name of the owning chapter (`01_hello_world` → "hello world")
    pub chapter: String,
    /// Display name of the lesson
    pub lesson: String,
    /// Position in the locale's flattened lesson sequence (0-based)
    pub index: usize,
    /// Number of lessons in the locale
    pub total: usize,
    pub markdown: String,
    pub code: String,
    pub locale: Locale,
    /// Lesson directory relative to the locale root, for reporting
    pub source_dir: String,
}

impl Lesson {
    /// `chapter-name/lesson-name`, locale-prefixed for non-default locales.
    pub fn slug(&self) -> String {
        self.locale.prefixed(&format!(
            "{}/{}",
            slug_segment(&self.chapter),
            slug_segment(&self.lesson)
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    pub name: String,
    pub number: u32,
    pub source_dir: String,
    pub lessons: Vec<Lesson>,
}

/// Landing-page content found at the root of a locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intro {
    pub markdown: String,
    pub code: String,
}

/// Everything scanned for one locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocaleTour {
    pub locale: Locale,
    pub intro: Intro,
    pub chapters: Vec<Chapter>,
}

impl LocaleTour {
    /// Lessons of all chapters in flattened order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.chapters.iter().flat_map(|c| c.lessons.iter())
    }
}

/// Scan result for the whole tour, one entry per locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tour {
    pub locales: Vec<LocaleTour>,
}

impl Tour {
    pub fn locale(&self, locale: Locale) -> Option<&LocaleTour> {
        self.locales.iter().find(|t| t.locale == locale)
    }

    /// Look a lesson up by its slug across all locales.
    pub fn find_lesson(&self, slug: &str) -> Option<&Lesson> {
        let slug = slug.trim_matches('/');
        self.locales
            .iter()
            .flat_map(|t| t.lessons())
            .find(|l| l.slug() == slug)
    }
}

/// Denormalized render unit: everything one HTML page and its route state need.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Output directory relative to the site root (`""` for the English index)
    pub path: String,
    pub title: String,
    pub toc: String,
    pub markdown_html: String,
    /// Raw code sample, used to seed the editor buffer
    pub code: String,
    pub code_html: String,
    pub back: String,
    pub next: String,
    /// 1-based position shown in the lesson counter
    pub index: usize,
    pub total: usize,
    pub locale: Locale,
    pub en_href: String,
    pub zh_href: String,
    pub home_page: String,
    pub home_page_href: String,
}

impl Page {
    /// Path of the generated HTML file relative to the output root.
    pub fn html_path(&self) -> String {
        file_in(&self.path, "index.html")
    }

    /// Path of the generated route-state file relative to the output root.
    pub fn json_path(&self) -> String {
        file_in(&self.path, "index.json")
    }

    /// Absolute href of this page.
    pub fn href(&self) -> String {
        page_href(&self.path)
    }

    pub fn route_state(&self) -> RouteState {
        RouteState {
            title: self.title.clone(),
            markdown_html: self.markdown_html.clone(),
            code: self.code.clone(),
            code_html: self.code_html.clone(),
            back: self.back.clone(),
            next: self.next.clone(),
            index: self.index,
            total: self.total,
            locale: self.locale.label().to_string(),
            en_href: self.en_href.clone(),
            zh_href: self.zh_href.clone(),
            home_page: self.home_page.clone(),
            home_page_href: self.home_page_href.clone(),
            toc: self.toc.clone(),
        }
    }
}

/// Absolute href for a page directory: `intro/hello` → `/intro/hello/index.html`.
pub fn page_href(path: &str) -> String {
    format!("/{}", file_in(path, "index.html"))
}

fn file_in(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

/// Minimal payload needed to swap a page in place, stored as `index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteState {
    pub title: String,
    pub markdown_html: String,
    pub code: String,
    pub code_html: String,
    pub back: String,
    pub next: String,
    pub index: usize,
    pub total: usize,
    pub locale: String,
    pub en_href: String,
    pub zh_href: String,
    pub home_page: String,
    pub home_page_href: String,
    pub toc: String,
}
