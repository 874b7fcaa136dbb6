//! Page template parsing and placeholder substitution.
//!
//! A template is plain HTML containing `%NAME%` tokens. Substitution is
//! verbatim: values are inserted as-is (they are already HTML), tokens the
//! template does not contain are simply not rendered, and inserted values are
//! never scanned for further tokens. A lesson whose markdown mentions
//! `%TITLE%` therefore renders literally.
//!
//! ## Placeholders
//!
//! ```text
//! %TITLE%          page title
//! %TOC%            table of contents HTML
//! %MARKDOWN%       rendered lesson text
//! %CODE%           rendered code sample
//! %BACK% %NEXT%    navigation links (or disabled spans)
//! %INDEX% %TOTAL%  lesson counter
//! %LOCALE%         locale label
//! %EN_HREF%        same page in English
//! %ZH_HREF%        same page in Chinese
//! %HOMEPAGE%       homepage label
//! %HOMEPAGE_HREF%  homepage href
//! ```
//!
//! Each token may appear at most once. The client swaps exactly one element
//! per field on navigation, so a duplicated token would leave a stale copy.

use crate::config::SiteConfig;
use crate::types::Page;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BUILTIN_TEMPLATE: &str = include_str!("../static/template.html");

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("placeholder {token} appears {count} times, expected at most once")]
    DuplicatePlaceholder { token: &'static str, count: usize },
    #[error("cannot read template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Title,
    Toc,
    Markdown,
    Code,
    Back,
    Next,
    Index,
    Total,
    Locale,
    EnHref,
    ZhHref,
    HomePage,
    HomePageHref,
}

impl Placeholder {
    pub const ALL: [Placeholder; 13] = [
        Placeholder::Title,
        Placeholder::Toc,
        Placeholder::Markdown,
        Placeholder::Code,
        Placeholder::Back,
        Placeholder::Next,
        Placeholder::Index,
        Placeholder::Total,
        Placeholder::Locale,
        Placeholder::EnHref,
        Placeholder::ZhHref,
        Placeholder::HomePage,
        Placeholder::HomePageHref,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Title => "%TITLE%",
            Placeholder::Toc => "%TOC%",
            Placeholder::Markdown => "%MARKDOWN%",
            Placeholder::Code => "%CODE%",
            Placeholder::Back => "%BACK%",
            Placeholder::Next => "%NEXT%",
            Placeholder::Index => "%INDEX%",
            Placeholder::Total => "%TOTAL%",
            Placeholder::Locale => "%LOCALE%",
            Placeholder::EnHref => "%EN_HREF%",
            Placeholder::ZhHref => "%ZH_HREF%",
            Placeholder::HomePage => "%HOMEPAGE%",
            Placeholder::HomePageHref => "%HOMEPAGE_HREF%",
        }
    }
}

/// A parsed template: the source text plus the position of every token in it.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
    /// `(byte offset, placeholder)` sorted by offset.
    slots: Vec<(usize, Placeholder)>,
}

impl Template {
    pub fn parse(text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        let mut slots = Vec::new();
        for placeholder in Placeholder::ALL {
            let token = placeholder.token();
            let positions: Vec<usize> = text.match_indices(token).map(|(i, _)| i).collect();
            if positions.len() > 1 {
                return Err(TemplateError::DuplicatePlaceholder {
                    token,
                    count: positions.len(),
                });
            }
            slots.extend(positions.into_iter().map(|i| (i, placeholder)));
        }
        slots.sort_by_key(|(offset, _)| *offset);

        // `%TITLE%TOC%` matches both tokens; the earlier one wins.
        let mut end = 0;
        slots.retain(|&(offset, placeholder)| {
            if offset < end {
                return false;
            }
            end = offset + placeholder.token().len();
            true
        });
        Ok(Self { text, slots })
    }

    /// The template shipped with the binary.
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::parse(BUILTIN_TEMPLATE)
    }

    /// Resolve the template for a content root.
    ///
    /// Order: the configured `template` path, then `template.html` in the
    /// content root, then the built-in template. A configured path that does
    /// not exist is an error.
    pub fn load(source: &Path, config: &SiteConfig) -> Result<Self, TemplateError> {
        let path = match &config.template {
            Some(rel) => source.join(rel),
            None => {
                let candidate = source.join("template.html");
                if !candidate.is_file() {
                    debug!("using built-in template");
                    return Self::builtin();
                }
                candidate
            }
        };
        debug!(path = %path.display(), "loading template");
        let text = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(text)
    }

    pub fn contains(&self, placeholder: Placeholder) -> bool {
        self.slots.iter().any(|(_, p)| *p == placeholder)
    }

    /// Substitute placeholder values in one pass over the template text.
    ///
    /// Placeholders missing from `values` are replaced with the empty string.
    pub fn render(&self, values: &[(Placeholder, String)]) -> String {
        let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
        let mut out = String::with_capacity(self.text.len() + extra);
        let mut cursor = 0;
        for &(offset, placeholder) in &self.slots {
            out.push_str(&self.text[cursor..offset]);
            if let Some((_, value)) = values.iter().find(|(p, _)| *p == placeholder) {
                out.push_str(value);
            }
            cursor = offset + placeholder.token().len();
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

impl Page {
    /// The value of every placeholder for this page.
    ///
    /// Both the HTML render and the route state are derived from this table.
    pub fn placeholders(&self) -> Vec<(Placeholder, String)> {
        vec![
            (Placeholder::Title, self.title.clone()),
            (Placeholder::Toc, self.toc.clone()),
            (Placeholder::Markdown, self.markdown_html.clone()),
            (Placeholder::Code, self.code_html.clone()),
            (Placeholder::Back, self.back.clone()),
            (Placeholder::Next, self.next.clone()),
            (Placeholder::Index, self.index.to_string()),
            (Placeholder::Total, self.total.to_string()),
            (Placeholder::Locale, self.locale.label().to_string()),
            (Placeholder::EnHref, self.en_href.clone()),
            (Placeholder::ZhHref, self.zh_href.clone()),
            (Placeholder::HomePage, self.home_page.clone()),
            (Placeholder::HomePageHref, self.home_page_href.clone()),
        ]
    }
}
