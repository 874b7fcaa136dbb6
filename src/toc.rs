//! Table of contents model.
//!
//! The generator renders a [`TocTree`] into every page, and the client parses
//! that HTML back into a tree to fold and highlight it. Both directions go
//! through this module so the class names stay in one place:
//!
//! ```text
//! ul.toc
//! └── li
//!     └── div.toc-chapter
//!         ├── button.toc-chapter-title      chapter name, toggles sections
//!         └── ul.toc-sections[.hidden]
//!             └── li
//!                 └── a.toc-link[.toc-active] href="/intro/hello/index.html"
//! ```

use crate::types::{Chapter, page_href};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use maud::{Markup, html};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use thiserror::Error;
use url::Url;

const CHAPTER_CLASS: &str = "toc-chapter";
const TITLE_CLASS: &str = "toc-chapter-title";
const SECTIONS_CLASS: &str = "toc-sections";
const LINK_CLASS: &str = "toc-link";

#[derive(Error, Debug)]
pub enum TocError {
    #[error("cannot parse table of contents: {0}")]
    Parse(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TocTree {
    pub chapters: Vec<TocChapter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TocChapter {
    pub title: String,
    pub links: Vec<TocLink>,
    /// Whether the chapter's sections are shown.
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TocLink {
    pub label: String,
    /// Href as written in the markup, usually root-relative.
    pub href: String,
    pub active: bool,
}

impl TocTree {
    /// Build the tree for one locale's chapters, every chapter expanded.
    pub fn from_chapters(chapters: &[Chapter]) -> Self {
        let chapters = chapters
            .iter()
            .map(|chapter| TocChapter {
                title: chapter.name.clone(),
                links: chapter
                    .lessons
                    .iter()
                    .map(|lesson| TocLink {
                        label: lesson.lesson.clone(),
                        href: page_href(&lesson.slug()),
                        active: false,
                    })
                    .collect(),
                expanded: true,
            })
            .collect();
        Self { chapters }
    }

    /// Parse TOC markup produced by [`TocTree::render`] (or hand-written markup
    /// using the same classes).
    ///
    /// Elements outside a `.toc-chapter` are ignored.
    pub fn parse(html: &str) -> Result<Self, TocError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;
        let mut tree = TocTree::default();
        collect_chapters(&dom.document, &mut tree.chapters);
        Ok(tree)
    }

    /// Mark the link matching `location` active and fold the tree around it.
    ///
    /// Hrefs are resolved against `location` and compared as full URL strings.
    /// When a link matches, only its chapter stays expanded; otherwise every
    /// chapter is expanded. Returns the index of the matching chapter.
    pub fn highlight(&mut self, location: &Url) -> Option<usize> {
        let target = location.as_str();
        let mut found = None;
        for (i, chapter) in self.chapters.iter_mut().enumerate() {
            for link in &mut chapter.links {
                link.active = found.is_none()
                    && location
                        .join(&link.href)
                        .is_ok_and(|resolved| resolved.as_str() == target);
                if link.active {
                    found = Some(i);
                }
            }
        }
        for (i, chapter) in self.chapters.iter_mut().enumerate() {
            chapter.expanded = found.is_none_or(|f| f == i);
        }
        found
    }

    /// Flip the sections of one chapter. Out-of-range indices are ignored.
    pub fn toggle_chapter(&mut self, index: usize) {
        if let Some(chapter) = self.chapters.get_mut(index) {
            chapter.expanded = !chapter.expanded;
        }
    }

    pub fn active_link(&self) -> Option<&TocLink> {
        self.chapters
            .iter()
            .flat_map(|c| c.links.iter())
            .find(|l| l.active)
    }

    pub fn markup(&self) -> Markup {
        html! {
            ul.toc {
                @for chapter in &self.chapters {
                    li {
                        div.toc-chapter {
                            button.toc-chapter-title type="button" { (chapter.title) }
                            ul.toc-sections.hidden[!chapter.expanded] {
                                @for link in &chapter.links {
                                    li {
                                        a.toc-link.toc-active[link.active] href=(link.href) {
                                            (link.label)
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn render(&self) -> String {
        self.markup().into_string()
    }
}

// ============================================================================
// DOM walking
// ============================================================================

fn collect_chapters(node: &Handle, out: &mut Vec<TocChapter>) {
    if has_class(node, CHAPTER_CLASS) {
        let mut chapter = TocChapter {
            title: String::new(),
            links: Vec::new(),
            expanded: true,
        };
        fill_chapter(node, &mut chapter);
        out.push(chapter);
        return;
    }
    for child in node.children.borrow().iter() {
        collect_chapters(child, out);
    }
}

fn fill_chapter(node: &Handle, chapter: &mut TocChapter) {
    for child in node.children.borrow().iter() {
        if has_class(child, TITLE_CLASS) {
            chapter.title = text_content(child).trim().to_string();
        } else if has_class(child, LINK_CLASS) {
            chapter.links.push(TocLink {
                label: text_content(child).trim().to_string(),
                href: attr(child, "href").unwrap_or_default(),
                active: false,
            });
        } else {
            if has_class(child, SECTIONS_CLASS) {
                chapter.expanded = !has_class(child, "hidden");
            }
            fill_chapter(child, chapter);
        }
    }
}

fn has_class(node: &Handle, class: &str) -> bool {
    attr(node, "class").is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
}

fn attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    push_text(node, &mut text);
    text
}

fn push_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        push_text(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TocTree {
        TocTree {
            chapters: vec![
                TocChapter {
                    title: "intro".into(),
                    links: vec![
                        link("hello", "/intro/hello/index.html"),
                        link("types", "/intro/types/index.html"),
                    ],
                    expanded: true,
                },
                TocChapter {
                    title: "loops".into(),
                    links: vec![link("for", "/loops/for/index.html")],
                    expanded: true,
                },
            ],
        }
    }

    fn link(label: &str, href: &str) -> TocLink {
        TocLink {
            label: label.into(),
            href: href.into(),
            active: false,
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn render_then_parse_preserves_structure() {
        let tree = sample();
        let parsed = TocTree::parse(&tree.render()).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn render_uses_client_classes() {
        let html = sample().render();
        assert!(html.contains(r#"class="toc-chapter""#));
        assert!(html.contains(r#"class="toc-chapter-title""#));
        assert!(html.contains(r#"class="toc-sections""#));
        assert!(html.contains(r#"class="toc-link""#));
        assert!(html.contains(r#"href="/intro/hello/index.html""#));
    }

    #[test]
    fn parse_reads_hand_written_markup() {
        let html = r#"<ul><li><div class="toc-chapter pl-1">
            <button class="toc-chapter-title capitalize">control flow</button>
            <ul class="toc-sections bg-gray-50 hidden">
              <li><a class="toc-link block" href="/control-flow/for/index.html">for</a></li>
            </ul></div></li></ul>"#;
        let tree = TocTree::parse(html).unwrap();
        assert_eq!(tree.chapters.len(), 1);
        assert_eq!(tree.chapters[0].title, "control flow");
        assert!(!tree.chapters[0].expanded);
        assert_eq!(tree.chapters[0].links[0].href, "/control-flow/for/index.html");
    }

    #[test]
    fn highlight_expands_only_matching_chapter() {
        let mut tree = sample();
        let found = tree.highlight(&url("https://tour.test/loops/for/index.html"));

        assert_eq!(found, Some(1));
        assert!(!tree.chapters[0].expanded);
        assert!(tree.chapters[1].expanded);
        assert_eq!(tree.active_link().unwrap().label, "for");
    }

    #[test]
    fn highlight_without_match_expands_all() {
        let mut tree = sample();
        tree.chapters[0].expanded = false;
        let found = tree.highlight(&url("https://tour.test/index.html"));

        assert_eq!(found, None);
        assert!(tree.chapters.iter().all(|c| c.expanded));
        assert!(tree.active_link().is_none());
    }

    #[test]
    fn highlight_is_exact_string_match() {
        let mut tree = sample();
        // Trailing-slash form does not equal the index.html href
        assert_eq!(tree.highlight(&url("https://tour.test/intro/hello/")), None);
    }

    #[test]
    fn highlight_moves_active_link() {
        let mut tree = sample();
        tree.highlight(&url("https://tour.test/intro/hello/index.html"));
        tree.highlight(&url("https://tour.test/intro/types/index.html"));

        let active: Vec<&str> = tree
            .chapters
            .iter()
            .flat_map(|c| &c.links)
            .filter(|l| l.active)
            .map(|l| l.label.as_str())
            .collect();
        assert_eq!(active, vec!["types"]);
    }

    #[test]
    fn rendered_highlight_marks_active_and_hidden() {
        let mut tree = sample();
        tree.highlight(&url("https://tour.test/intro/types/index.html"));
        let html = tree.render();

        assert!(html.contains(r#"class="toc-link toc-active""#));
        assert!(html.contains(r#"class="toc-sections hidden""#));
    }

    #[test]
    fn toggle_chapter_flips_sections() {
        let mut tree = sample();
        tree.toggle_chapter(0);
        assert!(!tree.chapters[0].expanded);
        tree.toggle_chapter(0);
        assert!(tree.chapters[0].expanded);
        tree.toggle_chapter(9);
    }
}
