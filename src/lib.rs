//! # Lang Tour
//!
//! A static generator for interactive programming-language tours, plus the
//! client runtime that turns the generated site into a single-page app with a
//! live code playground next to every lesson.
//!
//! Your filesystem is the data source: numbered directories become chapters
//! and lessons, each lesson pairs an `index.md` explanation with an
//! `index.<ext>` code sample, and a `zh/` subtree holds the Chinese locale.
//!
//! # Architecture
//!
//! ```text
//! build time                              run time
//! ──────────                              ────────
//! 1. Scan      tour/  →  Tour             Router ── index.json ──▶ RouteState
//! 2. Generate  Tour   →  dist/               │ route-change
//!              (index.html + index.json)     ├──▶ PageBody
//!                                            ├──▶ TocController
//!                                            └──▶ PlaygroundRuntime ──▶ Compiler / Runner
//! ```
//!
//! The only contract between the two halves is the [`types::RouteState`] JSON
//! written next to every page. The generated HTML works on its own; the client
//! only replaces full page loads with in-place swaps.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the content tree into chapters and lessons per locale |
//! | [`generate`] | Stage 2: computes pages, renders HTML through the template, writes route states |
//! | [`template`] | `%PLACEHOLDER%` page template parsing and substitution |
//! | [`toc`] | Table-of-contents model: built from chapters, parsed back from HTML, highlighted |
//! | [`client`] | Router, event bus, page body and TOC controllers |
//! | [`playground`] | Debounced compile/run loop and the out-of-process workers |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`types`] | Shared types: `Tour`, `Lesson`, `Page`, `RouteState` |
//! | [`naming`] | `NN_name` directory convention parser |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Filesystem Ordering
//!
//! Chapter and lesson directories carry a numeric prefix (`01_intro`,
//! `02_types`) that fixes their order. Lessons are flattened across chapters,
//! so back/next links and the lesson counter run through the whole locale.
//! Unlike loose content directories, every entry must be numbered: a tour is
//! a sequence, and an unnumbered lesson has no place in it.
//!
//! ## Maud for Fragments, a Template for the Page
//!
//! Fragments the generator owns (TOC, navigation links, code blocks) are built
//! with [Maud](https://maud.lambda.xyz/) and escaped by construction. The page
//! shell is a plain HTML template with `%TITLE%`-style placeholders so tour
//! authors can restyle it without rebuilding the tool.
//!
//! ## Workers Over Embedding
//!
//! The playground never links a compiler. Compilation and execution happen in
//! worker processes speaking JSON over stdio, so any toolchain with a small
//! wrapper script can back the tour.

pub mod client;
pub mod config;
pub mod generate;
pub mod naming;
pub mod output;
pub mod playground;
pub mod scan;
pub mod template;
pub mod toc;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
