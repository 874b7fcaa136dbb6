//! Shared test utilities for the lang-tour test suite.
//!
//! Provides fixture setup, small content builders, lookup helpers over scan
//! and generate output, and in-process stand-ins for the route source and the
//! compile/run workers.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let tour = scan(tmp.path(), &SiteConfig::default()).unwrap();
//! let en = tour.locale(Locale::En).unwrap();
//!
//! assert_eq!(chapter_names(en), vec!["intro", "loops"]);
//! assert_eq!(lesson_names(en), vec!["hello", "types", "for"]);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::mpsc;
use url::Url;

use crate::client::{RouteSource, RouterError};
use crate::playground::{
    CompileRequest, CompileResult, Compiler, Diagnostic, Runner, WorkerError,
};
use crate::types::{LocaleTour, Page, RouteState};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/tour/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/tour");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write the landing-page pair of a locale root.
pub fn write_intro(root: &Path, ext: &str) {
    std::fs::create_dir_all(root).unwrap();
    std::fs::write(root.join("index.md"), "# Welcome\n").unwrap();
    std::fs::write(root.join(format!("index.{ext}")), "fn main {\n  println(\"welcome\")\n}\n")
        .unwrap();
}

/// Write `<root>/<chapter>/<lesson>/index.{md,<ext>}`.
pub fn write_lesson(root: &Path, chapter: &str, lesson: &str, ext: &str) {
    let dir = root.join(chapter).join(lesson);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.md"), format!("# {lesson}\n")).unwrap();
    std::fs::write(
        dir.join(format!("index.{ext}")),
        format!("fn main {{\n  println(\"{lesson}\")\n}}\n"),
    )
    .unwrap();
}

// =========================================================================
// Lookups - panic with a clear message on miss
// =========================================================================

/// Chapter display names in order.
pub fn chapter_names(tour: &LocaleTour) -> Vec<&str> {
    tour.chapters.iter().map(|c| c.name.as_str()).collect()
}

/// Lesson display names in flattened order.
pub fn lesson_names(tour: &LocaleTour) -> Vec<&str> {
    tour.lessons().map(|l| l.lesson.as_str()).collect()
}

/// Find a page by output path. Panics if not found.
pub fn find_page<'a>(pages: &'a [Page], path: &str) -> &'a Page {
    pages.iter().find(|p| p.path == path).unwrap_or_else(|| {
        let paths: Vec<&str> = pages.iter().map(|p| p.path.as_str()).collect();
        panic!("page '{path}' not found. Available: {paths:?}")
    })
}

/// A route state whose fields are derived from `title`.
pub fn route_state(title: &str) -> RouteState {
    RouteState {
        title: title.to_string(),
        markdown_html: format!("<p>{title}</p>"),
        code: format!("println(\"{title}\")"),
        code_html: format!("<pre class=\"shiki\"><code>{title}</code></pre>"),
        back: String::new(),
        next: String::new(),
        index: 1,
        total: 1,
        locale: "English".to_string(),
        en_href: format!("/{title}/index.html"),
        zh_href: format!("/zh/{title}/index.html"),
        home_page: "Language Tour".to_string(),
        home_page_href: "/index.html".to_string(),
        toc: String::new(),
    }
}

// =========================================================================
// Route source
// =========================================================================

/// Route states keyed by URL path, with optional per-path latency and
/// one-off failures.
#[derive(Default)]
pub struct MapSource {
    states: HashMap<String, RouteState>,
    delays: HashMap<String, Duration>,
    failing: Mutex<HashSet<String>>,
    requests: Mutex<Vec<Url>>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, state: RouteState) -> Self {
        self.states.insert(path.to_string(), state);
        self
    }

    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    /// The first fetch of `path` fails with a 503.
    pub fn failing_once(self, path: &str) -> Self {
        self.failing.lock().insert(path.to_string());
        self
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().clone()
    }
}

impl RouteSource for MapSource {
    async fn fetch(&self, url: &Url) -> Result<RouteState, RouterError> {
        self.requests.lock().push(url.clone());
        if let Some(delay) = self.delays.get(url.path()) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.lock().remove(url.path()) {
            return Err(RouterError::Status {
                url: url.clone(),
                status: 503,
            });
        }
        self.states
            .get(url.path())
            .cloned()
            .ok_or_else(|| RouterError::Status {
                url: url.clone(),
                status: 404,
            })
    }
}

// =========================================================================
// Workers
// =========================================================================

/// Compiler stand-in.
///
/// The "artifact" is the string literals of every `println("...")` in the
/// source, one per line. Sources containing `oops` fail with a diagnostic on
/// line 1, sources containing `crash` fail like a dead worker process.
/// Optional per-call delays are consumed in order.
#[derive(Clone, Default)]
pub struct ScriptedCompiler {
    delays: Arc<Mutex<VecDeque<Duration>>>,
    requests: Arc<Mutex<Vec<CompileRequest>>>,
}

impl ScriptedCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delays(self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.delays.lock().extend(delays);
        self
    }

    pub fn requests(&self) -> Vec<CompileRequest> {
        self.requests.lock().clone()
    }

    /// Source of the first file of every request, in call order.
    pub fn sources(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.files[0].1.clone())
            .collect()
    }
}

impl Compiler for ScriptedCompiler {
    async fn compile(&self, request: CompileRequest) -> Result<CompileResult, WorkerError> {
        let source = request.files[0].1.clone();
        self.requests.lock().push(request);
        let delay = self.delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if source.contains("crash") {
            return Err(WorkerError::Exited {
                program: "scripted".to_string(),
                code: Some(1),
                stderr: "boom".to_string(),
            });
        }
        if source.contains("oops") {
            return Ok(CompileResult::Error {
                diagnostics: vec![Diagnostic {
                    line: Some(1),
                    column: Some(1),
                    ..Diagnostic::error("unexpected `oops`")
                }],
            });
        }
        Ok(CompileResult::Success {
            artifact: printed_literals(&source).join("\n"),
        })
    }
}

fn printed_literals(source: &str) -> Vec<&str> {
    source
        .split("println(\"")
        .skip(1)
        .filter_map(|rest| rest.split_once('"').map(|(literal, _)| literal))
        .collect()
}

/// Runner stand-in that streams each line of the artifact as a chunk.
#[derive(Clone, Copy, Default)]
pub struct EchoRunner;

impl Runner for EchoRunner {
    async fn run(&self, artifact: String) -> Result<mpsc::Receiver<String>, WorkerError> {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            for line in artifact.lines() {
                if tx.send(line.to_string()).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}
