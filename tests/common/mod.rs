//! Helpers shared by the integration tests.

#![allow(dead_code)]

use lang_tour::config::SiteConfig;
use lang_tour::generate;
use lang_tour::playground::{CompileRequest, CompileResult, Compiler, Runner, WorkerError};
use lang_tour::scan;
use lang_tour::template::Template;
use lang_tour::types::{Page, Tour};
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Copy `fixtures/tour/` to a temp directory and return it.
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

/// A fully built fixture site.
pub struct Site {
    pub source: TempDir,
    pub out: TempDir,
    pub tour: Tour,
    pub pages: Vec<Page>,
}

/// Scan the fixtures and write the site with the built-in template.
pub fn build_site() -> Site {
    let source = setup_fixtures();
    let out = TempDir::new().unwrap();
    let config = SiteConfig::default();
    let tour = scan::scan(source.path(), &config).unwrap();
    let pages = generate::collect(&tour, &config).unwrap();
    let template = Template::load(source.path(), &config).unwrap();
    generate::write_site(&pages, &template, out.path()).unwrap();
    Site {
        source,
        out,
        tour,
        pages,
    }
}

/// Target of the first `href="..."` in an HTML fragment.
pub fn href_of(fragment: &str) -> Option<&str> {
    let rest = fragment.split_once("href=\"")?.1;
    rest.split_once('"').map(|(href, _)| href)
}

/// Compiler whose artifact is the source itself.
#[derive(Clone, Copy, Default)]
pub struct IdentityCompiler;

impl Compiler for IdentityCompiler {
    async fn compile(&self, request: CompileRequest) -> Result<CompileResult, WorkerError> {
        Ok(CompileResult::Success {
            artifact: request.files[0].1.clone(),
        })
    }
}

/// Runner that streams the artifact back line by line.
#[derive(Clone, Copy, Default)]
pub struct LinesRunner;

impl Runner for LinesRunner {
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
