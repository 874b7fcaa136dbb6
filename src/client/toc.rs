//! TOC controller: folding, highlighting and visibility of the contents panel.
//!
//! On attach and on every `route-change` the server-supplied TOC markup is
//! parsed and highlighted against the context location. The router updates
//! the location before broadcasting, so the highlight always tracks the page
//! being shown.

use super::context::UiContext;
use super::events::Subscription;
use crate::toc::{TocError, TocTree};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

pub struct TocController {
    ctx: UiContext,
    tree: Arc<Mutex<TocTree>>,
    _subscription: Subscription,
}

impl TocController {
    pub fn attach(ctx: &UiContext, toc_html: &str) -> Result<Self, TocError> {
        let mut tree = TocTree::parse(toc_html)?;
        tree.highlight(&ctx.location());
        let tree = Arc::new(Mutex::new(tree));

        let target = Arc::clone(&tree);
        let handler_ctx = ctx.clone();
        let subscription = ctx.bus().on_route_change(move |state| {
            match TocTree::parse(&state.toc) {
                Ok(mut parsed) => {
                    parsed.highlight(&handler_ctx.location());
                    *target.lock() = parsed;
                }
                Err(e) => warn!(error = %e, "keeping previous table of contents"),
            }
        });

        Ok(Self {
            ctx: ctx.clone(),
            tree,
            _subscription: subscription,
        })
    }

    /// Title click: show or hide one chapter's sections.
    pub fn toggle_chapter(&self, index: usize) {
        self.tree.lock().toggle_chapter(index);
    }

    /// TOC button: show or hide the whole panel. Returns the new visibility.
    pub fn toggle_visibility(&self) -> bool {
        self.ctx.toggle_toc()
    }

    pub fn visible(&self) -> bool {
        self.ctx.toc_visible()
    }

    pub fn tree(&self) -> TocTree {
        self.tree.lock().clone()
    }

    /// Index of the chapter holding the active lesson.
    pub fn open_chapter(&self) -> Option<usize> {
        let tree = self.tree.lock();
        tree.chapters
            .iter()
            .position(|c| c.links.iter().any(|l| l.active))
    }

    pub fn render(&self) -> String {
        self.tree.lock().render()
    }
}
