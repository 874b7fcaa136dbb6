//! Client-side router.
//!
//! Turns anchor clicks and history traversal into page swaps. Every page of
//! the generated site has a JSON sibling holding its [`RouteState`]; the
//! router fetches that instead of the HTML and broadcasts it on the
//! `route-change` channel for the other components to apply.
//!
//! ## States
//!
//! ```text
//!            click (same origin)
//!   Idle ───────────────────────────▶ Loading { href }
//!    ▲                                   │
//!    │   fetch ok: push history,         │ fetch failed
//!    │   set location, broadcast         ▼
//!    └──────────────────────────── Failed { href, reason }
//! ```
//!
//! A failed fetch is not retried and has no fallback. The current page and the
//! history stay as they were, the busy indicator is cleared, and the error is
//! returned to the caller. The next click starts over from `Failed`.
//!
//! Back and forward replay the state stored on the history entry. An entry
//! without one (the first page, when `init` failed) is fetched like a click;
//! if that fetch fails too, the traversal is undone.
//!
//! Concurrent navigations are not serialized: each one pushes and broadcasts
//! when its own fetch completes, so the last to complete wins.

use super::context::UiContext;
use super::events::TourEvent;
use super::history::{HistoryEntry, SessionHistory};
use crate::types::RouteState;
use parking_lot::Mutex;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("fetching {url} failed: {reason}")]
    Fetch { url: Url, reason: String },
    #[error("fetching {url} returned status {status}")]
    Status { url: Url, status: u16 },
    #[error("route state at {url} is malformed: {source}")]
    Decode {
        url: Url,
        source: serde_json::Error,
    },
    #[error("invalid href {href:?}: {source}")]
    InvalidHref {
        href: String,
        source: url::ParseError,
    },
}

/// Where route states come from.
pub trait RouteSource: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<RouteState, RouterError>> + Send;
}

/// Map a page href to the href of its route state.
///
/// ```text
/// /intro/hello/            → /intro/hello/index.json
/// /intro/hello/index.html  → /intro/hello/index.json
/// /intro/hello             → /intro/hello/index.json
/// ```
pub fn route_data_href(href: &str) -> String {
    if href.ends_with('/') {
        format!("{href}index.json")
    } else if let Some(dir) = href.strip_suffix("/index.html") {
        format!("{dir}/index.json")
    } else {
        format!("{href}/index.json")
    }
}

/// Serves route states from a generated output directory.
#[derive(Debug, Clone)]
pub struct DistSource {
    root: PathBuf,
}

impl DistSource {
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            root: std::path::absolute(root)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `url`, or `None` when the URL cannot be mapped.
    pub fn file_for(&self, url: &Url) -> Option<PathBuf> {
        let base = Url::from_directory_path(&self.root).ok()?;
        base.join(url.path().trim_start_matches('/'))
            .ok()?
            .to_file_path()
            .ok()
    }
}

impl RouteSource for DistSource {
    async fn fetch(&self, url: &Url) -> Result<RouteState, RouterError> {
        let path = self.file_for(url).ok_or_else(|| RouterError::Status {
            url: url.clone(),
            status: 404,
        })?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RouterError::Status {
                    url: url.clone(),
                    status: 404,
                });
            }
            Err(e) => {
                return Err(RouterError::Fetch {
                    url: url.clone(),
                    reason: e.to_string(),
                });
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| RouterError::Decode {
            url: url.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouterState {
    Idle,
    Loading { href: Url },
    Failed { href: Url, reason: String },
}

/// What was clicked.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickTarget {
    Anchor { href: String },
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// Left to the browser: not an anchor, or another origin.
    Ignored,
    Navigated(Url),
}

struct RouterInner {
    state: RouterState,
    history: SessionHistory,
    in_flight: usize,
}

pub struct Router<S> {
    source: S,
    ctx: UiContext,
    inner: Mutex<RouterInner>,
}

impl<S: RouteSource> Router<S> {
    pub fn new(source: S, ctx: UiContext) -> Self {
        let history = SessionHistory::new(ctx.location());
        Self {
            source,
            ctx,
            inner: Mutex::new(RouterInner {
                state: RouterState::Idle,
                history,
                in_flight: 0,
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> RouterState {
        self.inner.lock().state.clone()
    }

    pub fn current_entry(&self) -> HistoryEntry {
        self.inner.lock().history.current().clone()
    }

    pub fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }

    /// Load the state of the server-rendered page and attach it to the
    /// current history entry. Nothing is broadcast.
    pub async fn init(&self) -> Result<RouteState, RouterError> {
        let location = self.ctx.location();
        let state = self.load(&location).await?;
        self.inner
            .lock()
            .history
            .replace_state(state.clone(), location.clone());
        self.ctx.show_page(location, &state);
        Ok(state)
    }

    /// Handle a click. Same-origin anchors are fetched and navigated to.
    pub async fn click(&self, target: ClickTarget) -> Result<Navigation, RouterError> {
        let ClickTarget::Anchor { href } = target else {
            return Ok(Navigation::Ignored);
        };
        let base = self.ctx.location();
        let url = base
            .join(&href)
            .map_err(|source| RouterError::InvalidHref { href, source })?;
        if url.origin() != base.origin() {
            debug!(%url, "cross-origin link, not routed");
            return Ok(Navigation::Ignored);
        }

        let state = self.load(&url).await?;
        self.inner
            .lock()
            .history
            .push_state(state.clone(), url.clone());
        self.ctx.show_page(url.clone(), &state);
        self.ctx.bus().publish(TourEvent::RouteChange(state));
        Ok(Navigation::Navigated(url))
    }

    /// History traversal backwards. `Ok(None)` at the start of history.
    pub async fn back(&self) -> Result<Option<RouteState>, RouterError> {
        let entry = self.inner.lock().history.back().cloned();
        let Some(entry) = entry else {
            return Ok(None);
        };
        self.restore(entry, |history| {
            history.forward();
        })
        .await
        .map(Some)
    }

    /// History traversal forwards. `Ok(None)` at the end of history.
    pub async fn forward(&self) -> Result<Option<RouteState>, RouterError> {
        let entry = self.inner.lock().history.forward().cloned();
        let Some(entry) = entry else {
            return Ok(None);
        };
        self.restore(entry, |history| {
            history.back();
        })
        .await
        .map(Some)
    }

    /// Show a history entry. Entries without a state (the initial page when
    /// `init` failed) are fetched; if that fails the traversal is undone so
    /// location and history keep matching the page on screen.
    async fn restore(
        &self,
        entry: HistoryEntry,
        undo: fn(&mut SessionHistory),
    ) -> Result<RouteState, RouterError> {
        let state = match entry.state {
            Some(state) => state,
            None => match self.load(&entry.url).await {
                Ok(state) => {
                    self.inner
                        .lock()
                        .history
                        .replace_state(state.clone(), entry.url.clone());
                    state
                }
                Err(e) => {
                    undo(&mut self.inner.lock().history);
                    return Err(e);
                }
            },
        };
        self.ctx.show_page(entry.url, &state);
        self.ctx
            .bus()
            .publish(TourEvent::RouteChange(state.clone()));
        Ok(state)
    }

    async fn load(&self, page: &Url) -> Result<RouteState, RouterError> {
        let data = data_url(page)?;
        {
            let mut inner = self.inner.lock();
            inner.in_flight += 1;
            inner.state = RouterState::Loading { href: page.clone() };
        }
        self.ctx.set_busy(true);
        let _guard = InFlight { router: self };

        debug!(url = %data, "fetching route state");
        match self.source.fetch(&data).await {
            Ok(state) => {
                self.inner.lock().state = RouterState::Idle;
                Ok(state)
            }
            Err(e) => {
                warn!(href = %page, error = %e, "navigation failed");
                self.inner.lock().state = RouterState::Failed {
                    href: page.clone(),
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }
}

/// Clears the busy indicator once the last outstanding fetch ends, including
/// when the navigation future is dropped mid-fetch.
struct InFlight<'a, S> {
    router: &'a Router<S>,
}

impl<S> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        let mut inner = self.router.inner.lock();
        inner.in_flight -= 1;
        if inner.in_flight == 0 {
            self.router.ctx.set_busy(false);
        }
    }
}

fn data_url(page: &Url) -> Result<Url, RouterError> {
    let mut bare = page.clone();
    bare.set_fragment(None);
    bare.set_query(None);
    let href = route_data_href(bare.as_str());
    Url::parse(&href).map_err(|source| RouterError::InvalidHref { href, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::events::Subscription;
    use crate::test_helpers::{MapSource, route_state};
    use parking_lot::Mutex as PlMutex;
    use std::sync::Arc;
    use std::time::Duration;

    const ORIGIN: &str = "https://tour.test";

    fn url(path: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(path).unwrap()
    }

    fn router(start: &str, source: MapSource) -> Router<MapSource> {
        Router::new(source, UiContext::new(url(start)))
    }

    fn anchor(href: &str) -> ClickTarget {
        ClickTarget::Anchor {
            href: href.to_string(),
        }
    }

    fn recorder(router: &Router<MapSource>) -> (Arc<PlMutex<Vec<String>>>, Subscription) {
        let seen = Arc::new(PlMutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let sub = router
            .ctx
            .bus()
            .on_route_change(move |state| s.lock().push(state.title.clone()));
        (seen, sub)
    }

    #[test]
    fn data_href_mapping() {
        assert_eq!(route_data_href("/intro/hello/"), "/intro/hello/index.json");
        assert_eq!(
            route_data_href("/intro/hello/index.html"),
            "/intro/hello/index.json"
        );
        assert_eq!(route_data_href("/intro/hello"), "/intro/hello/index.json");
        assert_eq!(
            route_data_href("https://tour.test/index.html"),
            "https://tour.test/index.json"
        );
    }

    #[test]
    fn data_url_drops_fragment_and_query() {
        let page = url("/intro/hello/index.html?x=1#top");
        assert_eq!(data_url(&page).unwrap(), url("/intro/hello/index.json"));
    }

    #[tokio::test]
    async fn init_replaces_state_without_broadcast() {
        let source = MapSource::new().with("/index.json", route_state("home"));
        let router = router("/index.html", source);
        let (seen, _sub) = recorder(&router);

        let state = router.init().await.unwrap();

        assert_eq!(state.title, "home");
        assert_eq!(router.current_entry().state.unwrap().title, "home");
        assert_eq!(router.history_len(), 1);
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn click_fetches_pushes_and_broadcasts() {
        let source = MapSource::new()
            .with("/index.json", route_state("home"))
            .with("/intro/types/index.json", route_state("types"));
        let router = router("/index.html", source);
        let (seen, _sub) = recorder(&router);
        router.init().await.unwrap();

        let nav = router.click(anchor("/intro/types/index.html")).await.unwrap();

        assert_eq!(nav, Navigation::Navigated(url("/intro/types/index.html")));
        assert_eq!(
            router.source().requests(),
            vec![url("/index.json"), url("/intro/types/index.json")]
        );
        assert_eq!(*seen.lock(), vec!["types"]);
        assert_eq!(router.history_len(), 2);
        assert_eq!(router.ctx.location(), url("/intro/types/index.html"));
        assert_eq!(router.state(), RouterState::Idle);
        assert!(!router.ctx.busy());
    }

    #[tokio::test]
    async fn relative_href_resolves_against_location() {
        let source = MapSource::new().with("/intro/types/index.json", route_state("types"));
        let router = router("/intro/hello/index.html", source);

        router.click(anchor("../types/")).await.unwrap();
        assert_eq!(router.source().requests(), vec![url("/intro/types/index.json")]);
    }

    #[tokio::test]
    async fn cross_origin_and_non_anchor_are_ignored() {
        let router = router("/index.html", MapSource::new());

        let nav = router
            .click(anchor("https://example.com/docs/index.html"))
            .await
            .unwrap();
        assert_eq!(nav, Navigation::Ignored);
        assert_eq!(router.click(ClickTarget::Other).await.unwrap(), Navigation::Ignored);
        assert!(router.source().requests().is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_page_and_clears_busy() {
        let source = MapSource::new().with("/index.json", route_state("home"));
        let router = router("/index.html", source);
        let (seen, _sub) = recorder(&router);
        router.init().await.unwrap();

        let result = router.click(anchor("/missing/index.html")).await;

        assert!(matches!(result, Err(RouterError::Status { status: 404, .. })));
        assert!(matches!(router.state(), RouterState::Failed { .. }));
        assert!(!router.ctx.busy());
        assert!(seen.lock().is_empty());
        assert_eq!(router.history_len(), 1);
        assert_eq!(router.ctx.location(), url("/index.html"));
    }

    #[tokio::test]
    async fn back_and_forward_restore_without_fetch() {
        let source = MapSource::new()
            .with("/index.json", route_state("home"))
            .with("/intro/hello/index.json", route_state("hello"));
        let router = router("/index.html", source);
        router.init().await.unwrap();
        router.click(anchor("/intro/hello/index.html")).await.unwrap();
        let (seen, _sub) = recorder(&router);

        assert_eq!(router.back().await.unwrap().unwrap().title, "home");
        assert_eq!(router.ctx.location(), url("/index.html"));
        assert_eq!(router.forward().await.unwrap().unwrap().title, "hello");
        assert!(router.forward().await.unwrap().is_none());

        assert_eq!(*seen.lock(), vec!["home", "hello"]);
        assert_eq!(router.source().requests().len(), 2);
    }

    #[tokio::test]
    async fn back_to_unloadable_entry_fails_and_stays_put() {
        let source = MapSource::new().with("/intro/hello/index.json", route_state("hello"));
        let router = router("/index.html", source);
        assert!(router.init().await.is_err());
        router.click(anchor("/intro/hello/index.html")).await.unwrap();
        let (seen, _sub) = recorder(&router);

        let err = router.back().await.unwrap_err();
        assert!(matches!(err, RouterError::Status { status: 404, .. }));
        assert!(matches!(router.state(), RouterState::Failed { .. }));
        assert_eq!(router.ctx.location(), url("/intro/hello/index.html"));
        assert_eq!(router.current_entry().url, url("/intro/hello/index.html"));
        assert!(seen.lock().is_empty());
        assert!(!router.ctx.busy());
    }

    #[tokio::test]
    async fn back_to_entry_without_state_fetches_and_broadcasts() {
        let source = MapSource::new()
            .with("/index.json", route_state("home"))
            .with("/intro/hello/index.json", route_state("hello"))
            .failing_once("/index.json");
        let router = router("/index.html", source);
        assert!(router.init().await.is_err());
        router.click(anchor("/intro/hello/index.html")).await.unwrap();
        let (seen, _sub) = recorder(&router);

        assert_eq!(router.back().await.unwrap().unwrap().title, "home");
        assert_eq!(router.ctx.location(), url("/index.html"));
        assert_eq!(router.state(), RouterState::Idle);
        assert_eq!(router.current_entry().state.unwrap().title, "home");
        assert_eq!(*seen.lock(), vec!["home"]);

        // Now attached to history: going forward and back again needs no fetch.
        router.forward().await.unwrap();
        router.back().await.unwrap();
        assert_eq!(router.source().requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_clicks_last_completion_wins() {
        let source = MapSource::new()
            .with("/a/x/index.json", route_state("slow"))
            .with("/b/y/index.json", route_state("fast"))
            .with_delay("/a/x/index.json", Duration::from_millis(50))
            .with_delay("/b/y/index.json", Duration::from_millis(10));
        let router = router("/index.html", source);
        let (seen, _sub) = recorder(&router);

        let (a, b) = tokio::join!(
            router.click(anchor("/a/x/index.html")),
            router.click(anchor("/b/y/index.html"))
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(*seen.lock(), vec!["fast", "slow"]);
        assert_eq!(router.ctx.location(), url("/a/x/index.html"));
        assert!(!router.ctx.busy());
    }
}
