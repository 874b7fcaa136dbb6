//! Page body: applies route states to the elements a navigation swaps.
//!
//! [`BodyView`] mirrors the elements of the page template that change on
//! navigation, keyed by their ids:
//!
//! ```text
//! document.title   ← title
//! #tour-content    ← markdownHtml
//! #nav-back        ← back
//! #nav-next        ← next
//! #lesson-index    ← index
//! #lesson-total    ← total
//! #locale-text     ← locale
//! #en-href         ← enHref (href)
//! #zh-href         ← zhHref (href)
//! #homepage        ← homePage (text), homePageHref (href)
//! #toc             ← toc
//! ```

use super::context::UiContext;
use super::events::Subscription;
use crate::types::RouteState;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyView {
    pub title: String,
    pub content: String,
    pub nav_back: String,
    pub nav_next: String,
    pub lesson_index: String,
    pub lesson_total: String,
    pub locale_text: String,
    pub en_href: String,
    pub zh_href: String,
    pub homepage_text: String,
    pub homepage_href: String,
    pub toc: String,
}

impl BodyView {
    pub fn from_state(state: &RouteState) -> Self {
        let mut view = Self::default();
        view.apply(state);
        view
    }

    pub fn apply(&mut self, state: &RouteState) {
        self.title.clone_from(&state.title);
        self.content.clone_from(&state.markdown_html);
        self.nav_back.clone_from(&state.back);
        self.nav_next.clone_from(&state.next);
        self.lesson_index = state.index.to_string();
        self.lesson_total = state.total.to_string();
        self.locale_text.clone_from(&state.locale);
        self.en_href.clone_from(&state.en_href);
        self.zh_href.clone_from(&state.zh_href);
        self.homepage_text.clone_from(&state.home_page);
        self.homepage_href.clone_from(&state.home_page_href);
        self.toc.clone_from(&state.toc);
    }
}

/// Keeps a [`BodyView`] in sync with `route-change`.
pub struct PageBody {
    view: Arc<RwLock<BodyView>>,
    _subscription: Subscription,
}

impl PageBody {
    pub fn attach(ctx: &UiContext, initial: &RouteState) -> Self {
        let view = Arc::new(RwLock::new(BodyView::from_state(initial)));
        let target = Arc::clone(&view);
        let subscription = ctx
            .bus()
            .on_route_change(move |state| target.write().apply(state));
        Self {
            view,
            _subscription: subscription,
        }
    }

    pub fn view(&self) -> BodyView {
        self.view.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::events::TourEvent;
    use crate::test_helpers::route_state;
    use url::Url;

    #[test]
    fn route_change_swaps_every_field() {
        let ctx = UiContext::new(Url::parse("https://tour.test/index.html").unwrap());
        let body = PageBody::attach(&ctx, &route_state("home"));
        assert_eq!(body.view().title, "home");

        let mut next = route_state("types");
        next.index = 2;
        next.total = 3;
        next.home_page_href = "/zh/index.html".into();
        ctx.bus().publish(TourEvent::RouteChange(next.clone()));

        let view = body.view();
        assert_eq!(view, BodyView::from_state(&next));
        assert_eq!(view.lesson_index, "2");
        assert_eq!(view.lesson_total, "3");
        assert_eq!(view.homepage_href, "/zh/index.html");
    }

    #[test]
    fn detached_body_stops_updating() {
        let ctx = UiContext::new(Url::parse("https://tour.test/index.html").unwrap());
        let body = PageBody::attach(&ctx, &route_state("home"));
        let view = Arc::clone(&body.view);
        drop(body);

        ctx.bus().publish(TourEvent::RouteChange(route_state("other")));
        assert_eq!(view.read().title, "home");
    }
}
