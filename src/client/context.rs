//! Explicit UI context shared by the client components.
//!
//! Holds what a browser page keeps in globals: the theme, whether the TOC is
//! shown, the active locale, the current location and the busy indicator.
//! Controllers receive a [`UiContext`] instead of reaching for ambient state;
//! clones share the same state and event bus.

use super::events::{EventBus, TourEvent};
use crate::types::{Locale, RouteState};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Editor colour theme matching the page theme.
    pub fn editor_theme(self) -> &'static str {
        match self {
            Theme::Light => "light-plus",
            Theme::Dark => "dark-plus",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub theme: Theme,
    pub toc_visible: bool,
    pub locale: Locale,
    pub location: Url,
    pub busy: bool,
}

#[derive(Debug, Clone)]
pub struct UiContext {
    bus: EventBus,
    state: Arc<RwLock<UiState>>,
}

impl UiContext {
    pub fn new(location: Url) -> Self {
        Self {
            bus: EventBus::new(),
            state: Arc::new(RwLock::new(UiState {
                theme: Theme::default(),
                toc_visible: false,
                locale: locale_of(&location),
                location,
                busy: false,
            })),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn snapshot(&self) -> UiState {
        self.state.read().clone()
    }

    pub fn theme(&self) -> Theme {
        self.state.read().theme
    }

    /// Change the theme and notify `theme-change` subscribers.
    pub fn set_theme(&self, theme: Theme) {
        self.state.write().theme = theme;
        self.bus.publish(TourEvent::ThemeChange(theme));
    }

    pub fn toc_visible(&self) -> bool {
        self.state.read().toc_visible
    }

    /// Show or hide the TOC panel. Returns the new visibility.
    pub fn toggle_toc(&self) -> bool {
        let mut state = self.state.write();
        state.toc_visible = !state.toc_visible;
        state.toc_visible
    }

    pub fn locale(&self) -> Locale {
        self.state.read().locale
    }

    pub fn location(&self) -> Url {
        self.state.read().location.clone()
    }

    /// Move to `location`; the locale follows the path prefix.
    pub fn set_location(&self, location: Url) {
        let mut state = self.state.write();
        state.locale = locale_of(&location);
        state.location = location;
    }

    /// Move to a page whose route state is known. The state's locale label
    /// decides the locale; the path prefix is only a fallback.
    pub fn show_page(&self, location: Url, page: &RouteState) {
        let mut state = self.state.write();
        state.locale = Locale::from_label(&page.locale).unwrap_or_else(|| locale_of(&location));
        state.location = location;
    }

    pub fn busy(&self) -> bool {
        self.state.read().busy
    }

    pub fn set_busy(&self, busy: bool) {
        self.state.write().busy = busy;
    }
}

fn locale_of(location: &Url) -> Locale {
    let first = location
        .path_segments()
        .and_then(|mut segments| segments.next())
        .unwrap_or_default();
    Locale::ALL
        .into_iter()
        .find(|l| l.slug_prefix() == Some(first))
        .unwrap_or(Locale::En)
}
