//! In-process model of the browser session history.
//!
//! Each entry pairs a URL with the route state that was current when the
//! entry was created, so going back or forward never needs a fetch.

use crate::types::RouteState;
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub url: Url,
    pub state: Option<RouteState>,
}

#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
    current: usize,
}

impl SessionHistory {
    pub fn new(url: Url) -> Self {
        Self {
            entries: vec![HistoryEntry { url, state: None }],
            current: 0,
        }
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.current]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite the current entry.
    pub fn replace_state(&mut self, state: RouteState, url: Url) {
        self.entries[self.current] = HistoryEntry {
            url,
            state: Some(state),
        };
    }

    /// Add an entry after the current one, discarding any forward entries.
    pub fn push_state(&mut self, state: RouteState, url: Url) {
        self.entries.truncate(self.current + 1);
        self.entries.push(HistoryEntry {
            url,
            state: Some(state),
        });
        self.current = self.entries.len() - 1;
    }

    /// Step back one entry. `None` at the start of the session.
    pub fn back(&mut self) -> Option<&HistoryEntry> {
        self.current = self.current.checked_sub(1)?;
        Some(self.current())
    }

    /// Step forward one entry. `None` at the end of the session.
    pub fn forward(&mut self) -> Option<&HistoryEntry> {
        if self.current + 1 >= self.entries.len() {
            return None;
        }
        self.current += 1;
        Some(self.current())
    }
}
