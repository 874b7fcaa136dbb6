//! Typed publish/subscribe channels between the client components.
//!
//! Two channels exist: `route-change`, carrying the [`RouteState`] of the page
//! that was navigated to, and `theme-change`, carrying the new [`Theme`].
//! Dispatch is synchronous: [`EventBus::publish`] returns after every
//! subscriber has run, in subscription order.
//!
//! A [`Subscription`] unsubscribes when dropped. Handlers are cloned out of the
//! registry before dispatch, so a handler may publish or subscribe without
//! deadlocking.

use super::context::Theme;
use crate::types::RouteState;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    RouteChange,
    ThemeChange,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::RouteChange => "route-change",
            Channel::ThemeChange => "theme-change",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TourEvent {
    RouteChange(RouteState),
    ThemeChange(Theme),
}

impl TourEvent {
    pub fn channel(&self) -> Channel {
        match self {
            TourEvent::RouteChange(_) => Channel::RouteChange,
            TourEvent::ThemeChange(_) => Channel::ThemeChange,
        }
    }
}

type Handler = Arc<dyn Fn(&TourEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Channel, Handler)>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.registry.lock().handlers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every event on `channel`.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe(
        &self,
        channel: Channel,
        handler: impl Fn(&TourEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, channel, Arc::new(handler)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn on_route_change(
        &self,
        handler: impl Fn(&RouteState) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe(Channel::RouteChange, move |event| {
            if let TourEvent::RouteChange(state) = event {
                handler(state);
            }
        })
    }

    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn on_theme_change(&self, handler: impl Fn(Theme) + Send + Sync + 'static) -> Subscription {
        self.subscribe(Channel::ThemeChange, move |event| {
            if let TourEvent::ThemeChange(theme) = event {
                handler(*theme);
            }
        })
    }

    /// Deliver `event` to every current subscriber of its channel.
    pub fn publish(&self, event: TourEvent) {
        let channel = event.channel();
        let handlers: Vec<Handler> = self
            .registry
            .lock()
            .handlers
            .iter()
            .filter(|(_, c, _)| *c == channel)
            .map(|(_, _, h)| Arc::clone(h))
            .collect();
        trace!(channel = channel.name(), subscribers = handlers.len(), "publish");
        for handler in handlers {
            handler(&event);
        }
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.registry
            .lock()
            .handlers
            .iter()
            .filter(|(_, c, _)| *c == channel)
            .count()
    }
}

/// Handle to a registered handler. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().handlers.retain(|(id, _, _)| *id != self.id);
        }
    }
}
