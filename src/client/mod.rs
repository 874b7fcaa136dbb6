//! Single-page client runtime.
//!
//! The generated site works without it; the client makes navigation swap the
//! page body in place instead of reloading. Browser primitives are modelled
//! in-process: [`history::SessionHistory`] for the history stack,
//! [`router::RouteSource`] for fetch, [`body::BodyView`] for the swapped
//! elements and [`context::UiContext`] for page-global state.
//!
//! ```text
//!   click / back / forward
//!            │
//!            ▼
//!         Router ──fetch index.json──▶ RouteSource
//!            │
//!            │ route-change (RouteState)
//!            ▼
//!         EventBus ──▶ PageBody          swap text, links, counters
//!                  ──▶ TocController     re-fold and highlight
//!                  ──▶ PlaygroundRuntime reset buffer, recompile
//! ```

pub mod body;
pub mod context;
pub mod events;
pub mod history;
pub mod router;
pub mod toc;

pub use body::{BodyView, PageBody};
pub use context::{Theme, UiContext};
pub use events::{Channel, EventBus, Subscription, TourEvent};
pub use router::{ClickTarget, DistSource, Navigation, RouteSource, Router, RouterError};
pub use toc::TocController;
