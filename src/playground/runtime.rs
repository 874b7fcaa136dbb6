//! Debounced compile/run loop behind the code editor.
//!
//! The runtime owns the editor buffer. Edits replace it and re-arm a debounce
//! timer; when the timer fires the buffer is sent to the [`Compiler`], and a
//! successful artifact is handed to the [`Runner`] whose output streams into
//! the [`OutputPane`].
//!
//! ## Tickets
//!
//! ```text
//! edit ──▶ arm(ticket n) ──sleep(debounce)──▶ compile ──▶ run ──▶ pane
//!             │ cancels ticket n-1's token
//! ```
//!
//! There is a single slot per editor. Arming a new ticket cancels the token of
//! the previous one, which stops it if it is still waiting out the debounce.
//! Compiles already sent to a worker are not aborted; every pane write checks
//! that its ticket still owns the slot, so late output of a superseded compile
//! is dropped.
//!
//! Navigation replaces the buffer with the new lesson's code and arms a fresh
//! ticket. Dropping the runtime cancels the slot and unsubscribes.

use super::worker::{CompileRequest, CompileResult, Compiler, Diagnostic, Runner};
use crate::client::{Subscription, Theme, UiContext};
use crate::config::SiteConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

#[derive(Error, Debug)]
pub enum PlaygroundError {
    #[error("the playground must be created inside a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    /// Fast path used while typing.
    Trace,
    /// Full debug compile.
    Debug,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum OutputStatus {
    #[default]
    Idle,
    Compiling,
    Running,
    Finished,
    /// Terminal error indicator; the pane holds no program output.
    Failed(Vec<Diagnostic>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputPane {
    pub status: OutputStatus,
    pub lines: Vec<String>,
    /// Ticket of the compile that last wrote the pane.
    pub ticket: u64,
}

impl OutputPane {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct PlaygroundOptions {
    pub debounce: Duration,
    /// Name the buffer is compiled under.
    pub file_name: String,
}

impl Default for PlaygroundOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            file_name: "main.mbt".to_string(),
        }
    }
}

impl PlaygroundOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            debounce: config.playground.debounce(),
            file_name: config.main_file_name(),
        }
    }
}

struct Slot {
    ticket: u64,
    token: CancellationToken,
}

struct Session {
    buffer: String,
    slot: Option<Slot>,
    next_ticket: u64,
    theme: Theme,
    compiles_started: usize,
}

impl Session {
    fn owns(&self, ticket: u64) -> bool {
        self.slot.as_ref().is_some_and(|s| s.ticket == ticket)
    }
}

struct Shared<C, R> {
    compiler: C,
    runner: R,
    options: PlaygroundOptions,
    session: Mutex<Session>,
    handle: Handle,
    updates: watch::Sender<OutputPane>,
}

pub struct PlaygroundRuntime<C: Compiler + 'static, R: Runner + 'static> {
    shared: Arc<Shared<C, R>>,
    _route: Subscription,
    _theme: Subscription,
}

impl<C: Compiler + 'static, R: Runner + 'static> PlaygroundRuntime<C, R> {
    /// Create a runtime seeded with `initial_code`.
    ///
    /// Nothing is compiled until the first edit, navigation or
    /// [`run_now`](Self::run_now).
    pub fn new(
        ctx: &UiContext,
        compiler: C,
        runner: R,
        options: PlaygroundOptions,
        initial_code: impl Into<String>,
    ) -> Result<Self, PlaygroundError> {
        let handle = Handle::try_current()?;
        let (updates, _) = watch::channel(OutputPane::default());
        let shared = Arc::new(Shared {
            compiler,
            runner,
            options,
            session: Mutex::new(Session {
                buffer: initial_code.into(),
                slot: None,
                next_ticket: 1,
                theme: ctx.theme(),
                compiles_started: 0,
            }),
            handle,
            updates,
        });

        let weak = Arc::downgrade(&shared);
        let route = ctx.bus().on_route_change(move |state| {
            if let Some(shared) = weak.upgrade() {
                shared.reset(&state.code);
            }
        });
        let weak = Arc::downgrade(&shared);
        let theme = ctx.bus().on_theme_change(move |theme| {
            if let Some(shared) = weak.upgrade() {
                shared.session.lock().theme = theme;
            }
        });

        Ok(Self {
            shared,
            _route: route,
            _theme: theme,
        })
    }

    /// Replace the buffer and schedule a compile after the debounce window.
    pub fn edit(&self, text: impl Into<String>) {
        let mut session = self.shared.session.lock();
        session.buffer = text.into();
        Shared::arm(&self.shared, &mut session, Some(self.shared.options.debounce), CompileMode::Trace);
    }

    /// Compile the current buffer immediately, superseding anything pending.
    pub fn run_now(&self, mode: CompileMode) {
        let mut session = self.shared.session.lock();
        Shared::arm(&self.shared, &mut session, None, mode);
    }

    pub fn buffer(&self) -> String {
        self.shared.session.lock().buffer.clone()
    }

    pub fn output(&self) -> OutputPane {
        self.shared.updates.borrow().clone()
    }

    /// Watch the output pane; every write is observable.
    pub fn subscribe_output(&self) -> watch::Receiver<OutputPane> {
        self.shared.updates.subscribe()
    }

    pub fn editor_theme(&self) -> &'static str {
        self.shared.session.lock().theme.editor_theme()
    }

    /// Number of compiles that reached the worker.
    pub fn compiles_started(&self) -> usize {
        self.shared.session.lock().compiles_started
    }
}

impl<C: Compiler + 'static, R: Runner + 'static> Drop for PlaygroundRuntime<C, R> {
    fn drop(&mut self) {
        if let Some(slot) = self.shared.session.lock().slot.take() {
            slot.token.cancel();
        }
    }
}

impl<C: Compiler + 'static, R: Runner + 'static> Shared<C, R> {
    fn reset(self: &Arc<Self>, code: &str) {
        let mut session = self.session.lock();
        session.buffer = code.to_string();
        Self::arm(self, &mut session, Some(self.options.debounce), CompileMode::Trace);
    }

    /// Give the slot to a new ticket and schedule its compile.
    fn arm(this: &Arc<Self>, session: &mut Session, delay: Option<Duration>, mode: CompileMode) {
        if let Some(previous) = session.slot.take() {
            previous.token.cancel();
        }
        let ticket = session.next_ticket;
        session.next_ticket += 1;
        let token = CancellationToken::new();
        session.slot = Some(Slot {
            ticket,
            token: token.clone(),
        });

        let shared = Arc::clone(this);
        this.handle.spawn(async move {
            if let Some(delay) = delay {
                tokio::select! {
                    _ = token.cancelled() => {
                        trace!(ticket, "superseded while debouncing");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            shared.compile(ticket, mode).await;
        });
    }

    async fn compile(self: Arc<Self>, ticket: u64, mode: CompileMode) {
        let source = {
            let mut session = self.session.lock();
            if !session.owns(ticket) {
                return;
            }
            session.compiles_started += 1;
            session.buffer.clone()
        };
        self.update(ticket, |pane| pane.status = OutputStatus::Compiling);

        let request = CompileRequest {
            files: vec![(self.options.file_name.clone(), source)],
            debug: mode == CompileMode::Debug,
        };
        debug!(ticket, ?mode, "compiling");
        let artifact = match self.compiler.compile(request).await {
            Ok(CompileResult::Success { artifact }) => artifact,
            Ok(CompileResult::Error { diagnostics }) => {
                self.fail(ticket, diagnostics);
                return;
            }
            Err(e) => {
                warn!(ticket, error = %e, "compile worker failed");
                self.fail(ticket, vec![Diagnostic::error(e.to_string())]);
                return;
            }
        };

        let started = self.update(ticket, |pane| {
            pane.status = OutputStatus::Running;
            pane.lines.clear();
        });
        if !started {
            debug!(ticket, "dropping result of superseded compile");
            return;
        }

        let mut chunks = match self.runner.run(artifact).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(ticket, error = %e, "runner failed");
                self.fail(ticket, vec![Diagnostic::error(e.to_string())]);
                return;
            }
        };
        while let Some(chunk) = chunks.recv().await {
            if !self.update(ticket, |pane| pane.lines.push(chunk)) {
                debug!(ticket, "dropping output of superseded run");
                return;
            }
        }
        self.update(ticket, |pane| pane.status = OutputStatus::Finished);
    }

    fn fail(&self, ticket: u64, diagnostics: Vec<Diagnostic>) {
        let written = self.update(ticket, |pane| {
            pane.status = OutputStatus::Failed(diagnostics);
            pane.lines.clear();
        });
        if !written {
            debug!(ticket, "dropping diagnostics of superseded compile");
        }
    }

    /// Write the pane if `ticket` still owns the slot.
    fn update(&self, ticket: u64, f: impl FnOnce(&mut OutputPane)) -> bool {
        let session = self.session.lock();
        if !session.owns(ticket) {
            return false;
        }
        self.updates.send_modify(|pane| {
            pane.ticket = ticket;
            f(pane);
        });
        true
    }
}
