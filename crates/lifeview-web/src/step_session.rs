#![forbid(unsafe_code)]

//! Host-driven step driver.
//!
//! The host (a browser shell, a test, a replay tool) owns the event loop:
//!
//! 1. push [`HostInput`]s as they arrive (table notifications, lifecycle,
//!    pointer, color picks);
//! 2. call [`StepSession::step`] once per animation frame;
//! 3. call [`StepSession::take_outputs`] and upload the frame, invoke the
//!    outbound procedures, and forward the log lines.
//!
//! All inputs queued before a step are applied inside one batch, so a step
//! renders at most once no matter how many inputs it drained.

use std::collections::VecDeque;

use lifeview_core::Identity;
use lifeview_render::{PixelBuffer, Viewport};
use lifeview_runtime::{
    ConfigError, MemoryTokenStore, OutboundIntent, OutboundQueue, ResolvedView, Session,
    TableUpdate, TokenStore, TransactionUpdate,
};
use tracing::{debug, warn};

/// One unit of host input.
#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    Table(TableUpdate),
    Transaction(TransactionUpdate),
    /// A connection attempt started.
    Connecting,
    Connected { identity: Identity, token: String },
    Disconnected,
    ConnectError(String),
    PointerClick { x: i32, y: i32 },
    ColorPick(String),
    Commit,
    SetTickInterval(u32),
    Resize(Viewport),
}

impl From<TableUpdate> for HostInput {
    fn from(update: TableUpdate) -> Self {
        Self::Table(update)
    }
}

impl From<TransactionUpdate> for HostInput {
    fn from(tx: TransactionUpdate) -> Self {
        Self::Transaction(tx)
    }
}

/// Result of a single [`StepSession::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepResult {
    /// Number of host inputs applied during this step.
    pub events_processed: u32,
    /// Whether a new frame was rendered.
    pub rendered: bool,
    /// Frames rendered since creation.
    pub frame_idx: u64,
}

/// Everything the host should act on since the last `take_outputs`.
#[derive(Debug, Default, Clone)]
pub struct WebOutputs {
    /// Log lines for the host console (rejected input, persistence failures).
    pub logs: Vec<String>,
    /// Most recent frame rendered since the last take.
    pub last_frame: Option<PixelBuffer>,
    /// Outbound requests in submission order.
    pub intents: Vec<OutboundIntent>,
}

pub struct StepSession {
    session: Session<OutboundQueue>,
    queue: VecDeque<HostInput>,
    outputs: WebOutputs,
}

impl Default for StepSession {
    fn default() -> Self {
        Self::from_session(Session::new(OutboundQueue::new()))
    }
}

impl StepSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver for a configured board with an in-memory token store.
    pub fn with_view(view: ResolvedView) -> Result<Self, ConfigError> {
        Self::with_store(view, Box::new(MemoryTokenStore::new()))
    }

    pub fn with_store(view: ResolvedView, tokens: Box<dyn TokenStore>) -> Result<Self, ConfigError> {
        Session::with_view(view, OutboundQueue::new(), tokens).map(Self::from_session)
    }

    fn from_session(session: Session<OutboundQueue>) -> Self {
        Self {
            session,
            queue: VecDeque::new(),
            outputs: WebOutputs::default(),
        }
    }

    pub fn push_input(&mut self, input: impl Into<HostInput>) {
        self.queue.push_back(input.into());
    }

    /// Decode and queue one JSON-encoded input.
    ///
    /// Returns whether an input was queued; unknown kinds are skipped.
    #[cfg(feature = "input-parser")]
    pub fn push_encoded_input(
        &mut self,
        json: &str,
    ) -> Result<bool, crate::input_parser::InputParseError> {
        match crate::input_parser::parse_encoded_input(json)? {
            Some(input) => {
                self.queue.push_back(input);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Inputs waiting for the next step.
    #[must_use]
    pub fn pending_inputs(&self) -> usize {
        self.queue.len()
    }

    /// Apply queued inputs and render if anything changed.
    pub fn step(&mut self) -> StepResult {
        let mut events_processed = 0u32;
        {
            let _batch = self.session.batch();
            while let Some(input) = self.queue.pop_front() {
                self.dispatch(input);
                events_processed = events_processed.saturating_add(1);
            }
        }

        let rendered = match self.session.frame() {
            Some(frame) => {
                self.outputs.last_frame = Some(frame.clone());
                true
            }
            None => false,
        };
        self.outputs.intents.extend(self.session.sink_mut().drain());

        let result = StepResult {
            events_processed,
            rendered,
            frame_idx: self.session.frame_idx(),
        };
        debug!(
            events = result.events_processed,
            rendered = result.rendered,
            frame_idx = result.frame_idx,
            "step"
        );
        result
    }

    fn dispatch(&mut self, input: HostInput) {
        match input {
            HostInput::Table(update) => {
                self.session.apply(update);
            }
            HostInput::Transaction(tx) => {
                self.session.apply_transaction(tx);
            }
            HostInput::Connecting => {
                if let Err(e) = self.session.begin_connect() {
                    self.log(format!("could not read reconnection token: {e}"));
                }
            }
            HostInput::Connected { identity, token } => {
                if let Err(e) = self.session.on_connect(identity, &token) {
                    self.log(format!("could not store reconnection token: {e}"));
                }
            }
            HostInput::Disconnected => self.session.on_disconnect(),
            HostInput::ConnectError(error) => {
                self.log(format!("connection failed: {error}"));
                self.session.on_connect_error(error);
            }
            HostInput::PointerClick { x, y } => {
                self.session.handle_pointer_click(x, y);
            }
            HostInput::ColorPick(hex) => {
                if let Err(e) = self.session.handle_color_pick(&hex) {
                    self.log(format!("color pick rejected: {e}"));
                }
            }
            HostInput::Commit => {
                self.session.commit();
            }
            HostInput::SetTickInterval(ms) => {
                if let Err(e) = self.session.set_tick_interval(ms) {
                    self.log(format!("tick interval rejected: {e}"));
                }
            }
            HostInput::Resize(viewport) => self.session.resize(viewport),
        }
    }

    fn log(&mut self, line: String) {
        warn!(message = %line, "host input degraded");
        self.outputs.logs.push(line);
    }

    /// Take the accumulated outputs, leaving them empty.
    pub fn take_outputs(&mut self) -> WebOutputs {
        std::mem::take(&mut self.outputs)
    }

    #[must_use]
    pub fn session(&self) -> &Session<OutboundQueue> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<OutboundQueue> {
        &mut self.session
    }
}

impl std::fmt::Debug for StepSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepSession")
            .field("session", &self.session)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}
