#![forbid(unsafe_code)]

//! Outbound mutation requests.
//!
//! Every call on a [`MutationSink`] is fire-and-forget: the view never waits
//! for or observes the remote outcome. Confirmation, if any, arrives later as
//! ordinary table notifications.

use std::collections::VecDeque;

use lifeview_core::Cell;

/// Surface for requesting remote mutations.
pub trait MutationSink {
    /// Ask the remote store to flip the given cells.
    fn submit_cell_toggles(&mut self, cells: Vec<Cell>);

    /// Ask the remote store to change the local player's color.
    fn submit_color_change(&mut self, color_hex: String);

    /// Ask the remote simulation to run at a new tick interval.
    fn submit_tick_interval(&mut self, interval_ms: u32);
}

/// A recorded outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundIntent {
    CellToggles(Vec<Cell>),
    ColorChange(String),
    TickInterval(u32),
}

impl OutboundIntent {
    /// Name of the remote procedure the host should invoke.
    pub const fn procedure(&self) -> &'static str {
        match self {
            Self::CellToggles(_) => "add",
            Self::ColorChange(_) => "set_color",
            Self::TickInterval(_) => "update_tick_interval",
        }
    }
}

/// [`MutationSink`] that queues intents for the host to drain.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    intents: VecDeque<OutboundIntent>,
    submitted: u64,
}

impl OutboundQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued intent in submission order.
    pub fn drain(&mut self) -> Vec<OutboundIntent> {
        self.intents.drain(..).collect()
    }

    pub fn pop(&mut self) -> Option<OutboundIntent> {
        self.intents.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Total intents ever queued.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    fn push(&mut self, intent: OutboundIntent) {
        self.submitted += 1;
        self.intents.push_back(intent);
    }
}

impl MutationSink for OutboundQueue {
    fn submit_cell_toggles(&mut self, cells: Vec<Cell>) {
        self.push(OutboundIntent::CellToggles(cells));
    }

    fn submit_color_change(&mut self, color_hex: String) {
        self.push(OutboundIntent::ColorChange(color_hex));
    }

    fn submit_tick_interval(&mut self, interval_ms: u32) {
        self.push(OutboundIntent::TickInterval(interval_ms));
    }
}

impl<S: MutationSink + ?Sized> MutationSink for &mut S {
    fn submit_cell_toggles(&mut self, cells: Vec<Cell>) {
        (**self).submit_cell_toggles(cells);
    }

    fn submit_color_change(&mut self, color_hex: String) {
        (**self).submit_color_change(color_hex);
    }

    fn submit_tick_interval(&mut self, interval_ms: u32) {
        (**self).submit_tick_interval(interval_ms);
    }
}

impl<S: MutationSink + ?Sized> MutationSink for Box<S> {
    fn submit_cell_toggles(&mut self, cells: Vec<Cell>) {
        (**self).submit_cell_toggles(cells);
    }

    fn submit_color_change(&mut self, color_hex: String) {
        (**self).submit_color_change(color_hex);
    }

    fn submit_tick_interval(&mut self, interval_ms: u32) {
        (**self).submit_tick_interval(interval_ms);
    }
}
