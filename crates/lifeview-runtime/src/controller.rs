#![forbid(unsafe_code)]

//! User input handling.
//!
//! [`InteractionController`] owns the pending-edit overlay and the viewport.
//! Clicks stage toggles locally; nothing leaves the client until
//! [`InteractionController::commit`]. Color picks and tick-interval changes
//! are not staged: they go to the [`MutationSink`] immediately.

use std::fmt;

use lifeview_core::{
    Cell, ColorParseError, Dirty, Invalidator, OwnershipIndex, PackedRgba, PendingEditOverlay,
};
use lifeview_render::Viewport;
use tracing::{debug, info_span};

use crate::outbound::MutationSink;

#[derive(Debug)]
pub struct InteractionController {
    overlay: PendingEditOverlay,
    viewport: Viewport,
    invalidator: Invalidator,
}

impl InteractionController {
    #[must_use]
    pub fn new(viewport: Viewport, invalidator: Invalidator) -> Self {
        Self {
            overlay: PendingEditOverlay::attached(invalidator.clone()),
            viewport,
            invalidator,
        }
    }

    #[must_use]
    pub fn overlay(&self) -> &PendingEditOverlay {
        &self.overlay
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport (resize or pan).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.invalidator.invalidate(Dirty::VIEWPORT);
        }
    }

    /// Toggle the cell under a pointer position in canvas pixels.
    ///
    /// Returns the toggled cell, or `None` if the click landed outside the
    /// viewport (in which case nothing changes).
    pub fn handle_pointer_click(&mut self, px: i32, py: i32) -> Option<Cell> {
        let Some(cell) = self.viewport.pixel_to_cell(px, py) else {
            debug!(px, py, "click outside viewport ignored");
            return None;
        };
        let pending = self.overlay.toggle(cell);
        debug!(x = cell.x, y = cell.y, pending, "cell toggled");
        Some(cell)
    }

    /// Send every pending toggle in one request and clear the overlay.
    ///
    /// The overlay is cleared whatever the remote outcome; an empty overlay
    /// sends nothing. Returns the number of cells submitted.
    pub fn commit(&mut self, sink: &mut impl MutationSink) -> usize {
        let cells = self.overlay.drain_and_clear();
        let count = cells.len();
        let _span = info_span!("lifeview.commit", count).entered();
        if count == 0 {
            debug!("empty commit skipped");
            return 0;
        }
        sink.submit_cell_toggles(cells);
        count
    }

    /// Validate and submit a new local color, showing it immediately.
    pub fn handle_color_pick(
        &mut self,
        color_hex: &str,
        ownership: &mut OwnershipIndex,
        sink: &mut impl MutationSink,
    ) -> Result<PackedRgba, InputError> {
        let color = ownership
            .set_optimistic_color(color_hex)
            .map_err(InputError::InvalidColor)?;
        self.invalidator.invalidate(Dirty::LOCAL);
        sink.submit_color_change(color_hex.to_owned());
        debug!(color = %color, "color change submitted");
        Ok(color)
    }

    /// Request a new simulation tick interval.
    ///
    /// Nothing changes locally; the config mirror picks up the new value
    /// once the remote store applies it.
    pub fn set_tick_interval(
        &mut self,
        interval_ms: u32,
        sink: &mut impl MutationSink,
    ) -> Result<(), InputError> {
        if interval_ms == 0 {
            return Err(InputError::InvalidTickInterval(interval_ms));
        }
        sink.submit_tick_interval(interval_ms);
        debug!(interval_ms, "tick interval change submitted");
        Ok(())
    }
}

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    InvalidColor(ColorParseError),
    /// Tick intervals must be at least one millisecond.
    InvalidTickInterval(u32),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColor(e) => write!(f, "invalid color: {e}"),
            Self::InvalidTickInterval(ms) => write!(f, "invalid tick interval: {ms}ms"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidColor(e) => Some(e),
            Self::InvalidTickInterval(_) => None,
        }
    }
}
