#![forbid(unsafe_code)]

//! Render invalidation with frame-boundary coalescing.
//!
//! Every effective mutation of a render input (a mirror, the overlay, the
//! viewport, the local identity) raises one or more [`Dirty`] bits on a
//! shared [`Invalidator`]. Nothing is redrawn at that point. The frame loop
//! calls [`Invalidator::take_frame`] once per frame boundary and receives the
//! union of everything raised since the last frame, so a burst of N events
//! costs exactly one redraw.
//!
//! # Invariants
//!
//! 1. Raising bits never triggers work by itself; only `take_frame` consumes.
//! 2. `take_frame` returns `None` while a [`BatchScope`] is alive, so a
//!    synchronous burst is never observed half-applied.
//! 3. Nested batches are supported: only the outermost scope ends the batch.
//! 4. After `take_frame` returns `Some`, the invalidator is clean until the
//!    next raise.
//!
//! # Usage
//!
//! ```
//! use lifeview_core::invalidation::{Dirty, Invalidator};
//!
//! let inv = Invalidator::new();
//! {
//!     let _batch = inv.batch();
//!     inv.invalidate(Dirty::CELLS);
//!     inv.invalidate(Dirty::CELLS | Dirty::PLAYERS);
//!     assert_eq!(inv.take_frame(), None); // still inside the burst
//! }
//! assert_eq!(inv.take_frame(), Some(Dirty::CELLS | Dirty::PLAYERS));
//! assert_eq!(inv.take_frame(), None);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use tracing::trace;

bitflags! {
    /// Which render inputs changed since the last frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Dirty: u8 {
        /// The alive-cell mirror changed.
        const CELLS = 1 << 0;
        /// The player mirror changed (colors may differ).
        const PLAYERS = 1 << 1;
        /// The pending-edit overlay changed.
        const OVERLAY = 1 << 2;
        /// The viewport was resized or panned.
        const VIEWPORT = 1 << 3;
        /// The local identity or optimistic local color changed.
        const LOCAL = 1 << 4;
    }
}

/// Counters for observing coalescing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvalidationStats {
    /// Number of `invalidate` calls with a non-empty reason.
    pub raised: u64,
    /// Number of frames handed out by `take_frame`.
    pub frames: u64,
}

impl InvalidationStats {
    /// Raises absorbed into an already-pending frame.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.raised.saturating_sub(self.frames)
    }
}

#[derive(Debug, Default)]
struct InvalidationState {
    pending: Dirty,
    /// Batch nesting depth. Frames are withheld while non-zero.
    depth: u32,
    stats: InvalidationStats,
}

/// Shared dirty-flag handle.
///
/// Cloning creates another handle to the **same** state; mirrors and the
/// session hold clones of one invalidator. Single-threaded by construction.
#[derive(Clone, Default)]
pub struct Invalidator {
    inner: Rc<RefCell<InvalidationState>>,
}

impl Invalidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the given inputs changed.
    pub fn invalidate(&self, reason: Dirty) {
        if reason.is_empty() {
            return;
        }
        let mut state = self.inner.borrow_mut();
        state.pending |= reason;
        state.stats.raised += 1;
        trace!(reason = ?reason, pending = ?state.pending, "render invalidated");
    }

    /// Whether any bit is pending (regardless of batching).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.inner.borrow().pending.is_empty()
    }

    /// Currently pending bits.
    #[must_use]
    pub fn pending(&self) -> Dirty {
        self.inner.borrow().pending
    }

    /// Returns true if a batch is currently active.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.inner.borrow().depth > 0
    }

    /// Begin a batch scope. Frames are withheld until the outermost scope drops.
    #[must_use]
    pub fn batch(&self) -> BatchScope {
        let mut state = self.inner.borrow_mut();
        state.depth += 1;
        BatchScope {
            inner: Rc::clone(&self.inner),
            is_root: state.depth == 1,
        }
    }

    /// Consume all pending bits at a frame boundary.
    ///
    /// Returns `None` when clean or while batching.
    pub fn take_frame(&self) -> Option<Dirty> {
        let mut state = self.inner.borrow_mut();
        if state.depth > 0 || state.pending.is_empty() {
            return None;
        }
        state.stats.frames += 1;
        Some(std::mem::take(&mut state.pending))
    }

    #[must_use]
    pub fn stats(&self) -> InvalidationStats {
        self.inner.borrow().stats
    }
}

impl fmt::Debug for Invalidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Invalidator")
            .field("pending", &state.pending)
            .field("depth", &state.depth)
            .field("stats", &state.stats)
            .finish()
    }
}

/// RAII guard for a synchronous burst of mutations.
///
/// While any `BatchScope` is alive, [`Invalidator::take_frame`] yields
/// nothing; bits raised meanwhile are delivered together afterwards.
pub struct BatchScope {
    inner: Rc<RefCell<InvalidationState>>,
    is_root: bool,
}

impl BatchScope {
    /// Whether this scope is the outermost one.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.is_root
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let mut state = self.inner.borrow_mut();
        state.depth = state.depth.saturating_sub(1);
        if self.is_root {
            trace!(pending = ?state.pending, "batch closed");
        }
    }
}

impl fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchScope")
            .field("is_root", &self.is_root)
            .finish()
    }
}
