#![forbid(unsafe_code)]

//! Unconfirmed local cell toggles.
//!
//! A coordinate present in the overlay means "the local user intends to flip
//! this cell on the next commit". Toggling a present coordinate removes it,
//! so two clicks on the same cell cancel out. The overlay is independent of
//! the mirrors until [`PendingEditOverlay::drain_and_clear`] hands its
//! contents to the outbound path.

use ahash::AHashSet;

use crate::invalidation::{Dirty, Invalidator};
use crate::model::Cell;

/// Toggle-set of pending cell edits.
#[derive(Debug, Default)]
pub struct PendingEditOverlay {
    cells: AHashSet<Cell>,
    invalidator: Option<Invalidator>,
}

impl PendingEditOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay that raises [`Dirty::OVERLAY`] on every change.
    #[must_use]
    pub fn attached(invalidator: Invalidator) -> Self {
        Self {
            cells: AHashSet::new(),
            invalidator: Some(invalidator),
        }
    }

    /// Flip membership of `cell`. Returns whether it is present afterwards.
    ///
    /// Amortized O(1).
    pub fn toggle(&mut self, cell: Cell) -> bool {
        let present = if self.cells.remove(&cell) {
            false
        } else {
            self.cells.insert(cell);
            true
        };
        self.invalidate();
        present
    }

    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Pending edits in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }

    /// Take every pending edit and leave the overlay empty, in one step.
    ///
    /// The result is sorted so outbound requests are reproducible.
    pub fn drain_and_clear(&mut self) -> Vec<Cell> {
        let taken = std::mem::take(&mut self.cells);
        if !taken.is_empty() {
            self.invalidate();
        }
        let mut cells: Vec<Cell> = taken.into_iter().collect();
        cells.sort_unstable();
        cells
    }

    /// Sorted copy of the pending edits for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.cells.iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    fn invalidate(&self) {
        if let Some(inv) = &self.invalidator {
            inv.invalidate(Dirty::OVERLAY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_toggle_returns_to_empty() {
        let mut o = PendingEditOverlay::new();
        assert!(o.toggle(Cell::new(5, 5)));
        assert!(o.contains(Cell::new(5, 5)));
        assert!(!o.toggle(Cell::new(5, 5)));
        assert!(o.is_empty());
    }

    #[test]
    fn drain_returns_everything_and_empties() {
        let mut o = PendingEditOverlay::new();
        o.toggle(Cell::new(2, 0));
        o.toggle(Cell::new(0, 1));
        o.toggle(Cell::new(0, 0));
        let drained = o.drain_and_clear();
        assert_eq!(
            drained,
            vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(2, 0)]
        );
        for c in drained {
            assert!(!o.contains(c));
        }
        assert!(o.is_empty());
        assert!(o.drain_and_clear().is_empty());
    }

    #[test]
    fn snapshot_is_independent_copy() {
        let mut o = PendingEditOverlay::new();
        o.toggle(Cell::new(1, 1));
        let snap = o.snapshot();
        o.toggle(Cell::new(1, 1));
        assert_eq!(snap, vec![Cell::new(1, 1)]);
        assert!(o.is_empty());
    }

    #[test]
    fn attached_overlay_invalidates() {
        let inv = Invalidator::new();
        let mut o = PendingEditOverlay::attached(inv.clone());
        o.toggle(Cell::new(0, 0));
        assert_eq!(inv.take_frame(), Some(Dirty::OVERLAY));

        o.drain_and_clear();
        assert_eq!(inv.take_frame(), Some(Dirty::OVERLAY));

        // Draining an empty overlay changes nothing.
        o.drain_and_clear();
        assert_eq!(inv.take_frame(), None);
    }

    #[test]
    fn negative_coordinates_are_ordinary_keys() {
        let mut o = PendingEditOverlay::new();
        o.toggle(Cell::new(-3, -1));
        assert!(o.contains(Cell::new(-3, -1)));
        assert!(!o.contains(Cell::new(3, 1)));
    }
}
