#![forbid(unsafe_code)]

//! Composite renderer.
//!
//! Rendering is a pure function of a [`Scene`] and a [`Palette`]: the same
//! inputs always produce byte-identical pixels. Layers are painted in a fixed
//! order, later layers overwriting earlier ones:
//!
//! 1. background fill;
//! 2. grid lines (optional);
//! 3. alive cells, in mirror key order, each in its owner's color;
//! 4. pending edits, in the local user's color.
//!
//! A pending edit therefore hides an alive cell at the same coordinate. Cells
//! outside the viewport are clipped and counted in [`CompositeStats`].

use lifeview_core::{AliveCell, Cell, MirrorSnapshot, OwnershipResolution, PackedRgba};

use crate::buffer::PixelBuffer;
use crate::palette::Palette;
use crate::viewport::Viewport;

/// Everything one render reads. All borrowed state is immutable.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub cells: &'a MirrorSnapshot<AliveCell>,
    /// Pending edits; order does not affect output.
    pub pending: &'a [Cell],
    pub ownership: &'a OwnershipResolution,
    pub viewport: Viewport,
}

/// What one render drew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositeStats {
    pub alive_drawn: usize,
    pub alive_clipped: usize,
    pub pending_drawn: usize,
    pub pending_clipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CompositeRenderer {
    palette: Palette,
}

impl CompositeRenderer {
    #[must_use]
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Render into a fresh buffer sized to the viewport.
    #[must_use]
    pub fn render(&self, scene: &Scene<'_>) -> PixelBuffer {
        let mut out = PixelBuffer::new(0, 0, self.palette.background);
        self.render_into(scene, &mut out);
        out
    }

    /// Render into `out`, resizing it to the viewport and reusing its storage.
    pub fn render_into(&self, scene: &Scene<'_>, out: &mut PixelBuffer) -> CompositeStats {
        let vp = scene.viewport;
        let size = vp.cell_size();
        out.reset(vp.pixel_width(), vp.pixel_height(), self.palette.background);

        let inset = u32::from(self.palette.grid_lines && size >= 3);
        if inset == 1 {
            self.paint_grid(&vp, out);
        }

        let mut stats = CompositeStats::default();
        for alive in scene.cells.iter() {
            let color = scene.ownership.color_of(alive.owner_id);
            if paint_cell(out, &vp, alive.cell(), inset, color) {
                stats.alive_drawn += 1;
            } else {
                stats.alive_clipped += 1;
            }
        }

        let local = scene.ownership.local_color();
        for &cell in scene.pending {
            if paint_cell(out, &vp, cell, inset, local) {
                stats.pending_drawn += 1;
            } else {
                stats.pending_clipped += 1;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            alive_drawn = stats.alive_drawn,
            alive_clipped = stats.alive_clipped,
            pending_drawn = stats.pending_drawn,
            pending_clipped = stats.pending_clipped,
            "composite painted"
        );

        stats
    }

    fn paint_grid(&self, vp: &Viewport, out: &mut PixelBuffer) {
        let size = vp.cell_size();
        let (w, h) = (vp.pixel_width(), vp.pixel_height());
        for col in 0..vp.cols() {
            out.fill_rect(col * size, 0, 1, h, self.palette.grid_line);
        }
        for row in 0..vp.rows() {
            out.fill_rect(0, row * size, w, 1, self.palette.grid_line);
        }
    }
}

/// Returns false when `cell` is outside the viewport.
fn paint_cell(out: &mut PixelBuffer, vp: &Viewport, cell: Cell, inset: u32, color: PackedRgba) -> bool {
    match vp.cell_to_pixel(cell) {
        Some((px, py)) => {
            let side = vp.cell_size() - inset;
            out.fill_rect(px + inset, py + inset, side, side, color);
            true
        }
        None => false,
    }
}
