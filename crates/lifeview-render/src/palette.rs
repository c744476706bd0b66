#![forbid(unsafe_code)]

use lifeview_core::PackedRgba;

/// Fixed colors of the board itself. Player colors come from ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Palette {
    pub background: PackedRgba,
    pub grid_line: PackedRgba,
    /// Draw a one-pixel line along the top and left edge of every cell.
    ///
    /// Ignored when cells are smaller than three pixels.
    pub grid_lines: bool,
}

impl Palette {
    pub const DEFAULT_BACKGROUND: PackedRgba = PackedRgba::rgb(0x11, 0x11, 0x11);
    pub const DEFAULT_GRID_LINE: PackedRgba = PackedRgba::rgb(0x22, 0x22, 0x22);

    /// Palette without grid lines.
    #[must_use]
    pub const fn plain(background: PackedRgba) -> Self {
        Self {
            background,
            grid_line: background,
            grid_lines: false,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Self::DEFAULT_BACKGROUND,
            grid_line: Self::DEFAULT_GRID_LINE,
            grid_lines: true,
        }
    }
}
