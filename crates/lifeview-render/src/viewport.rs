#![forbid(unsafe_code)]

//! Mapping between grid cells and canvas pixels.
//!
//! A [`Viewport`] shows `cols x rows` cells starting at `origin` (the grid
//! coordinate drawn at pixel `(0, 0)`), each cell `cell_size` pixels square.
//! Cells outside that window are clipped by the renderer; pixels outside the
//! canvas map to no cell.

use std::fmt;

use lifeview_core::Cell;

/// Largest canvas side, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Grid width of the shared board.
pub const DEFAULT_COLS: u32 = 192;
/// Grid height of the shared board.
pub const DEFAULT_ROWS: u32 = 108;
pub const DEFAULT_CELL_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    origin: Cell,
    cols: u32,
    rows: u32,
    cell_size: u32,
}

impl Viewport {
    /// Viewport anchored at cell `(0, 0)`.
    pub fn new(cols: u32, rows: u32, cell_size: u32) -> Result<Self, ViewportError> {
        if cell_size == 0 {
            return Err(ViewportError::ZeroCellSize);
        }
        if cols == 0 || rows == 0 {
            return Err(ViewportError::EmptyGrid { cols, rows });
        }
        let width = cols.checked_mul(cell_size);
        let height = rows.checked_mul(cell_size);
        match (width, height) {
            (Some(w), Some(h)) if w <= MAX_CANVAS_SIDE && h <= MAX_CANVAS_SIDE => Ok(Self {
                origin: Cell::new(0, 0),
                cols,
                rows,
                cell_size,
            }),
            _ => Err(ViewportError::TooLarge {
                cols,
                rows,
                cell_size,
            }),
        }
    }

    /// Same size, different top-left cell.
    #[must_use]
    pub const fn with_origin(mut self, origin: Cell) -> Self {
        self.origin = origin;
        self
    }

    /// Shift the visible window by whole cells.
    #[must_use]
    pub const fn panned(self, dx: i32, dy: i32) -> Self {
        self.with_origin(Cell::new(
            self.origin.x.saturating_add(dx),
            self.origin.y.saturating_add(dy),
        ))
    }

    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Cell {
        self.origin
    }

    #[inline]
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    #[inline]
    #[must_use]
    pub const fn pixel_width(&self) -> u32 {
        self.cols * self.cell_size
    }

    #[inline]
    #[must_use]
    pub const fn pixel_height(&self) -> u32 {
        self.rows * self.cell_size
    }

    /// Cell under a pointer position in canvas pixels.
    ///
    /// Returns `None` for positions outside the canvas.
    #[must_use]
    pub fn pixel_to_cell(&self, px: i32, py: i32) -> Option<Cell> {
        if px < 0 || py < 0 {
            return None;
        }
        let (px, py) = (px as u32, py as u32);
        if px >= self.pixel_width() || py >= self.pixel_height() {
            return None;
        }
        let col = i64::from(px / self.cell_size);
        let row = i64::from(py / self.cell_size);
        let x = i32::try_from(i64::from(self.origin.x) + col).ok()?;
        let y = i32::try_from(i64::from(self.origin.y) + row).ok()?;
        Some(Cell::new(x, y))
    }

    /// Top-left pixel of `cell`, or `None` if the cell is not visible.
    #[must_use]
    pub fn cell_to_pixel(&self, cell: Cell) -> Option<(u32, u32)> {
        let col = i64::from(cell.x) - i64::from(self.origin.x);
        let row = i64::from(cell.y) - i64::from(self.origin.y);
        if col < 0 || row < 0 || col >= i64::from(self.cols) || row >= i64::from(self.rows) {
            return None;
        }
        Some((col as u32 * self.cell_size, row as u32 * self.cell_size))
    }

    #[must_use]
    pub fn contains_cell(&self, cell: Cell) -> bool {
        self.cell_to_pixel(cell).is_some()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Cell::new(0, 0),
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

/// Rejected viewport geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportError {
    ZeroCellSize,
    EmptyGrid { cols: u32, rows: u32 },
    /// Canvas would exceed [`MAX_CANVAS_SIDE`] on some side.
    TooLarge { cols: u32, rows: u32, cell_size: u32 },
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCellSize => write!(f, "cell size must be at least one pixel"),
            Self::EmptyGrid { cols, rows } => {
                write!(f, "viewport must show at least one cell (got {cols}x{rows})")
            }
            Self::TooLarge {
                cols,
                rows,
                cell_size,
            } => write!(
                f,
                "{cols}x{rows} cells at {cell_size}px exceeds the {MAX_CANVAS_SIDE}px canvas limit"
            ),
        }
    }
}

impl std::error::Error for ViewportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_shared_board() {
        let vp = Viewport::default();
        assert_eq!((vp.cols(), vp.rows()), (192, 108));
        assert_eq!(vp.pixel_width(), 192 * DEFAULT_CELL_SIZE);
        assert_eq!(Viewport::new(192, 108, DEFAULT_CELL_SIZE), Ok(vp));
    }

    #[test]
    fn rejects_bad_geometry() {
        assert_eq!(Viewport::new(10, 10, 0), Err(ViewportError::ZeroCellSize));
        assert_eq!(
            Viewport::new(0, 10, 4),
            Err(ViewportError::EmptyGrid { cols: 0, rows: 10 })
        );
        assert!(matches!(
            Viewport::new(u32::MAX, 1, 2),
            Err(ViewportError::TooLarge { .. })
        ));
        assert!(matches!(
            Viewport::new(5000, 1, 4),
            Err(ViewportError::TooLarge { .. })
        ));
    }

    #[test]
    fn pixel_to_cell_floors() {
        let vp = Viewport::new(10, 10, 8).unwrap();
        assert_eq!(vp.pixel_to_cell(0, 0), Some(Cell::new(0, 0)));
        assert_eq!(vp.pixel_to_cell(7, 7), Some(Cell::new(0, 0)));
        assert_eq!(vp.pixel_to_cell(8, 15), Some(Cell::new(1, 1)));
        assert_eq!(vp.pixel_to_cell(79, 79), Some(Cell::new(9, 9)));
    }

    #[test]
    fn pixel_outside_canvas_maps_to_none() {
        let vp = Viewport::new(10, 10, 8).unwrap();
        assert_eq!(vp.pixel_to_cell(-1, 0), None);
        assert_eq!(vp.pixel_to_cell(0, -1), None);
        assert_eq!(vp.pixel_to_cell(80, 0), None);
        assert_eq!(vp.pixel_to_cell(0, 80), None);
    }

    #[test]
    fn origin_shifts_both_directions() {
        let vp = Viewport::new(10, 10, 4).unwrap().with_origin(Cell::new(-5, 3));
        assert_eq!(vp.pixel_to_cell(0, 0), Some(Cell::new(-5, 3)));
        assert_eq!(vp.cell_to_pixel(Cell::new(-5, 3)), Some((0, 0)));
        assert_eq!(vp.cell_to_pixel(Cell::new(-4, 5)), Some((4, 8)));
        assert_eq!(vp.cell_to_pixel(Cell::new(-6, 3)), None);
        assert_eq!(vp.cell_to_pixel(Cell::new(5, 3)), None);

        let panned = vp.panned(2, -1);
        assert_eq!(panned.origin(), Cell::new(-3, 2));
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let vp = Viewport::new(4, 4, 2)
            .unwrap()
            .with_origin(Cell::new(i32::MAX - 1, i32::MIN));
        assert_eq!(vp.pixel_to_cell(7, 0), None);
        assert_eq!(vp.pixel_to_cell(2, 0), Some(Cell::new(i32::MAX, i32::MIN)));
        assert_eq!(vp.cell_to_pixel(Cell::new(i32::MIN, i32::MIN)), None);
        assert!(vp.contains_cell(Cell::new(i32::MAX, i32::MIN + 3)));
    }
}
