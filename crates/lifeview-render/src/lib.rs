#![forbid(unsafe_code)]

//! Render kernel for Lifeview.
//!
//! # Role
//! `lifeview-render` turns immutable snapshots of the replicated state into
//! an RGBA [`PixelBuffer`] that the host uploads to a canvas unchanged.
//!
//! # Key components
//! - [`CompositeRenderer`]: deterministic layered compositor.
//! - [`Viewport`]: cell/pixel mapping and clipping window.
//! - [`Palette`]: board background and grid colors.
//!
//! # Determinism
//! No clock, randomness, or global state is read while rendering. Timing and
//! logging around a render belong to the caller.

pub mod buffer;
pub mod compositor;
pub mod palette;
pub mod viewport;

pub use buffer::PixelBuffer;
pub use compositor::{CompositeRenderer, CompositeStats, Scene};
pub use palette::Palette;
pub use viewport::{
    DEFAULT_CELL_SIZE, DEFAULT_COLS, DEFAULT_ROWS, MAX_CANVAS_SIDE, Viewport, ViewportError,
};
