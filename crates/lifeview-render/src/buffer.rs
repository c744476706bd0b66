#![forbid(unsafe_code)]

//! Row-major RGBA pixel storage.

use lifeview_core::PackedRgba;

/// A `width x height` grid of pixels, row-major, origin at the top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<PackedRgba>,
}

impl PixelBuffer {
    /// Buffer filled with `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: PackedRgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Change dimensions and fill every pixel, reusing the allocation.
    pub fn reset(&mut self, width: u32, height: u32, fill: PackedRgba) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize, fill);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<PackedRgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Write one pixel. Out-of-bounds writes are dropped.
    pub fn set(&mut self, x: u32, y: u32, color: PackedRgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Fill a rectangle, clipped to the buffer.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: PackedRgba) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        if x >= x_end || y >= y_end {
            return;
        }
        let stride = self.width as usize;
        for row in y as usize..y_end as usize {
            let start = row * stride;
            self.pixels[start + x as usize..start + x_end as usize].fill(color);
        }
    }

    /// Pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[PackedRgba] {
        &self.pixels
    }

    /// RGBA8 bytes, the layout a canvas `ImageData` expects.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        self.write_rgba8(&mut out);
        out
    }

    /// Append RGBA8 bytes to `out`.
    pub fn write_rgba8(&self, out: &mut Vec<u8>) {
        out.reserve(self.pixels.len() * 4);
        for px in &self.pixels {
            out.extend_from_slice(&px.to_rgba8());
        }
    }
}
