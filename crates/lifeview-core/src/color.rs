#![forbid(unsafe_code)]

//! Packed RGBA colors and `#RRGGBB` parsing.
//!
//! Player colors arrive from the remote store as hex strings. They are parsed
//! once per ownership resolution into a [`PackedRgba`] so the renderer never
//! touches strings.

use std::fmt;

/// A color packed as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self(0);

    /// Opaque color from components.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Bytes in canvas `ImageData` order.
    #[inline]
    pub const fn to_rgba8(self) -> [u8; 4] {
        [self.r(), self.g(), self.b(), self.a()]
    }

    /// Parse `#RGB` or `#RRGGBB` (case-insensitive, leading `#` required).
    ///
    /// The result is always opaque.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_owned()))?;
        let nibbles = digits
            .bytes()
            .map(hex_nibble)
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| ColorParseError::InvalidDigit(s.to_owned()))?;
        match *nibbles.as_slice() {
            [r, g, b] => Ok(Self::rgb(r * 17, g * 17, b * 17)),
            [r1, r0, g1, g0, b1, b0] => Ok(Self::rgb(
                (r1 << 4) | r0,
                (g1 << 4) | g0,
                (b1 << 4) | b0,
            )),
            _ => Err(ColorParseError::InvalidLength {
                input: s.to_owned(),
                len: digits.len(),
            }),
        }
    }

    /// Canonical upper-case `#RRGGBB` form (alpha is dropped).
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r(), self.g(), self.b())
    }
}

impl fmt::Display for PackedRgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[inline]
fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Errors from [`PackedRgba::from_hex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Input did not start with `#`.
    MissingHash(String),
    /// Input contained a non-hex digit.
    InvalidDigit(String),
    /// Digit count was neither 3 nor 6.
    InvalidLength { input: String, len: usize },
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHash(input) => write!(f, "color {input:?} must start with '#'"),
            Self::InvalidDigit(input) => write!(f, "color {input:?} contains a non-hex digit"),
            Self::InvalidLength { input, len } => {
                write!(f, "color {input:?} has {len} digits, expected 3 or 6")
            }
        }
    }
}

impl std::error::Error for ColorParseError {}
