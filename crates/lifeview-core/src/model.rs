#![forbid(unsafe_code)]

//! Row types of the replicated tables.
//!
//! These mirror the remote schema: `alive_cells` (keyed by coordinate),
//! `players` (keyed by auto-increment id, unique on identity), and `config`
//! (single row holding the simulation tick interval).

use std::fmt;

use crate::mirror::TableRow;

/// Stable player id assigned by the remote store.
pub type PlayerId = u32;

/// A grid coordinate.
///
/// Used as the lookup key of alive cells and as the shape of a pending edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A currently-alive cell in the remote simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AliveCell {
    pub x: i32,
    pub y: i32,
    pub owner_id: PlayerId,
}

impl AliveCell {
    #[inline]
    pub const fn new(x: i32, y: i32, owner_id: PlayerId) -> Self {
        Self { x, y, owner_id }
    }

    #[inline]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

impl TableRow for AliveCell {
    type Key = Cell;
    const TABLE: &'static str = "alive_cells";

    fn key(&self) -> Cell {
        self.cell()
    }
}

/// Opaque 32-byte credential identifying a connected client.
///
/// Equality is byte equality: two values decoded from the same credential
/// compare equal regardless of where they came from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; 32]);

impl Identity {
    pub const LEN: usize = 32;

    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse the 64-character hex form (an optional `0x` prefix is accepted).
    pub fn from_hex(s: &str) -> Result<Self, IdentityParseError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != Self::LEN * 2 {
            return Err(IdentityParseError::InvalidLength(digits.len()));
        }
        let mut bytes = [0u8; 32];
        for (i, pair) in digits.as_bytes().chunks_exact(2).enumerate() {
            let hi = hex_value(pair[0]).ok_or(IdentityParseError::InvalidDigit(i * 2))?;
            let lo = hex_value(pair[1]).ok_or(IdentityParseError::InvalidDigit(i * 2 + 1))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    /// Lower-case 64-character hex form.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(Self::LEN * 2);
        for byte in self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix keeps logs readable.
        let hex = self.to_hex();
        write!(f, "Identity({}..)", &hex[..12])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

/// Errors from [`Identity::from_hex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityParseError {
    /// Expected 64 hex digits.
    InvalidLength(usize),
    /// Non-hex digit at the given offset.
    InvalidDigit(usize),
}

impl fmt::Display for IdentityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength(len) => write!(f, "identity has {len} hex digits, expected 64"),
            Self::InvalidDigit(at) => write!(f, "identity has a non-hex digit at offset {at}"),
        }
    }
}

impl std::error::Error for IdentityParseError {}

/// A player record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Player {
    pub id: PlayerId,
    pub identity: Identity,
    pub color_hex: String,
}

impl Player {
    pub fn new(id: PlayerId, identity: Identity, color_hex: impl Into<String>) -> Self {
        Self {
            id,
            identity,
            color_hex: color_hex.into(),
        }
    }
}

impl TableRow for Player {
    type Key = PlayerId;
    const TABLE: &'static str = "players";

    fn key(&self) -> PlayerId {
        self.id
    }
}

/// Simulation settings row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimConfig {
    pub id: u32,
    pub tick_interval_ms: u32,
}

impl TableRow for SimConfig {
    type Key = u32;
    const TABLE: &'static str = "config";

    fn key(&self) -> u32 {
        self.id
    }
}
