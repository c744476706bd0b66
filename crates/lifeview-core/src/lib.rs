#![forbid(unsafe_code)]

//! Core: replicated table mirrors, pending edits, and ownership resolution.
//!
//! # Role in Lifeview
//! `lifeview-core` is the state layer. It owns the local replicas of the
//! remote `alive_cells`, `players`, and `config` tables, the set of
//! unconfirmed local cell toggles, and the derived player-to-color index
//! that the renderer consumes.
//!
//! # Primary responsibilities
//! - **EntityMirror**: local cache of one remote table, mutated only by
//!   insert/update/delete notifications, tolerant of duplicate and
//!   out-of-order delivery.
//! - **PendingEditOverlay**: toggle-set of coordinates the local user intends
//!   to flip on the next commit.
//! - **OwnershipIndex**: lazily derived `PlayerId -> color` lookup plus the
//!   local user's own color.
//! - **Invalidator**: dirty-flag bookkeeping that coalesces bursts of
//!   mutations into a single redraw per frame boundary.
//!
//! # How it fits in the system
//! `lifeview-render` turns snapshots of this state into pixels, and
//! `lifeview-runtime` wires remote events and user input into it. Nothing in
//! this crate performs I/O.

pub mod color;
pub mod invalidation;
pub mod logging;
pub mod mirror;
pub mod model;
pub mod overlay;
pub mod ownership;

pub use color::{ColorParseError, PackedRgba};
pub use invalidation::{BatchScope, Dirty, InvalidationStats, Invalidator};
pub use mirror::{EntityMirror, MirrorChange, MirrorSnapshot, TableRow};
pub use model::{AliveCell, Cell, Identity, IdentityParseError, Player, PlayerId, SimConfig};
pub use overlay::PendingEditOverlay;
pub use ownership::{DEFAULT_FALLBACK_HEX, OwnershipIndex, OwnershipResolution};
