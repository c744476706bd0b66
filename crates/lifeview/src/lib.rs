#![forbid(unsafe_code)]

//! Lifeview public facade crate.
//!
//! Lifeview is the client-side view of a shared Game of Life board: it
//! mirrors the remote `alive_cells`, `players` and `config` tables, lets the
//! local user stage cell toggles and pick a color, and renders everything
//! into an RGBA pixel buffer once per frame.
//!
//! This crate re-exports the stable surface of the internal crates and
//! offers a prelude for day-to-day usage.
//!
//! ```rust,ignore
//! use lifeview::prelude::*;
//!
//! let mut session = Session::new(OutboundQueue::new());
//! session.apply(TableEvent::Insert(AliveCell::new(3, 4, 1)).into());
//! session.handle_pointer_click(40, 40);
//! if let Some(frame) = session.frame() {
//!     upload(frame.to_rgba8());
//! }
//! for intent in session.sink_mut().drain() {
//!     call_procedure(intent.procedure(), intent);
//! }
//! ```

pub mod error;

pub use error::{DegradationAction, Error, Result};

// --- Core re-exports -------------------------------------------------------

pub use lifeview_core::{
    AliveCell, Cell, ColorParseError, Dirty, EntityMirror, Identity, IdentityParseError,
    MirrorChange, OwnershipIndex, OwnershipResolution, PackedRgba, PendingEditOverlay, Player,
    PlayerId, SimConfig,
};

// --- Render re-exports -----------------------------------------------------

pub use lifeview_render::{CompositeRenderer, Palette, PixelBuffer, Viewport, ViewportError};

// --- Runtime re-exports ----------------------------------------------------

pub use lifeview_runtime::{
    ConnectionState, MemoryTokenStore, MutationSink, OutboundIntent, OutboundQueue, ResolvedView,
    Session, TableEvent, TableUpdate, TokenStore, TransactionUpdate, ViewConfig,
};
#[cfg(feature = "state-persistence")]
pub use lifeview_runtime::FileTokenStore;

// --- Web re-exports --------------------------------------------------------

#[cfg(feature = "web")]
pub use lifeview_web::{HostInput, StepResult, StepSession, WebOutputs};

/// Prelude for hosts embedding a session.
pub mod prelude {
    pub use crate::{
        AliveCell, Cell, ConnectionState, Error, Identity, MutationSink, OutboundIntent,
        OutboundQueue, PackedRgba, PixelBuffer, Player, Result, Session, TableEvent, TableUpdate,
        TransactionUpdate, Viewport, ViewConfig,
    };

    #[cfg(feature = "web")]
    pub use crate::{HostInput, StepSession, WebOutputs};

    pub use crate::{core, render, runtime};
    #[cfg(feature = "web")]
    pub use crate::web;
}

pub use lifeview_core as core;
pub use lifeview_render as render;
pub use lifeview_runtime as runtime;
#[cfg(feature = "web")]
pub use lifeview_web as web;
