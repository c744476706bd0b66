#![forbid(unsafe_code)]

//! Runtime for Lifeview.
//!
//! # Role
//! `lifeview-runtime` connects the state layer to the outside world. It
//! routes remote table notifications into mirrors, turns pointer and color
//! input into pending edits and outbound mutations, tracks the connection
//! lifecycle, and renders at frame boundaries.
//!
//! # Key components
//! - [`Session`]: owns all view state; the single entry point for hosts.
//! - [`InteractionController`]: click-to-toggle, commit, color and tick
//!   interval requests.
//! - [`MutationSink`] / [`OutboundQueue`]: fire-and-forget outbound surface.
//! - [`TokenStore`]: reconnection token persistence.
//! - [`ViewConfig`]: board geometry and colors, optionally loaded from files.
//!
//! # Threading
//! Everything here is single-threaded and `!Send`: state is shared through
//! `Rc`, and all work happens on the caller's thread between frames.

pub mod config;
pub mod controller;
pub mod events;
pub mod outbound;
pub mod session;
pub mod token_store;

pub use config::{ConfigError, ResolvedView, ViewConfig};
pub use controller::{InputError, InteractionController};
pub use events::{ConnectionState, TableEvent, TableUpdate, TransactionUpdate};
pub use outbound::{MutationSink, OutboundIntent, OutboundQueue};
pub use session::Session;
#[cfg(feature = "state-persistence")]
pub use token_store::FileTokenStore;
pub use token_store::{MemoryTokenStore, TokenStore, TokenStoreError};
