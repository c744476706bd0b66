#![forbid(unsafe_code)]

//! `lifeview-web` drives a Lifeview session from a host event loop.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes store
//!   notifications, connection changes and pointer input.
//! - **One render per step**: everything queued before a step is applied as
//!   one batch.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The crate does not bind to `wasm-bindgen`; a thin shell wraps
//! [`StepSession`] and forwards [`WebOutputs`] to the page and the store
//! client.

#[cfg(feature = "input-parser")]
pub mod input_parser;
pub mod step_session;

#[cfg(feature = "input-parser")]
pub use input_parser::{InputParseError, parse_encoded_input};
pub use step_session::{HostInput, StepResult, StepSession, WebOutputs};
