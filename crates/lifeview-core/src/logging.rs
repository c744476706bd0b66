#![forbid(unsafe_code)]

//! Logging setup and shared span/field names.
//!
//! Every crate in the workspace logs through `tracing`. The span names below
//! are stable so that subscribers (and tests) can match on them.
//!
//! With the `tracing-json` feature, [`init_json_subscriber`] installs a
//! global JSON formatter filtered by `RUST_LOG` (default `info`).

/// Span wrapping one applied table event.
pub const SPAN_APPLY: &str = "lifeview.apply";
/// Span wrapping one composite render.
pub const SPAN_RENDER: &str = "lifeview.render";
/// Span wrapping one commit of pending edits.
pub const SPAN_COMMIT: &str = "lifeview.commit";

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Install a JSON subscriber as the global default.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
        .is_ok()
}
