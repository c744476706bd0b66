#![forbid(unsafe_code)]

//! Lifeview error model and graceful degradation.
//!
//! Each crate owns a typed error for its own failures. [`Error`] gathers
//! them so a host can funnel everything through one `?`, and
//! [`Error::degradation`] tells it how to keep the board on screen instead of
//! tearing the session down.

use std::fmt;

use lifeview_core::{ColorParseError, IdentityParseError};
use lifeview_render::ViewportError;
use lifeview_runtime::{ConfigError, InputError, TokenStoreError};
#[cfg(feature = "input-parser")]
use lifeview_web::InputParseError;

/// Top-level error for Lifeview hosts.
#[derive(Debug)]
pub enum Error {
    /// A color string that is not `#RGB` or `#RRGGBB`.
    Color(ColorParseError),
    /// An identity that is not 64 hex digits.
    Identity(IdentityParseError),
    /// Board geometry the viewport rejects.
    Viewport(ViewportError),
    /// Rejected user input.
    Input(InputError),
    /// View configuration failed to load or validate.
    Config(ConfigError),
    /// Reconnection token could not be read or written.
    TokenStore(TokenStoreError),
    /// The connection attempt failed.
    Connection(String),
    /// Encoded host input could not be decoded.
    #[cfg(feature = "input-parser")]
    HostInput(InputParseError),
    /// Raw I/O error (convenience variant for `?` on io::Result).
    Io(std::io::Error),
}

/// Standard result type for Lifeview APIs.
pub type Result<T> = std::result::Result<T, Error>;

// ── Graceful Degradation ────────────────────────────────────────────────

/// What the host should do when an error occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradationAction {
    /// Discard the offending input and carry on.
    DropInput,
    /// Keep presenting the previous frame.
    KeepLastFrame,
    /// Keep rendering the mirrors as last received until reconnected.
    KeepStaleMirror,
    /// Continue with default settings or without persisted state.
    UseDefaults,
    /// The error is unrecoverable.
    Shutdown,
}

impl Error {
    /// Determine the graceful degradation action for this error.
    pub fn degradation(&self) -> DegradationAction {
        match self {
            Self::Color(_) | Self::Identity(_) | Self::Input(_) => DegradationAction::DropInput,
            #[cfg(feature = "input-parser")]
            Self::HostInput(_) => DegradationAction::DropInput,
            Self::Viewport(_) => DegradationAction::KeepLastFrame,
            Self::Connection(_) => DegradationAction::KeepStaleMirror,
            Self::Config(_) | Self::TokenStore(_) => DegradationAction::UseDefaults,
            Self::Io(_) => DegradationAction::Shutdown,
        }
    }

    /// Short machine-readable name, for log fields.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Color(_) => "color",
            Self::Identity(_) => "identity",
            Self::Viewport(_) => "viewport",
            Self::Input(_) => "input",
            Self::Config(_) => "config",
            Self::TokenStore(_) => "token_store",
            Self::Connection(_) => "connection",
            #[cfg(feature = "input-parser")]
            Self::HostInput(_) => "host_input",
            Self::Io(_) => "io",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self.degradation(), DegradationAction::Shutdown)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(e) => write!(f, "color: {e}"),
            Self::Identity(e) => write!(f, "identity: {e}"),
            Self::Viewport(e) => write!(f, "viewport: {e}"),
            Self::Input(e) => write!(f, "input: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::TokenStore(e) => write!(f, "token store: {e}"),
            Self::Connection(msg) => write!(f, "connection: {msg}"),
            #[cfg(feature = "input-parser")]
            Self::HostInput(e) => write!(f, "host input: {e}"),
            Self::Io(e) => write!(f, "I/O: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Color(e) => Some(e),
            Self::Identity(e) => Some(e),
            Self::Viewport(e) => Some(e),
            Self::Input(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::TokenStore(e) => Some(e),
            Self::Connection(_) => None,
            #[cfg(feature = "input-parser")]
            Self::HostInput(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Error {
                fn from(err: $source) -> Self {
                    Self::$variant(err)
                }
            }
        )*
    };
}

impl_from! {
    ColorParseError => Color,
    IdentityParseError => Identity,
    ViewportError => Viewport,
    InputError => Input,
    ConfigError => Config,
    TokenStoreError => TokenStore,
    std::io::Error => Io,
}

#[cfg(feature = "input-parser")]
impl From<InputParseError> for Error {
    fn from(err: InputParseError) -> Self {
        Self::HostInput(err)
    }
}

impl fmt::Display for DegradationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropInput => write!(f, "drop_input"),
            Self::KeepLastFrame => write!(f, "keep_last_frame"),
            Self::KeepStaleMirror => write!(f, "keep_stale_mirror"),
            Self::UseDefaults => write!(f, "use_defaults"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use lifeview_core::PackedRgba;
    use lifeview_render::Viewport;

    use super::*;

    fn color_error() -> ColorParseError {
        PackedRgba::from_hex("red").unwrap_err()
    }

    #[test]
    fn bad_input_is_dropped() {
        let err = Error::from(color_error());
        assert_eq!(err.degradation(), DegradationAction::DropInput);
        assert_eq!(err.error_type(), "color");
        assert!(StdError::source(&err).is_some());

        let err = Error::from(InputError::InvalidTickInterval(0));
        assert_eq!(err.degradation(), DegradationAction::DropInput);
        assert!(format!("{err}").contains("0ms"));

        let err = Error::from(lifeview_core::Identity::from_hex("abc").unwrap_err());
        assert_eq!(err.degradation(), DegradationAction::DropInput);
    }

    #[test]
    fn eight_digit_color_is_rejected() {
        let err = Error::from(PackedRgba::from_hex("#11223344").unwrap_err());
        assert_eq!(err.degradation(), DegradationAction::DropInput);
        assert!(format!("{err}").contains("#11223344"));
    }

    #[test]
    fn bad_geometry_keeps_last_frame() {
        let err = Error::from(Viewport::new(10, 10, 0).unwrap_err());
        assert_eq!(err.degradation(), DegradationAction::KeepLastFrame);
        assert!(err.is_recoverable());
    }

    #[test]
    fn connection_failure_keeps_mirror() {
        let err = Error::Connection("refused".into());
        assert_eq!(err.degradation(), DegradationAction::KeepStaleMirror);
        assert_eq!(format!("{err}"), "connection: refused");
        assert!(StdError::source(&err).is_none());
    }

    #[test]
    fn config_and_token_failures_fall_back() {
        let err = Error::from(ConfigError::Validation(vec!["cols: zero".into()]));
        assert_eq!(err.degradation(), DegradationAction::UseDefaults);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = Error::from(TokenStoreError::Io(io));
        assert_eq!(err.degradation(), DegradationAction::UseDefaults);
        assert!(format!("{err}").contains("read-only"));
    }

    #[test]
    fn raw_io_shuts_down() {
        let err = Error::from(std::io::Error::other("gone"));
        assert_eq!(err.degradation(), DegradationAction::Shutdown);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn action_display() {
        assert_eq!(DegradationAction::DropInput.to_string(), "drop_input");
        assert_eq!(DegradationAction::KeepStaleMirror.to_string(), "keep_stale_mirror");
        assert_eq!(DegradationAction::Shutdown.to_string(), "shutdown");
    }

    #[cfg(feature = "input-parser")]
    #[test]
    fn host_input_is_dropped() {
        let err = Error::from(InputParseError::MissingField("x"));
        assert_eq!(err.degradation(), DegradationAction::DropInput);
        assert_eq!(err.error_type(), "host_input");
    }
}
