#![forbid(unsafe_code)]

//! Persistence of the reconnection token.
//!
//! The token is opaque to the view: it is written after a successful connect
//! and offered back on the next connection attempt so the remote store can
//! resume the same identity.
//!
//! [`MemoryTokenStore`] is always available. With the `state-persistence`
//! feature, [`FileTokenStore`] keeps the token in a small JSON file:
//!
//! ```json
//! { "format_version": 1, "token": "..." }
//! ```
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash never leaves a truncated file behind.

use std::fmt;

/// Storage for the reconnection token.
pub trait TokenStore {
    /// Stored token, if any.
    fn load(&self) -> Result<Option<String>, TokenStoreError>;

    /// Replace the stored token.
    fn store(&mut self, token: &str) -> Result<(), TokenStoreError>;

    /// Forget the stored token. Clearing an empty store succeeds.
    fn clear(&mut self) -> Result<(), TokenStoreError>;
}

/// In-process token store; forgets everything on drop.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.token.clone())
    }

    fn store(&mut self, token: &str) -> Result<(), TokenStoreError> {
        self.token = Some(token.to_owned());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), TokenStoreError> {
        self.token = None;
        Ok(())
    }
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        (**self).load()
    }

    fn store(&mut self, token: &str) -> Result<(), TokenStoreError> {
        (**self).store(token)
    }

    fn clear(&mut self) -> Result<(), TokenStoreError> {
        (**self).clear()
    }
}

#[cfg(feature = "state-persistence")]
pub use file::FileTokenStore;

#[cfg(feature = "state-persistence")]
mod file {
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use serde::{Deserialize, Serialize};
    use tracing::debug;

    use super::{TokenStore, TokenStoreError};

    const FORMAT_VERSION: u32 = 1;

    #[derive(Debug, Serialize, Deserialize)]
    struct TokenFile {
        format_version: u32,
        token: String,
    }

    /// Token store backed by a JSON file.
    #[derive(Debug, Clone)]
    pub struct FileTokenStore {
        path: PathBuf,
    }

    impl FileTokenStore {
        /// Store at `path`. The file need not exist yet.
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn temp_path(&self) -> PathBuf {
            let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
            name.push(".tmp");
            self.path.with_file_name(name)
        }
    }

    impl TokenStore for FileTokenStore {
        fn load(&self) -> Result<Option<String>, TokenStoreError> {
            let content = match std::fs::read_to_string(&self.path) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(TokenStoreError::Io(e)),
            };
            let file: TokenFile = serde_json::from_str(&content).map_err(TokenStoreError::Json)?;
            if file.format_version != FORMAT_VERSION {
                return Err(TokenStoreError::UnsupportedVersion(file.format_version));
            }
            debug!(path = %self.path.display(), "reconnection token loaded");
            Ok(Some(file.token))
        }

        fn store(&mut self, token: &str) -> Result<(), TokenStoreError> {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(TokenStoreError::Io)?;
            }
            let file = TokenFile {
                format_version: FORMAT_VERSION,
                token: token.to_owned(),
            };
            let json = serde_json::to_string_pretty(&file).map_err(TokenStoreError::Json)?;
            let tmp = self.temp_path();
            std::fs::write(&tmp, json).map_err(TokenStoreError::Io)?;
            std::fs::rename(&tmp, &self.path).map_err(TokenStoreError::Io)?;
            debug!(path = %self.path.display(), "reconnection token stored");
            Ok(())
        }

        fn clear(&mut self) -> Result<(), TokenStoreError> {
            match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(TokenStoreError::Io(e)),
            }
        }
    }
}

/// Errors from a [`TokenStore`].
#[derive(Debug)]
pub enum TokenStoreError {
    /// I/O error reading or writing the backing file.
    Io(std::io::Error),
    /// Backing file is not valid JSON of the expected shape.
    #[cfg(feature = "state-persistence")]
    Json(serde_json::Error),
    /// Backing file was written by an incompatible version.
    UnsupportedVersion(u32),
}

impl fmt::Display for TokenStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "token store I/O error: {e}"),
            #[cfg(feature = "state-persistence")]
            Self::Json(e) => write!(f, "token store JSON error: {e}"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported token file version {v}"),
        }
    }
}

impl std::error::Error for TokenStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "state-persistence")]
            Self::Json(e) => Some(e),
            Self::UnsupportedVersion(_) => None,
        }
    }
}
