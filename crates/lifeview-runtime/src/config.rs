#![forbid(unsafe_code)]

//! View configuration.
//!
//! Board geometry and fixed colors as a single [`ViewConfig`] that can be
//! loaded from TOML or JSON (feature `view-config`). Missing fields take
//! their defaults, so a file only needs the values it changes.
//!
//! ```toml
//! # lifeview.toml
//! cols = 96
//! rows = 54
//! cell_size = 10
//! grid_lines = false
//! background = "#000000"
//! ```
//!
//! ```rust,ignore
//! let view = ViewConfig::from_toml_file("lifeview.toml")?.resolve()?;
//! ```

#[cfg(feature = "view-config")]
use std::path::Path;

#[cfg(feature = "view-config")]
use serde::{Deserialize, Serialize};

use lifeview_core::{Cell, DEFAULT_FALLBACK_HEX, PackedRgba};
use lifeview_render::{
    DEFAULT_CELL_SIZE, DEFAULT_COLS, DEFAULT_ROWS, Palette, Viewport, ViewportError,
};

/// Tunable view parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "view-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "view-config", serde(default))]
pub struct ViewConfig {
    /// Visible columns. Default: 192.
    pub cols: u32,
    /// Visible rows. Default: 108.
    pub rows: u32,
    /// Cell side in pixels. Default: 8.
    pub cell_size: u32,
    /// Grid coordinate drawn at the top-left corner. Default: (0, 0).
    pub origin_x: i32,
    pub origin_y: i32,
    /// Draw grid lines between cells. Default: true.
    pub grid_lines: bool,
    /// Board background. Default: `#111111`.
    pub background: String,
    /// Grid line color. Default: `#222222`.
    pub grid_line: String,
    /// Color of cells whose owner is unknown. Default: `#FFFFFF`.
    pub fallback_color: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            cell_size: DEFAULT_CELL_SIZE,
            origin_x: 0,
            origin_y: 0,
            grid_lines: true,
            background: Palette::DEFAULT_BACKGROUND.to_hex(),
            grid_line: Palette::DEFAULT_GRID_LINE.to_hex(),
            fallback_color: DEFAULT_FALLBACK_HEX.to_owned(),
        }
    }
}

/// A validated [`ViewConfig`] in render-ready form.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedView {
    pub viewport: Viewport,
    pub palette: Palette,
    pub fallback_hex: String,
}

impl Default for ResolvedView {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            palette: Palette::default(),
            fallback_hex: DEFAULT_FALLBACK_HEX.to_owned(),
        }
    }
}

impl ViewConfig {
    /// Load from a TOML string.
    #[cfg(feature = "view-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "view-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "view-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "view-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Check every field. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = Viewport::new(self.cols, self.rows, self.cell_size) {
            errors.push(format!("viewport: {e}"));
        }
        for (field, value) in [
            ("background", &self.background),
            ("grid_line", &self.grid_line),
            ("fallback_color", &self.fallback_color),
        ] {
            if let Err(e) = PackedRgba::from_hex(value) {
                errors.push(format!("{field}: {e}"));
            }
        }

        errors
    }

    /// Validate and convert.
    pub fn resolve(&self) -> Result<ResolvedView, ConfigError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        let viewport = Viewport::new(self.cols, self.rows, self.cell_size)
            .map_err(ConfigError::Viewport)?
            .with_origin(Cell::new(self.origin_x, self.origin_y));
        let palette = Palette {
            background: parse_checked(&self.background)?,
            grid_line: parse_checked(&self.grid_line)?,
            grid_lines: self.grid_lines,
        };
        Ok(ResolvedView {
            viewport,
            palette,
            fallback_hex: self.fallback_color.clone(),
        })
    }
}

fn parse_checked(hex: &str) -> Result<PackedRgba, ConfigError> {
    PackedRgba::from_hex(hex).map_err(|e| ConfigError::Validation(vec![e.to_string()]))
}

/// Errors that can occur when loading a view configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "view-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "view-config")]
    Json(serde_json::Error),
    /// Geometry rejected by the viewport.
    Viewport(ViewportError),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "view-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "view-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Viewport(e) => write!(f, "invalid viewport: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "view-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "view-config")]
            Self::Json(e) => Some(e),
            Self::Viewport(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
