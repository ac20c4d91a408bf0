//! Persisted window geometry, scoped to the dialog process

use crate::error::{DialogError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SETTINGS_DIR: &str = "interactive-feedback-mcp";
pub const SETTINGS_FILE: &str = "window.json";

pub const DEFAULT_WIDTH: f32 = 800.0;
pub const DEFAULT_HEIGHT: f32 = 650.0;
pub const MIN_WIDTH: f32 = 360.0;
pub const MIN_HEIGHT: f32 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: f32,
    pub height: f32,
    /// Outer position of the window; `None` centers it
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            x: None,
            y: None,
        }
    }
}

impl WindowSettings {
    /// `<config_dir>/interactive-feedback-mcp/window.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Load settings, falling back to defaults when the file is absent or unreadable
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                debug!("[dialog] Using default window settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| DialogError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_slice(&bytes)?;
        Ok(settings.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| DialogError::Settings {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).map_err(|source| DialogError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Clamp sizes to usable values and drop non-finite coordinates
    pub fn sanitized(self) -> Self {
        let size = |value: f32, min: f32, default: f32| {
            if value.is_finite() {
                value.max(min)
            } else {
                default
            }
        };
        let coord = |value: Option<f32>| value.filter(|v| v.is_finite());
        let (x, y) = match (coord(self.x), coord(self.y)) {
            (Some(x), Some(y)) => (Some(x), Some(y)),
            _ => (None, None),
        };
        Self {
            width: size(self.width, MIN_WIDTH, DEFAULT_WIDTH),
            height: size(self.height, MIN_HEIGHT, DEFAULT_HEIGHT),
            x,
            y,
        }
    }

    pub fn position(&self) -> Option<[f32; 2]> {
        Some([self.x?, self.y?])
    }
}
