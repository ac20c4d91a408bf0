//! Error types for the feedback handoff contract

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for handoff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading, writing or encoding handoff data
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem error on a specific handoff path
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The handoff payload is not a valid feedback result
    #[error("Invalid feedback result JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An attached image string is not valid base64
    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Image encoding or decoding failed
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying cause is a missing file
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
