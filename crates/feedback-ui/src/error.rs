use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum DialogError {
    #[error("Feedback session already {0}")]
    AlreadyFinished(SessionState),

    #[error("Failed to encode screenshot #{index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: feedback_core::Error,
    },

    #[error("Failed to read image {path}: {source}")]
    ImageFile {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),

    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("Failed to access window settings at {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dialog window failed: {0}")]
    Window(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DialogError>;
