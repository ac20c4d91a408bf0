//! Handoff file contract between the MCP server and the feedback dialog.
//!
//! The dialog writes exactly one [`FeedbackResult`] as the whole content of the
//! handoff file; the server reads it once and deletes it. No other channel
//! carries data back from the dialog process.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Payload written by the dialog on submit or close
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    /// Composed feedback text (selected options plus free text), may be empty
    #[serde(default)]
    pub interactive_feedback: String,
    /// Base64-encoded PNG images in attachment order
    #[serde(default)]
    pub images: Vec<String>,
}

impl FeedbackResult {
    pub fn new(interactive_feedback: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            interactive_feedback: interactive_feedback.into(),
            images,
        }
    }

    /// Result produced when the window is closed without submitting
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}

/// Write `result` as the entire content of `path`, replacing anything already there.
///
/// Missing parent directories are created.
pub fn write_result(path: &Path, result: &FeedbackResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let json = serde_json::to_vec(result)?;
    fs::write(path, json).map_err(|e| Error::io(path, e))?;
    debug!(
        "[handoff] Wrote result to {} ({} image(s))",
        path.display(),
        result.images.len()
    );
    Ok(())
}

/// Read and parse the handoff file at `path`
pub fn read_result(path: &Path) -> Result<FeedbackResult> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let result: FeedbackResult = serde_json::from_slice(&bytes)?;
    Ok(result)
}

/// Remove the handoff file. A file that is already gone counts as removed.
pub fn remove_handoff(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}
