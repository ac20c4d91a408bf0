//! Error types for launching the dialog and post-processing its result

use rmcp::ErrorData as McpError;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of one dialog round trip
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The handoff path could not be reserved
    #[error("Failed to reserve handoff file: {0}")]
    Reserve(#[source] std::io::Error),

    /// The dialog process could not be started
    #[error("Failed to start feedback UI '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the dialog process failed
    #[error("Failed to wait for feedback UI: {0}")]
    Wait(#[source] std::io::Error),

    /// The dialog exited abnormally
    #[error("Feedback UI exited with code {}{}", display_code(.code), display_stderr(.stderr))]
    Exited { code: Option<i32>, stderr: String },

    /// Clean exit but no handoff file to read
    #[error("Feedback UI produced no result at {path}: {source}")]
    HandoffMissing {
        path: PathBuf,
        #[source]
        source: feedback_core::Error,
    },

    /// Clean exit but the handoff file is not a valid result (possibly truncated)
    #[error("Feedback UI wrote an unreadable result at {path}: {source}")]
    HandoffCorrupt {
        path: PathBuf,
        #[source]
        source: feedback_core::Error,
    },

    /// The calling request was cancelled while the dialog was open
    #[error("Feedback request cancelled")]
    Cancelled,
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn display_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Failures surfaced to the agent by the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// An image in the result is not valid base64
    #[error("Image #{index} in feedback result is not valid base64: {source}")]
    InvalidImage {
        index: usize,
        #[source]
        source: feedback_core::Error,
    },

    /// A decoded image could not be written to the scratch directory
    #[error("Failed to save screenshot to {path}: {source}")]
    Materialize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GatewayError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Launch(LaunchError::Cancelled))
    }
}

impl From<GatewayError> for McpError {
    fn from(err: GatewayError) -> Self {
        let data = match &err {
            GatewayError::Launch(LaunchError::Exited { code, stderr }) => {
                json!({"exit_code": code, "stderr": stderr})
            }
            GatewayError::Launch(LaunchError::Spawn { program, source }) => {
                json!({"program": program.display().to_string(), "error": source.to_string()})
            }
            GatewayError::Launch(LaunchError::Cancelled) => {
                json!({"code": -32001, "reason": "cancelled"})
            }
            GatewayError::InvalidImage { index, .. } => json!({"image_index": index}),
            GatewayError::Materialize { path, .. } => {
                json!({"path": path.display().to_string()})
            }
            _ => json!({"error": err.to_string()}),
        };
        McpError::internal_error(err.to_string(), Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exited_display_contains_code_and_stderr() {
        let err = LaunchError::Exited {
            code: Some(7),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Feedback UI exited with code 7: boom");
    }

    #[test]
    fn test_exited_display_without_stderr() {
        let err = LaunchError::Exited {
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "Feedback UI exited with code 2");
    }

    #[test]
    fn test_exited_by_signal_has_unknown_code() {
        let err = LaunchError::Exited {
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_mcp_error_carries_exit_data() {
        let err = GatewayError::from(LaunchError::Exited {
            code: Some(7),
            stderr: "boom".to_string(),
        });
        let mcp: McpError = err.into();
        assert!(mcp.message.contains("7"));
        assert!(mcp.message.contains("boom"));
        let data = mcp.data.unwrap();
        assert_eq!(data["exit_code"], 7);
        assert_eq!(data["stderr"], "boom");
    }

    #[test]
    fn test_cancelled_detection() {
        assert!(GatewayError::from(LaunchError::Cancelled).is_cancelled());
        assert!(!GatewayError::from(LaunchError::Wait(std::io::Error::other("x"))).is_cancelled());
    }
}
