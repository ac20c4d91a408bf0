//! Request gateway: one feedback round per call, from request to agent response.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::launcher::DialogLauncher;
use crate::progress::ProgressSink;
use feedback_core::image_codec::{decode_base64, encode_base64, is_png};
use feedback_core::FeedbackResult;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData as McpError;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A request for human feedback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub message: String,
    /// Shown as checkboxes in this order; duplicates are kept
    pub predefined_options: Vec<String>,
}

impl FeedbackRequest {
    pub fn new(message: impl Into<String>, predefined_options: Vec<String>) -> Self {
        Self {
            message: message.into(),
            predefined_options,
        }
    }
}

/// A decoded screenshot and the scratch file it was saved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedImage {
    pub png: Vec<u8>,
    pub path: PathBuf,
}

/// Value returned to the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponse {
    TextOnly(String),
    TextWithImages {
        /// Feedback text followed by the list of saved screenshot paths
        text: String,
        images: Vec<MaterializedImage>,
    },
}

impl AgentResponse {
    pub fn text(&self) -> &str {
        match self {
            Self::TextOnly(text) => text,
            Self::TextWithImages { text, .. } => text,
        }
    }

    /// Convert to MCP tool content.
    ///
    /// Text-only answers are a JSON object `{"interactive_feedback": ...}`;
    /// answers with images are the text followed by one PNG image per screenshot.
    pub fn into_call_tool_result(self) -> Result<CallToolResult, McpError> {
        match self {
            Self::TextOnly(text) => Ok(CallToolResult::success(vec![Content::json(
                json!({ "interactive_feedback": text }),
            )?])),
            Self::TextWithImages { text, images } => {
                let mut contents = Vec::with_capacity(images.len() + 1);
                contents.push(Content::text(text));
                for image in images {
                    contents.push(Content::image(encode_base64(&image.png), "image/png"));
                }
                Ok(CallToolResult::success(contents))
            }
        }
    }
}

/// Append the list of saved screenshot paths to the feedback text
pub fn annotate_with_paths(text: &str, paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return text.to_string();
    }
    let listed = paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    format!("{text}\n\n[Screenshots saved to:\n{listed}]")
}

/// Scratch file name for image `index` of run `run_id`
pub fn image_file_name(run_id: &str, index: usize) -> String {
    format!("mcp_feedback_{run_id}_{index}.png")
}

/// Orchestrates one feedback round per call. Holds no per-call state.
#[derive(Debug, Clone)]
pub struct FeedbackGateway {
    launcher: DialogLauncher,
    config: GatewayConfig,
}

impl FeedbackGateway {
    pub fn new(launcher: DialogLauncher, config: GatewayConfig) -> Self {
        Self { launcher, config }
    }

    pub fn launcher(&self) -> &DialogLauncher {
        &self.launcher
    }

    /// Show the dialog, wait for the human and build the agent response.
    ///
    /// Never retries: a failed round is reported once.
    pub async fn request_feedback(
        &self,
        request: &FeedbackRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<AgentResponse, GatewayError> {
        let result = self.launcher.launch(request, sink, cancel).await?;
        self.build_response(result)
    }

    /// Turn a dialog result into the agent response, materializing screenshots
    pub fn build_response(&self, result: FeedbackResult) -> Result<AgentResponse, GatewayError> {
        let FeedbackResult {
            interactive_feedback,
            images,
        } = result;

        if images.is_empty() {
            return Ok(AgentResponse::TextOnly(interactive_feedback));
        }

        let decoded = images
            .iter()
            .enumerate()
            .map(|(index, data)| {
                decode_base64(data).map_err(|source| GatewayError::InvalidImage { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let run_id = Uuid::new_v4().simple().to_string();
        let images = materialize_images(&self.config.scratch_dir, &run_id, decoded)?;
        let paths: Vec<PathBuf> = images.iter().map(|i| i.path.clone()).collect();
        info!(
            "[gateway] Saved {} screenshot(s) for run {}",
            images.len(),
            run_id
        );

        Ok(AgentResponse::TextWithImages {
            text: annotate_with_paths(&interactive_feedback, &paths),
            images,
        })
    }
}

/// Write each decoded image to `<dir>/mcp_feedback_<run_id>_<index>.png`.
///
/// Files are created with create-new semantics so an existing file is never overwritten.
pub fn materialize_images(
    dir: &Path,
    run_id: &str,
    decoded: Vec<Vec<u8>>,
) -> Result<Vec<MaterializedImage>, GatewayError> {
    std::fs::create_dir_all(dir).map_err(|source| GatewayError::Materialize {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut images = Vec::with_capacity(decoded.len());
    for (index, png) in decoded.into_iter().enumerate() {
        if !is_png(&png) {
            warn!("[gateway] Image #{} does not carry a PNG signature", index);
        }
        let path = dir.join(image_file_name(run_id, index));
        let write = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut f| f.write_all(&png));
        if let Err(source) = write {
            return Err(GatewayError::Materialize { path, source });
        }
        debug!("[gateway] Wrote {} ({} bytes)", path.display(), png.len());
        images.push(MaterializedImage { png, path });
    }
    Ok(images)
}
