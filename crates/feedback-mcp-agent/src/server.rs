use crate::error::GatewayError;
use crate::gateway::{FeedbackGateway, FeedbackRequest};
use crate::progress::McpProgress;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{tool, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InteractiveFeedbackArgs {
    #[schemars(description = "The specific question for the user")]
    pub message: String,

    #[serde(default, deserialize_with = "lenient_options")]
    #[schemars(description = "Predefined options for the user to choose from (optional)")]
    pub predefined_options: Option<Vec<String>>,
}

impl InteractiveFeedbackArgs {
    pub fn into_request(self) -> FeedbackRequest {
        FeedbackRequest::new(self.message, self.predefined_options.unwrap_or_default())
    }
}

/// Accept a list of strings; anything else (null, a bare string, an object) means no options.
fn lenient_options<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
        ),
        _ => None,
    })
}

/// MCP server exposing the `interactive_feedback` tool
#[derive(Clone)]
pub struct FeedbackServer {
    gateway: Arc<FeedbackGateway>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FeedbackServer {
    pub fn new(gateway: FeedbackGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Request interactive feedback from the user. Supports text and screenshot responses. Blocks until the user submits or closes the feedback dialog; progress is reported while waiting."
    )]
    pub async fn interactive_feedback(
        &self,
        Parameters(args): Parameters<InteractiveFeedbackArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let request = args.into_request();
        info!(
            "[interactive_feedback] Asking user ({} chars, {} option(s))",
            request.message.chars().count(),
            request.predefined_options.len()
        );

        let sink = McpProgress::new(context.peer.clone(), context.meta.get_progress_token());
        let response = self
            .gateway
            .request_feedback(&request, &sink, &context.ct)
            .await
            .map_err(|e: GatewayError| {
                if e.is_cancelled() {
                    info!("[interactive_feedback] Cancelled by client");
                } else {
                    warn!("[interactive_feedback] Failed: {}", e);
                }
                McpError::from(e)
            })?;

        response.into_call_tool_result()
    }
}

// Manual implementation instead of #[tool_handler] to log every tool call
impl ServerHandler for FeedbackServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_logging()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(crate::prompt::get_server_instructions()),
        }
    }

    async fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        use rmcp::handler::server::tool::ToolCallContext;

        let tool_name = request.name.to_string();
        let start_time = std::time::Instant::now();

        let tcc = ToolCallContext::new(self, request, context);
        let result = self.tool_router.call(tcc).await;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        match &result {
            Ok(call_result) => info!(
                tool = %tool_name,
                duration_ms,
                "Tool call completed with {} content item(s)",
                call_result.content.len()
            ),
            Err(e) => warn!(
                tool = %tool_name,
                duration_ms,
                "Tool call failed: {}",
                e.message
            ),
        }

        result
    }

    async fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<rmcp::model::ListToolsResult, McpError> {
        Ok(rmcp::model::ListToolsResult::with_all_items(
            self.tool_router.list_all(),
        ))
    }
}
