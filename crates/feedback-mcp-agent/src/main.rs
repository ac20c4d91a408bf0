use anyhow::Result;
use clap::Parser;
use interactive_feedback_mcp::{
    child_process, logging, Args, DialogLauncher, FeedbackGateway, FeedbackServer,
};
use rmcp::{transport::stdio, ServiceExt};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init_logging(&args.log_level, args.log_dir.as_deref());

    let launcher_config = args.launcher_config();
    info!(
        "Starting interactive-feedback-mcp {} (dialog: {}, heartbeat: {}s)",
        env!("CARGO_PKG_VERSION"),
        launcher_config.ui_program.display(),
        launcher_config.heartbeat_interval.as_secs()
    );

    let gateway = FeedbackGateway::new(
        DialogLauncher::new(launcher_config),
        args.gateway_config(),
    );
    let service = FeedbackServer::new(gateway)
        .serve(stdio())
        .await
        .inspect_err(|e| error!("Failed to start MCP server: {:?}", e))?;

    let quit_reason = service.waiting().await;

    child_process::kill_all();

    match quit_reason {
        Ok(reason) => info!("MCP server stopped: {:?}", reason),
        Err(e) => error!("MCP server task failed: {}", e),
    }
    Ok(())
}
