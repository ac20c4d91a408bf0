//! Feedback dialog shown by the interactive feedback MCP server.
//!
//! The window itself lives in [`app`]; everything the window edits is in
//! [`session::FeedbackSession`] so it can be driven without a display.

pub mod app;
pub mod args;
pub mod capture;
pub mod error;
pub mod session;
pub mod settings;

pub use args::DialogArgs;
pub use error::{DialogError, Result};
pub use session::{FeedbackSession, SessionState};
pub use settings::WindowSettings;

use feedback_core::FeedbackResult;
use std::path::Path;

/// Deliver the result: the handoff file when one was given, stdout otherwise
pub fn deliver(result: &FeedbackResult, output_file: Option<&Path>) -> anyhow::Result<()> {
    match output_file {
        Some(path) => {
            feedback_core::write_result(path, result)?;
            tracing::info!("[dialog] Wrote result to {}", path.display());
        }
        None => println!("{}", manual_summary(result)),
    }
    Ok(())
}

/// Summary printed when the dialog runs without a handoff file
pub fn manual_summary(result: &FeedbackResult) -> String {
    let mut summary = format!("Feedback received:\n{}", result.interactive_feedback);
    if result.has_images() {
        summary.push_str(&format!("\n\nScreenshots: {}", result.images.len()));
    }
    summary
}

pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
