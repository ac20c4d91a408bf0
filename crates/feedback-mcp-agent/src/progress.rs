//! Liveness reporting while the human is answering
//!
//! The launcher reports `(elapsed, elapsed + horizon)` on every heartbeat. The
//! total is a moving horizon, not an estimate; it only tells the client that the
//! tool call is alive so its own timeout does not fire.

use async_trait::async_trait;
use rmcp::model::{
    LoggingLevel, LoggingMessageNotificationParam, ProgressNotificationParam, ProgressToken,
};
use rmcp::service::{Peer, RoleServer};
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, elapsed: Duration, total: Duration);
}

/// Sink that drops every report
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn report(&self, _elapsed: Duration, _total: Duration) {}
}

/// Sink that keeps every report, for inspection after the wait
#[derive(Default)]
pub struct RecordingProgress {
    reports: Mutex<Vec<(Duration, Duration)>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(Duration, Duration)> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProgressSink for RecordingProgress {
    async fn report(&self, elapsed: Duration, total: Duration) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push((elapsed, total));
        }
    }
}

pub fn waiting_message(elapsed: Duration) -> String {
    format!("Waiting for user feedback... ({}s)", elapsed.as_secs())
}

/// Reports heartbeats to the MCP client that issued the tool call.
///
/// Progress notifications need the caller's progress token; the status log
/// message is sent regardless.
pub struct McpProgress {
    peer: Peer<RoleServer>,
    progress_token: Option<ProgressToken>,
}

impl McpProgress {
    pub fn new(peer: Peer<RoleServer>, progress_token: Option<ProgressToken>) -> Self {
        Self {
            peer,
            progress_token,
        }
    }
}

#[async_trait]
impl ProgressSink for McpProgress {
    async fn report(&self, elapsed: Duration, total: Duration) {
        let message = waiting_message(elapsed);

        if let Some(token) = &self.progress_token {
            if let Err(e) = self
                .peer
                .notify_progress(ProgressNotificationParam {
                    progress_token: token.clone(),
                    progress: elapsed.as_secs_f64(),
                    total: Some(total.as_secs_f64()),
                    message: Some(message.clone()),
                })
                .await
            {
                debug!("[progress] Failed to send progress notification: {}", e);
            }
        }

        if let Err(e) = self
            .peer
            .notify_logging_message(LoggingMessageNotificationParam {
                level: LoggingLevel::Info,
                logger: Some("interactive_feedback".to_string()),
                data: json!({
                    "message": message,
                    "elapsed_secs": elapsed.as_secs(),
                }),
            })
            .await
        {
            debug!("[progress] Failed to send status message: {}", e);
        }
    }
}
