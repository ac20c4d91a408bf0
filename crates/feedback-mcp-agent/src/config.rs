//! Command-line and environment configuration for the MCP server

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// File name of the dialog binary shipped next to the server
pub const UI_BINARY_NAME: &str = "interactive-feedback-ui";

pub const DEFAULT_HEARTBEAT_SECS: u64 = 15;
pub const DEFAULT_PROGRESS_HORIZON_SECS: u64 = 600;

#[derive(Parser, Debug, Clone)]
#[command(name = "interactive-feedback-mcp")]
#[command(about = "MCP server that asks a human for feedback through a desktop dialog")]
pub struct Args {
    /// Path to the feedback dialog executable
    #[arg(long, env = "INTERACTIVE_FEEDBACK_UI")]
    pub ui_binary: Option<PathBuf>,

    /// Seconds between progress heartbeats while the dialog is open
    #[arg(long, env = "INTERACTIVE_FEEDBACK_HEARTBEAT_SECS", default_value_t = DEFAULT_HEARTBEAT_SECS)]
    pub heartbeat_secs: u64,

    /// Seconds added to the elapsed time to form the reported progress total
    #[arg(long, default_value_t = DEFAULT_PROGRESS_HORIZON_SECS)]
    pub progress_horizon_secs: u64,

    /// Directory for saved screenshot files (defaults to the system temp dir)
    #[arg(long, env = "INTERACTIVE_FEEDBACK_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Directory for transient handoff files (defaults to the system temp dir)
    #[arg(long)]
    pub handoff_dir: Option<PathBuf>,

    /// Log level filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write daily-rotated log files to this directory
    #[arg(long, env = "INTERACTIVE_FEEDBACK_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Args {
    pub fn launcher_config(&self) -> LauncherConfig {
        LauncherConfig {
            ui_program: self.ui_binary.clone().unwrap_or_else(default_ui_program),
            ui_args: Vec::new(),
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs.max(1)),
            progress_horizon: Duration::from_secs(self.progress_horizon_secs),
            handoff_dir: self.handoff_dir.clone(),
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            scratch_dir: self
                .scratch_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
        }
    }
}

/// How the dialog process is started and supervised
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Dialog executable
    pub ui_program: PathBuf,
    /// Arguments placed before the feedback arguments (wrappers, interpreters)
    pub ui_args: Vec<String>,
    pub heartbeat_interval: Duration,
    pub progress_horizon: Duration,
    /// Where handoff files are reserved; `None` means the system temp dir
    pub handoff_dir: Option<PathBuf>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            ui_program: default_ui_program(),
            ui_args: Vec::new(),
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            progress_horizon: Duration::from_secs(DEFAULT_PROGRESS_HORIZON_SECS),
            handoff_dir: None,
        }
    }
}

/// Where decoded screenshots are written
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub scratch_dir: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Locate the dialog binary: next to the current executable, then on PATH,
/// then the bare name so spawning reports a clear error.
pub fn default_ui_program() -> PathBuf {
    let file_name = format!("{UI_BINARY_NAME}{}", std::env::consts::EXE_SUFFIX);

    if let Some(sibling) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
        .filter(|p| p.is_file())
    {
        return sibling;
    }

    find_on_path(&file_name).unwrap_or_else(|| PathBuf::from(file_name))
}

fn find_on_path(file_name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}
