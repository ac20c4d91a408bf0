//! Dialog launcher: spawns the feedback dialog as a separate process, waits for
//! it in heartbeat slices and reads back its result from the handoff file.
//!
//! Data flows through exactly two channels:
//! 1. Command-line arguments (server -> dialog)
//! 2. The handoff file (dialog -> server)
//!
//! stdout/stderr are captured for diagnostics only and never parsed.

use crate::child_process;
use crate::config::LauncherConfig;
use crate::error::LaunchError;
use crate::gateway::FeedbackRequest;
use crate::progress::ProgressSink;
use feedback_core::{join_options, read_result, remove_handoff, FeedbackResult};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound for collecting the dialog's output after it exited
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Reserved handoff path, removed when dropped.
///
/// Every exit path (success, failure, cancellation, dropped future) leaves no
/// file behind.
#[derive(Debug)]
pub struct HandoffFile {
    path: PathBuf,
}

impl HandoffFile {
    /// Reserve a fresh, uniquely named handoff file in `dir` (or the temp dir)
    pub fn reserve(dir: Option<&Path>) -> Result<Self, LaunchError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("feedback_").suffix(".json");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(LaunchError::Reserve)?;

        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| LaunchError::Reserve(e.error))?;
        debug!("[launcher] Reserved handoff file {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the dialog's result. The file is removed whether parsing succeeds or not.
    pub fn consume(self) -> Result<FeedbackResult, LaunchError> {
        read_result(&self.path).map_err(|source| {
            if source.is_not_found() {
                LaunchError::HandoffMissing {
                    path: self.path.clone(),
                    source,
                }
            } else {
                LaunchError::HandoffCorrupt {
                    path: self.path.clone(),
                    source,
                }
            }
        })
    }
}

impl Drop for HandoffFile {
    fn drop(&mut self) {
        match remove_handoff(&self.path) {
            Ok(()) => debug!("[launcher] Removed handoff file {}", self.path.display()),
            Err(e) => warn!("[launcher] Failed to remove handoff file: {}", e),
        }
    }
}

/// A running dialog process with its output being drained in the background
pub struct DialogProcess {
    child: Child,
    pid: Option<u32>,
    stdout_task: JoinHandle<Vec<u8>>,
    stderr_task: JoinHandle<Vec<u8>>,
}

/// Captured output of a finished dialog
#[derive(Debug, Default)]
pub struct DialogOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl DialogOutput {
    /// stderr decoded lossily and trimmed
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

enum WaitSlice {
    Exited(std::io::Result<ExitStatus>),
    Heartbeat,
    Cancelled,
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!("[launcher] Stopped reading dialog output: {}", e);
            }
        }
        buf
    })
}

impl DialogProcess {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the dialog to exit in slices of `interval`.
    ///
    /// Each slice that ends with the dialog still open advances the elapsed
    /// counter and reports `(elapsed, elapsed + horizon)` to `sink`. Cancelling
    /// `cancel` kills the dialog and returns [`LaunchError::Cancelled`].
    pub async fn wait_with_heartbeat(
        &mut self,
        interval: Duration,
        horizon: Duration,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExitStatus, LaunchError> {
        let mut elapsed = Duration::ZERO;
        loop {
            let slice = tokio::select! {
                biased;
                _ = cancel.cancelled() => WaitSlice::Cancelled,
                waited = tokio::time::timeout(interval, self.child.wait()) => match waited {
                    Ok(result) => WaitSlice::Exited(result),
                    Err(_) => WaitSlice::Heartbeat,
                },
            };

            match slice {
                WaitSlice::Exited(result) => {
                    let status = result.map_err(LaunchError::Wait)?;
                    info!(
                        "[launcher] Dialog exited with {} after ~{}s",
                        status,
                        elapsed.as_secs()
                    );
                    return Ok(status);
                }
                WaitSlice::Heartbeat => {
                    elapsed += interval;
                    debug!(
                        "[launcher] Dialog still open ({}s elapsed)",
                        elapsed.as_secs()
                    );
                    sink.report(elapsed, elapsed + horizon).await;
                }
                WaitSlice::Cancelled => {
                    warn!(
                        "[launcher] Request cancelled after ~{}s, closing dialog",
                        elapsed.as_secs()
                    );
                    self.terminate().await;
                    return Err(LaunchError::Cancelled);
                }
            }
        }
    }

    /// Kill the dialog and reap it
    pub async fn terminate(&mut self) {
        if let Err(e) = self.child.kill().await {
            debug!("[launcher] Kill failed (dialog likely already exited): {}", e);
        }
        if let Some(pid) = self.pid.take() {
            child_process::unregister(pid);
        }
    }

    /// Collect captured stdout/stderr once the dialog has exited
    pub async fn collect_output(&mut self) -> DialogOutput {
        let stdout = collect(&mut self.stdout_task).await;
        let stderr = collect(&mut self.stderr_task).await;
        if !stdout.is_empty() {
            debug!(
                "[launcher] Dialog stdout: {}",
                String::from_utf8_lossy(&stdout).trim()
            );
        }
        DialogOutput { stdout, stderr }
    }
}

async fn collect(task: &mut JoinHandle<Vec<u8>>) -> Vec<u8> {
    match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, task).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            debug!("[launcher] Output reader task failed: {}", e);
            Vec::new()
        }
        Err(_) => {
            debug!("[launcher] Timed out collecting dialog output");
            Vec::new()
        }
    }
}

impl Drop for DialogProcess {
    fn drop(&mut self) {
        // kill_on_drop takes care of the process itself
        if let Some(pid) = self.pid.take() {
            child_process::unregister(pid);
        }
        self.stdout_task.abort();
        self.stderr_task.abort();
    }
}

/// Starts and supervises feedback dialogs
#[derive(Debug, Clone)]
pub struct DialogLauncher {
    config: LauncherConfig,
}

impl DialogLauncher {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Arguments passed to the dialog after any configured leading arguments
    pub fn dialog_args(request: &FeedbackRequest, handoff: &Path) -> Vec<String> {
        vec![
            "--prompt".to_string(),
            request.message.clone(),
            "--predefined-options".to_string(),
            join_options(&request.predefined_options),
            "--output-file".to_string(),
            handoff.to_string_lossy().to_string(),
        ]
    }

    /// Start the dialog for `request`, writing its result to `handoff`
    pub fn spawn(
        &self,
        request: &FeedbackRequest,
        handoff: &Path,
    ) -> Result<DialogProcess, LaunchError> {
        let program = &self.config.ui_program;
        let mut cmd = Command::new(program);
        cmd.args(&self.config.ui_args)
            .args(Self::dialog_args(request, handoff))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;

        let pid = child.id();
        if let Some(pid) = pid {
            child_process::register(pid, handoff.to_path_buf());
        }
        info!(
            "[launcher] Started dialog {} (pid {:?}, {} option(s))",
            program.display(),
            pid,
            request.predefined_options.len()
        );

        let stdout_task = drain(child.stdout.take());
        let stderr_task = drain(child.stderr.take());

        Ok(DialogProcess {
            child,
            pid,
            stdout_task,
            stderr_task,
        })
    }

    /// Run one full feedback round: reserve, spawn, wait with heartbeats, read back.
    pub async fn launch(
        &self,
        request: &FeedbackRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<FeedbackResult, LaunchError> {
        let started = Instant::now();
        let handoff = HandoffFile::reserve(self.config.handoff_dir.as_deref())?;
        let mut process = self.spawn(request, handoff.path())?;

        let status = process
            .wait_with_heartbeat(
                self.config.heartbeat_interval,
                self.config.progress_horizon,
                sink,
                cancel,
            )
            .await?;
        let output = process.collect_output().await;
        drop(process);

        if !status.success() {
            let stderr = output.stderr_text();
            warn!(
                "[launcher] Dialog failed with code {:?}: {}",
                status.code(),
                stderr
            );
            return Err(LaunchError::Exited {
                code: status.code(),
                stderr,
            });
        }

        let result = handoff.consume()?;
        info!(
            "[launcher] Feedback received in {:?} ({} chars, {} image(s))",
            started.elapsed(),
            result.interactive_feedback.chars().count(),
            result.images.len()
        );
        Ok(result)
    }
}
