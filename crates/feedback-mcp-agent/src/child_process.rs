//! Registry of running feedback dialog processes
//!
//! Each launched dialog registers its PID here so the server can close any
//! window still open when it shuts down. Dialogs normally unregister
//! themselves when they exit or when their request is cancelled.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct DialogProcessInfo {
    pub pid: u32,
    pub handoff_path: PathBuf,
    pub started_at: std::time::Instant,
}

static DIALOG_PROCESSES: OnceLock<RwLock<HashMap<u32, DialogProcessInfo>>> = OnceLock::new();

fn get_registry() -> &'static RwLock<HashMap<u32, DialogProcessInfo>> {
    DIALOG_PROCESSES.get_or_init(|| RwLock::new(HashMap::new()))
}

pub fn register(pid: u32, handoff_path: PathBuf) {
    let info = DialogProcessInfo {
        pid,
        handoff_path,
        started_at: std::time::Instant::now(),
    };
    if let Ok(mut registry) = get_registry().write() {
        debug!(
            "Registering dialog process PID {} (handoff: {})",
            pid,
            info.handoff_path.display()
        );
        registry.insert(pid, info);
    }
}

pub fn unregister(pid: u32) {
    if let Ok(mut registry) = get_registry().write() {
        if let Some(info) = registry.remove(&pid) {
            debug!(
                "Unregistered dialog process PID {} after {:?}",
                pid,
                info.started_at.elapsed()
            );
        }
    }
}

pub fn active_count() -> usize {
    get_registry().read().map(|r| r.len()).unwrap_or(0)
}

pub fn is_registered(pid: u32) -> bool {
    get_registry()
        .read()
        .map(|r| r.contains_key(&pid))
        .unwrap_or(false)
}

/// Kill every dialog still registered and remove their handoff files
pub fn kill_all() {
    let to_kill: Vec<DialogProcessInfo> = match get_registry().write() {
        Ok(mut r) => r.drain().map(|(_, i)| i).collect(),
        Err(e) => {
            warn!("Failed to acquire dialog process registry lock: {}", e);
            return;
        }
    };
    if to_kill.is_empty() {
        debug!("No dialog processes to clean up");
        return;
    }
    info!("Closing {} open feedback dialog(s) on shutdown", to_kill.len());
    terminate(to_kill);
}

fn terminate(to_kill: Vec<DialogProcessInfo>) {
    let pids: Vec<Pid> = to_kill.iter().map(|i| Pid::from_u32(i.pid)).collect();
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&pids), true);

    for info in to_kill {
        match system.process(Pid::from_u32(info.pid)) {
            Some(process) => {
                if process.kill() {
                    info!("Terminated dialog process PID {}", info.pid);
                } else {
                    warn!("Failed to terminate dialog process PID {}", info.pid);
                }
            }
            None => debug!("Dialog process PID {} already gone", info.pid),
        }
        if let Err(e) = feedback_core::remove_handoff(&info.handoff_path) {
            warn!("Failed to remove handoff file: {}", e);
        }
    }
}
