use crate::keyboard_listener::InputTap;
use crate::permissions::check_input_permissions;
use crate::process::{terminate_process, verify_process_running};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use texpand_core::config::{
    ensure_config_dir, get_config_file_path, get_log_file_path, get_pid_file_path, load_config,
};
use texpand_core::{
    is_daemon_running, system_services, Engine, HookError, Result, SnippetStore, TexpandError,
};
use tracing::{debug, error, info, warn};

/// How often the worker checks the snippet and config files for edits
const RELOAD_INTERVAL: Duration = Duration::from_secs(1);

/// Start the daemon process
pub fn start_daemon() -> Result<()> {
    if let Some(pid) = is_daemon_running()? {
        if verify_process_running(pid) {
            println!("Daemon is already running with PID {}.", pid);
            return Ok(());
        }
        // PID file exists but process is not running - clean up and restart
        println!("Found stale PID file. Cleaning up and starting new daemon...");
        let _ = fs::remove_file(get_pid_file_path());
    }

    println!("Starting texpand daemon...");
    ensure_config_dir()?;
    check_input_permissions()?;

    let log_file = get_log_file_path();
    spawn_detached_worker(&log_file)?;

    // Wait for the daemon to start and create its PID file
    for _ in 0..20 {
        thread::sleep(Duration::from_millis(100));
        if is_daemon_running()?.is_some() {
            break;
        }
    }

    match is_daemon_running()? {
        Some(pid) if verify_process_running(pid) => {
            println!("Daemon started successfully with PID {}.", pid);
            Ok(())
        }
        _ => Err(TexpandError::Other(format!(
            "Daemon failed to start. Check logs at {}",
            log_file.display()
        ))),
    }
}

#[cfg(unix)]
fn spawn_detached_worker(log_file: &Path) -> Result<()> {
    let current_exe = std::env::current_exe()?;
    let cmd = format!(
        "nohup \"{}\" daemon-worker > \"{}\" 2>&1 &",
        current_exe.display(),
        log_file.display()
    );

    process::Command::new("sh").arg("-c").arg(&cmd).status()?;
    Ok(())
}

#[cfg(windows)]
fn spawn_detached_worker(log_file: &Path) -> Result<()> {
    let current_exe = std::env::current_exe()?;
    let cmd = format!(
        "START /B \"texpand daemon\" \"{}\" daemon-worker > \"{}\" 2>&1",
        current_exe.display(),
        log_file.display()
    );

    process::Command::new("cmd").arg("/C").arg(&cmd).status()?;
    Ok(())
}

/// Stop the daemon if it's running
pub fn stop_daemon() -> Result<()> {
    let pid_file = get_pid_file_path();
    if !pid_file.exists() {
        return Err(TexpandError::DaemonNotRunning);
    }

    let pid = match fs::read_to_string(&pid_file) {
        Ok(content) => match content.trim().parse::<u32>() {
            Ok(pid) => pid,
            Err(_) => {
                let _ = fs::remove_file(&pid_file);
                return Err(TexpandError::InvalidPid);
            }
        },
        Err(e) => {
            let _ = fs::remove_file(&pid_file);
            return Err(TexpandError::Other(format!("Failed to read PID file: {}", e)));
        }
    };

    println!("Attempting to stop daemon with PID {}...", pid);

    if !verify_process_running(pid) {
        println!("Process with PID {} is not running.", pid);
        let _ = fs::remove_file(&pid_file);
        return Ok(());
    }

    if terminate_process(pid, false) {
        println!("Sent termination signal to daemon with PID {}", pid);
    }

    thread::sleep(Duration::from_millis(500));
    if verify_process_running(pid) {
        println!("Daemon didn't terminate gracefully, using force kill...");
        if !terminate_process(pid, true) {
            println!("WARNING: Failed to stop daemon process. PID file will be removed anyway.");
        }
    }

    let _ = fs::remove_file(&pid_file);
    println!("Daemon stopped successfully.");
    Ok(())
}

/// Check daemon status
pub fn daemon_status() -> Result<()> {
    match is_daemon_running()? {
        Some(pid) if verify_process_running(pid) => {
            println!("texpand daemon is running with PID {}", pid);
            println!("Log file: {}", get_log_file_path().display());
        }
        Some(pid) => {
            println!("PID file exists but process {} is not running", pid);
            println!("This could indicate the daemon crashed or was stopped abruptly");
            println!("Recommend running 'texpand stop' followed by 'texpand start'");
        }
        None => println!("texpand daemon is not running"),
    }
    Ok(())
}

/// Tracks a file's modification time between polls
#[derive(Debug)]
pub struct ModifiedWatch {
    path: PathBuf,
    last: Option<SystemTime>,
}

impl ModifiedWatch {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last = modified_time(&path);
        Self { path, last }
    }

    /// True once per observed change, including the file appearing
    pub fn changed(&mut self) -> bool {
        let current = modified_time(&self.path);
        if current.is_some() && current != self.last {
            self.last = current;
            return true;
        }
        false
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// The daemon worker: builds the engine, hooks the keyboard and keeps the
/// trigger set in sync with the snippet file. Returns only on error.
pub fn run_daemon_worker() -> Result<()> {
    let store = Arc::new(SnippetStore::open_default()?);
    let config = load_config()?;
    info!(
        delay_ms = config.trigger_delay_ms,
        buffer = config.max_buffer_size,
        "Starting expansion engine"
    );

    let engine = Arc::new(Engine::new(config, system_services(store.clone()))?);
    let count = engine.reload(store.as_ref())?;
    info!(triggers = count, "Loaded snippets");

    let mut tap = InputTap::new(Arc::clone(&engine));
    tap.start()?;

    let mut snippets_watch = ModifiedWatch::new(store.path());
    let mut config_watch = ModifiedWatch::new(get_config_file_path());

    loop {
        thread::sleep(RELOAD_INTERVAL);

        if !tap.is_active() {
            tap.wait();
            return Err(HookError::ListenFailed("keyboard listener stopped".to_string()).into());
        }

        if snippets_watch.changed() {
            match engine.reload(store.as_ref()) {
                Ok(count) => info!(triggers = count, "Reloaded snippets"),
                Err(e) => warn!("Keeping previous snippets, reload failed: {}", e),
            }
        }

        if config_watch.changed() {
            match load_config().and_then(|config| engine.update_config(config)) {
                Ok(()) => info!("Applied updated config"),
                Err(e) => warn!("Keeping previous config: {}", e),
            }
        }
    }
}

/// This function runs as a separate daemon process
pub fn daemon_worker_entry() -> Result<()> {
    let pid_file = get_pid_file_path();
    let mut file = File::create(&pid_file)?;
    write!(file, "{}", process::id())?;
    debug!(pid = process::id(), "Wrote PID file");

    let result = run_daemon_worker();
    if let Err(e) = &result {
        error!("Daemon worker exited: {}", e);
    }

    // Clean up PID file on exit
    let _ = fs::remove_file(&pid_file);
    result
}

#[cfg(test)]
#[path = "daemon_manager_test.rs"]
mod tests;
