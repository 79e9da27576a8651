use std::io;
use thiserror::Error;

/// Failure to install the global keyboard hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("permission denied installing keyboard hook: {0}")]
    PermissionDenied(String),
    #[error("keyboard hook failed to start: {0}")]
    ListenFailed(String),
    #[error("could not spawn keyboard hook thread: {0}")]
    ThreadSpawn(String),
}

#[derive(Debug, Error)]
pub enum TexpandError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Keyboard controller error: {0}")]
    Enigo(String),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("Database not found at: {0}")]
    DatabaseNotFound(String),
    #[error("Snippet '{0}' not found")]
    SnippetNotFound(String),
    #[error("Daemon is not running")]
    DaemonNotRunning,
    #[error("Invalid PID in daemon file")]
    InvalidPid,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid trigger pattern: {0}")]
    InvalidPattern(String),
    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TexpandError>;
