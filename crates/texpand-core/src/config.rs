use crate::error::{Result, TexpandError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PID_FILENAME: &str = "texpand-daemon.pid";
pub const DB_FILENAME: &str = "snippets.json";
pub const CONFIG_FILENAME: &str = "config.json";
pub const LOG_FILENAME: &str = "daemon_log.txt";

pub const DEFAULT_TRIGGER_DELAY_MS: u64 = 300;
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 100;

/// Engine settings read from `config.json`.
///
/// The delay, secure-field gate and buffer cap are consulted on every
/// operation, so edits pushed through `Engine::update_config` apply without a
/// restart.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub trigger_delay_ms: u64,
    pub enable_in_secure_fields: bool,
    pub max_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger_delay_ms: DEFAULT_TRIGGER_DELAY_MS,
            enable_in_secure_fields: false,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_size == 0 {
            return Err(TexpandError::InvalidConfig(
                "max_buffer_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a single `key=value` edit as given on the command line.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |what: &str| {
            TexpandError::InvalidConfig(format!("'{}' is not a valid {}", value, what))
        };

        match key {
            "trigger_delay_ms" => {
                self.trigger_delay_ms = value.parse().map_err(|_| invalid("delay"))?;
            }
            "enable_in_secure_fields" => {
                self.enable_in_secure_fields = value.parse().map_err(|_| invalid("boolean"))?;
            }
            "max_buffer_size" => {
                self.max_buffer_size = value.parse().map_err(|_| invalid("buffer size"))?;
            }
            other => {
                return Err(TexpandError::InvalidConfig(format!(
                    "unknown setting '{}'",
                    other
                )))
            }
        }

        self.validate()
    }
}

/// Get the texpand configuration directory
pub fn get_config_dir() -> PathBuf {
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".texpand"))
        .unwrap_or_else(|_| PathBuf::from(".texpand"))
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    let db_path = get_db_file_path();
    if !db_path.exists() {
        create_empty_file(&db_path, "database file")?;
    }

    Ok(config_dir)
}

/// Create an empty file at the specified path
pub fn create_empty_file(path: &Path, description: &str) -> Result<()> {
    debug!(path = %path.display(), "Creating {}", description);
    fs::write(path, "")?;
    Ok(())
}

/// Get the path to the PID file
pub fn get_pid_file_path() -> PathBuf {
    get_config_dir().join(PID_FILENAME)
}

/// Get the path to the database file
pub fn get_db_file_path() -> PathBuf {
    get_config_dir().join(DB_FILENAME)
}

/// Get the path to the engine settings file
pub fn get_config_file_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILENAME)
}

/// Get the path the detached daemon writes its log to
pub fn get_log_file_path() -> PathBuf {
    get_config_dir().join(LOG_FILENAME)
}

/// Load engine settings, falling back to defaults for a missing or empty file
pub fn load_config_from(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(EngineConfig::default());
    }

    let config: EngineConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config_to(path: &Path, config: &EngineConfig) -> Result<()> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

pub fn load_config() -> Result<EngineConfig> {
    load_config_from(&get_config_file_path())
}

pub fn save_config(config: &EngineConfig) -> Result<()> {
    save_config_to(&get_config_file_path(), config)
}

/// Check if daemon is running
pub fn is_daemon_running() -> Result<Option<u32>> {
    let pid_file = get_pid_file_path();

    if pid_file.exists() {
        match fs::read_to_string(&pid_file) {
            Ok(contents) => {
                match contents.trim().parse::<u32>() {
                    Ok(pid) => Ok(Some(pid)),
                    Err(_) => {
                        // Invalid PID, treat as not running and clean up
                        let _ = fs::remove_file(&pid_file);
                        Ok(None)
                    }
                }
            }
            Err(_) => {
                let _ = fs::remove_file(&pid_file);
                Ok(None)
            }
        }
    } else {
        Ok(None)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
