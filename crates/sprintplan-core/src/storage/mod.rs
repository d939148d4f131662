mod config;

pub use config::{Config, ExecutionConfig, ReportConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/sprintplan[-dev]/` based on SPRINTPLAN_ENV.
///
/// Set SPRINTPLAN_ENV=dev to use the development data directory.
/// SPRINTPLAN_HOME replaces `~/.config` as the base directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = match std::env::var_os("SPRINTPLAN_HOME") {
        Some(home) => PathBuf::from(home),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config"),
    };

    let env = std::env::var("SPRINTPLAN_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("sprintplan-dev")
    } else {
        base_dir.join("sprintplan")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
