mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, StatsConfig, TimerDefaults};
pub use database::{DailyStat, Database, FocusEvent, SessionRecord, UserRecord};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/tomoro[-dev]/` based on TOMORO_ENV.
///
/// Set TOMORO_ENV=dev to use the development data directory, or
/// TOMORO_DATA_DIR to point somewhere else entirely (tests, containers).
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TOMORO_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
            path: dir.clone(),
            message: e.to_string(),
        })?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TOMORO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tomoro-dev")
    } else {
        base_dir.join("tomoro")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
