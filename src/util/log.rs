// src/util/log.rs

//! File-backed tracing setup. The terminal belongs to the UI, so log output
//! goes to `<log_dir>/property-table-<date>.log` instead of stdout.
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use tracing_subscriber::EnvFilter;

use crate::error::{PropertyTableError, Result};

pub static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// `DEBUG=true` lowers the default level from info to debug.
pub fn debug_enabled() -> bool {
    *DEBUG_ENABLED.get_or_init(|| std::env::var("DEBUG").unwrap_or_default() == "true")
}

/// Path of today's log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    let date = Local::now().format("%Y%m%d");
    log_dir.join(format!("property-table-{}.log", date))
}

/// Install the global subscriber. `RUST_LOG` wins over the `DEBUG` default.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    create_dir_all(log_dir)?;

    let path = log_file_path(log_dir);
    let file = File::options().create(true).append(true).open(&path)?;

    let default_level = if debug_enabled() { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| PropertyTableError::ConfigError(format!("logging already initialized: {}", e)))?;

    Ok(path)
}
