//! Log dispatch setup.
//!
//! Every module logs through the `log` macros; this wires them to stderr and, when
//! enabled in the configuration, to a log file.

use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;
use std::path::PathBuf;

use crate::config::LoggingConfig;

/// Build the dispatcher described by `config` without installing it.
pub fn build_dispatch(config: &LoggingConfig) -> Result<fern::Dispatch> {
    let level: LevelFilter = config
        .level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // sqlx/sea-orm are chatty at info
        .level_for("sqlx", LevelFilter::Warn)
        .level_for("sea_orm", LevelFilter::Warn)
        .chain(std::io::stderr());

    if config.enabled {
        let path = match &config.file {
            Some(path) => path.clone(),
            None => get_log_file_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = fern::log_file(&path).with_context(|| format!("Failed to open log file: {}", path.display()))?;
        dispatch = dispatch.chain(file);
    }

    Ok(dispatch)
}

/// Install the global logger. Only the first call in a process succeeds.
pub fn init(config: &LoggingConfig) -> Result<()> {
    build_dispatch(config)?
        .apply()
        .context("A global logger is already installed")?;
    Ok(())
}

/// Default log file location
pub fn get_log_file_path() -> Result<PathBuf> {
    dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
        .map(|dir| dir.join("prodflow").join("prodflow.log"))
}
