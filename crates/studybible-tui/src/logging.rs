use anyhow::{anyhow, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STUDYBIBLE_LOG";
const DEFAULT_FILTER: &str = "info";

pub fn log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("studybible").join("studybible.log"))
}

/// Send tracing output to the log file. The terminal is drawn on stderr, so
/// nothing may be written there while the UI is up.
pub fn init() -> Result<()> {
    let Some(path) = log_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter_from(std::env::var(LOG_ENV).ok()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

fn filter_from(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
