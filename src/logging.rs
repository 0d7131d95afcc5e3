use anyhow::{anyhow, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub enum LogTarget {
    /// Command-line use: warnings and errors go to stderr.
    Stderr,
    /// TUI use: stderr would draw over the screen, so append to a file.
    File(PathBuf),
}

pub fn default_log_path() -> PathBuf {
    let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home_dir).join(".taskmaster.log")
}

/// Level used when `RUST_LOG` is unset. Stderr stays quiet so command
/// output is not mixed with info records.
fn default_level(target: &LogTarget) -> &'static str {
    match target {
        LogTarget::Stderr => "warn",
        LogTarget::File(_) => "info",
    }
}

fn env_filter(target: &LogTarget) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(target)))
}

/// Installs the subscriber that receives the `log` macros. `RUST_LOG`
/// overrides the default level.
pub fn init(target: LogTarget) -> Result<()> {
    let filter = env_filter(&target);
    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow!("failed to start logging: {}", e))
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("failed to start logging to {}: {}", path.display(), e))
        }
    }
}
