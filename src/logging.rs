use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ProjectPaths;

const MAX_LOG_SIZE: u64 = 1024 * 1024; // 1MB

/// Default filter for a `-d` count: info, then debug, then trace.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize file logging for a component.
///
/// The terminal belongs to the UI, so nothing is written to stdout. `RUST_LOG`
/// overrides the level picked from `verbosity`.
///
/// Returns the log path and a guard that must be kept alive for the duration
/// of the program.
pub fn init_logging(component_name: &str, verbosity: u8) -> io::Result<(PathBuf, WorkerGuard)> {
    let log_dir = get_log_directory()?;
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(format!("{}.log", component_name));
    truncate_if_needed(&log_path)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let (non_blocking_file, guard) = tracing_appender::non_blocking(BufWriter::new(file));

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    tracing::info!("Logging to file: {}", log_path.display());
    Ok((log_path, guard))
}

fn get_log_directory() -> io::Result<PathBuf> {
    let proj_paths = ProjectPaths::new("soiree")
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Failed to find home directory"))?;

    Ok(proj_paths.log_dir())
}

/// Truncate log file if it exceeds MAX_LOG_SIZE.
fn truncate_if_needed(log_path: &Path) -> io::Result<()> {
    if log_path.exists() && fs::metadata(log_path)?.len() > MAX_LOG_SIZE {
        File::create(log_path)?;
    }
    Ok(())
}
