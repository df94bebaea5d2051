//! Log output for the registry server.
//!
//! Every event goes to stdout in compact form, filtered by `RUST_LOG` (default `info`). Request
//! activity such as created or deleted ids and generator failures is also appended to a log file:
//! `STUDENT_REGISTRY_LOG_FILE` when set, otherwise `logs/student-registry.log`. Both variables are
//! read from the process environment, so `.env` must be loaded before [`init_tracing`] runs.
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "STUDENT_REGISTRY_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "student-registry.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where file logs should go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogTarget {
    /// Append to an explicitly configured file.
    File(PathBuf),
    /// Write `logs/student-registry.log`, creating the directory first.
    DefaultDir,
}

fn log_target() -> LogTarget {
    std::env::var(LOG_FILE_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map_or(LogTarget::DefaultDir, |path| LogTarget::File(path.into()))
}

/// Install the stdout layer and, when the log file can be opened, the file layer.
///
/// The file writer is non-blocking; its guard lives for the rest of the process.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    match open_file_writer(&log_target()) {
        Some(writer) => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(false)
                    .compact(),
            )
            .init(),
        None => registry.init(),
    }
}

/// Returns `None` when the target file or directory cannot be created.
fn open_file_writer(target: &LogTarget) -> Option<NonBlocking> {
    let (non_blocking, guard) = match target {
        LogTarget::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| eprintln!("Failed to open log file {}: {err}", path.display()))
                .ok()?;
            tracing_appender::non_blocking(file)
        }
        LogTarget::DefaultDir => {
            std::fs::create_dir_all(DEFAULT_LOG_DIR)
                .map_err(|err| eprintln!("Failed to create {DEFAULT_LOG_DIR} directory: {err}"))
                .ok()?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(
                DEFAULT_LOG_DIR,
                DEFAULT_LOG_FILE,
            ))
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_dotenv_from;

    #[test]
    fn dotenv_file_sets_the_log_target() {
        let dir = std::env::temp_dir().join(format!("student-registry-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let log_path = dir.join("registry.log");
        let env_file = dir.join(".env");
        std::fs::write(&env_file, format!("{LOG_FILE_ENV}={}\n", log_path.display()))
            .expect("write env file");

        assert_eq!(load_dotenv_from(&env_file), Some(env_file.clone()));
        assert_eq!(log_target(), LogTarget::File(log_path));
    }
}
