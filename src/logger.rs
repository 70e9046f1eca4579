//! File-backed tracing for the CLI. Logging is best-effort: if the log
//! file cannot be opened or a subscriber is already installed, the engine
//! simply runs without it.

use std::fs::{File, OpenOptions, create_dir_all};
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

// Dropping the guard would silently stop the writer thread, so the first
// successful init parks it here for the life of the process.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the process-wide subscriber writing to `path`. Only the first
/// call has any effect. A `RUST_LOG` environment variable overrides
/// `default_filter`.
pub fn init_logging(path: impl AsRef<Path>, default_filter: &str) {
    if LOG_GUARD.get().is_some() {
        return;
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) => EnvFilter::new(spec),
        Err(_) => {
            EnvFilter::try_new(default_filter).unwrap_or_else(|_| EnvFilter::new("info"))
        }
    };

    let Ok(sink) = open_append(path.as_ref()) else {
        return;
    };
    let (writer, guard) = tracing_appender::non_blocking(sink);

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        let _ = LOG_GUARD.set(guard);
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
