//! Structured logging setup: pretty output to stderr, JSONL to a rolling
//! file under the app-data log directory. Mirrors the teacher's dual-output
//! approach (`tracing_appender::non_blocking` file writer alongside a
//! human-readable stderr layer) without its AI-agent-specific compact
//! format, which has no counterpart in this backend.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn log_dir(app_data_dir: &std::path::Path) -> PathBuf {
    app_data_dir.join("logs")
}

/// Initialize global tracing subscribers. Safe to call more than once;
/// subsequent calls are no-ops.
pub fn init(app_data_dir: &std::path::Path) {
    if FILE_GUARD.get().is_some() {
        return;
    }

    let dir = log_dir(app_data_dir);
    if std::fs::create_dir_all(&dir).is_err() {
        // Fall back to stderr-only logging if the log directory can't be created.
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
        return;
    }

    let file_appender = tracing_appender::rolling::daily(&dir, "popup-assist-core.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(fmt::layer().json().with_writer(non_blocking).with_ansi(false))
        .try_init();
}
