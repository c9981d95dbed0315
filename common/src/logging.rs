//! Tracing initialization shared by binaries, hosts and integration tests.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// Logs always go to a daily-rolling file under `logs/`; stdout output is
/// opt-in through `LOG_TO_STDOUT`. The returned guard must be held for the
/// lifetime of the process or buffered log lines are lost.
pub fn init_logging() -> WorkerGuard {
    std::fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", crate::config::log_file());
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(crate::config::log_level()));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if crate::config::log_to_stdout() {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    tracing::info!(
        project = %crate::config::project_name(),
        env = %crate::config::env(),
        "logging initialised"
    );
    guard
}
