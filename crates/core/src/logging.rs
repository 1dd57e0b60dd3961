use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber. Always logs to stderr; when `log_dir` is
/// given, also writes daily-rolled files named after `component` there.
///
/// The returned guard flushes the file writer on drop and must outlive the run.
pub fn init_logging(component: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false);

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer);

    let Some(log_dir) = log_dir else {
        registry.init();
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(log_dir) {
        registry.init();
        tracing::error!("Could not create log directory {}: {}", log_dir.display(), e);
        return None;
    }

    // Rolls into files named like `<component>.2024-01-21`
    let file_appender = tracing_appender::rolling::daily(log_dir, component);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    registry.with(file_layer).init();
    Some(guard)
}
