use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_appender::non_blocking::WorkerGuard;
use anyhow::Result;

/// Initializes the logging system for the application
///
/// Console output is written to stderr, since stdout carries the tool replies.
/// When a directory is given, events are also written to `iqx-db_{current_date}.log` inside it.
/// The logging level is taken from `RUST_LOG`, falling back to `default_level`;
/// `reqwest` and `hyper` are held at "warn" to reduce noise
///
/// # Arguments
///
/// * `log_file_path`: An optional `PathBuf` specifying the directory where the log file should be created
/// * `default_level`: The level used when `RUST_LOG` is not set (e.g. "info")
///
/// # Returns
///
/// * `Ok(Some(WorkerGuard))`: If logging is initialized with a file appender; the guard must be kept alive
/// * `Ok(None)`: If logging is initialized for the console only
/// * `Err(anyhow::Error)`: If there's an error initializing the logging system
pub fn init_logger(log_file_path: Option<PathBuf>, default_level: &str) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},reqwest=warn,hyper=warn", default_level)))?;

    let format = fmt::format()
        .with_timer(fmt::time::LocalTime::rfc_3339())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if let Some(path) = log_file_path {
        std::fs::create_dir_all(&path)?;

        let file_name = format!(
            "iqx-db_{}.log",
            chrono::Local::now().format("%Y-%m-%d")
        );
        let file_appender = RollingFileAppender::new(Rotation::NEVER, path, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::Layer::default()
            .event_format(format.clone())
            .with_writer(non_blocking);

        let console_layer = fmt::Layer::default()
            .event_format(format.with_ansi(true))
            .with_writer(std::io::stderr);

        tracing::subscriber::set_global_default(subscriber.with(file_layer).with(console_layer))?;

        tracing::info!("Logging initialized successfully");
        Ok(Some(guard))
    } else {
        let console_layer = fmt::Layer::default()
            .event_format(format.with_ansi(true))
            .with_writer(std::io::stderr);

        tracing::subscriber::set_global_default(subscriber.with(console_layer))?;

        tracing::info!("Logging initialized successfully (console only)");
        Ok(None)
    }
}
