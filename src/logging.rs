//! Subscriber setup for the `bandcrop` binary.
//!
//! Two layers share one `EnvFilter`: a compact stderr layer and a plain-text
//! file layer (default `processing.log`) written through a non-blocking
//! appender. `RUST_LOG` overrides the level chosen on the command line.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::BandCropError;

/// Logging configuration for the CLI.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for this crate's events: `error`, `info`, `debug`, …
    pub level: String,
    /// Level for the stderr layer. Kept at `error` while a progress bar
    /// owns the terminal.
    pub console_level: String,
    /// Log file, or `None` for stderr only.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_level: "info".to_string(),
            file: Some(PathBuf::from("processing.log")),
        }
    }
}

/// Filter directives used when `RUST_LOG` is unset.
///
/// pdfium-render is noisy at `debug`, so it is held at `warn`.
pub fn default_directives(level: &str) -> String {
    format!("pdf_bandcrop={level},bandcrop={level},pdfium_render=warn,{level}")
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// until the process exits.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, BandCropError> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(env_filter(&config.console_level));

    let Some(ref file) = config.file else {
        tracing_subscriber::registry().with(console_layer).init();
        return Ok(None);
    };

    let (dir, prefix) = split_log_path(file);
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(prefix)
        .build(dir)
        .map_err(|e| BandCropError::InvalidConfig(format!("log file {}: {e}", file.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(env_filter(&config.level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(Some(guard))
}

/// Split `path` into the directory and the file name the appender expects.
fn split_log_path(path: &Path) -> (PathBuf, String) {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "processing.log".to_string());
    (dir, name)
}
