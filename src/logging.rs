//! Tracing subscriber setup for the binary
//!
//! Human-readable logs go to stderr. With a log file configured, the same
//! events are also written there as JSON lines, including the current span
//! (the `sync` span carries `entity` and `kind`). `RUST_LOG` overrides the
//! verbosity flags.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid log path {0:?}")]
    InvalidPath(PathBuf),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// `-v` count
    pub verbose: u8,
    pub quiet: bool,
    pub log_file: Option<PathBuf>,
}

/// Default filter directive for the given verbosity
pub fn filter_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "catalog_sync=info,warn",
        1 => "catalog_sync=debug,info",
        _ => "trace",
    }
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir.to_path_buf(), PathBuf::from(file_name)))
}

/// Installs the global subscriber
///
/// The returned guard flushes the log file on drop and must be held until
/// the program exits.
pub fn init_tracing(options: &LogOptions) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(options.verbose, options.quiet)));

    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    let (file_layer, guard) = match &options.log_file {
        Some(path) => {
            let (dir, file_name) = split_log_path(path)?;
            std::fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::never(&dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true)
                .with_span_list(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
