/// Error types for ggrep.
///
/// Only failures that stop a whole search are represented here. Per-file and
/// per-directory problems (unreadable files, unlistable directories, a read
/// that fails halfway through a file) are logged where they happen and the
/// search carries on; they never reach the caller as an `Err`.
///
/// ```rust,ignore
/// match ggrep_core::search(&config, |m| println!("{m}")) {
///     Ok(summary) => // Report summary,
///     Err(SearchError::ConfigError(msg)) => // Bad input,
///     Err(e) => // Output or thread failure,
/// }
/// ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn worker_panicked(thread: impl Into<String>) -> Self {
        Self::WorkerPanicked(thread.into())
    }

    /// Maps an I/O error raised while opening `path` to the most specific variant.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}
