use std::path::PathBuf;
use thiserror::Error;

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during a search run.
///
/// Only [`SearchError::InvalidPattern`] and [`SearchError::ConfigError`]
/// are fatal; every other variant is recovered where it occurs (logged as
/// a warning) and never aborts the run. Use [`SearchError::is_fatal`] to
/// distinguish without matching on variants.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
    #[error("Skipping directory (recursion disabled): {0}")]
    DirectorySkipped(PathBuf),
    #[error("Failed to read directory {path}: {source}")]
    TraversalError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read file {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    pub fn directory_skipped(path: impl Into<PathBuf>) -> Self {
        Self::DirectorySkipped(path.into())
    }

    pub fn traversal_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TraversalError {
            path: path.into(),
            source,
        }
    }

    pub fn unreadable_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether this error must terminate the run before any file is scanned.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidPattern(_) | Self::ConfigError(_))
    }
}
