//! Error types for SortCopy
//!
//! Three families matter to callers: fatal input errors detected before any
//! traversal starts, directory listing errors raised while walking, and copy
//! errors that stay isolated to a single task.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for SortCopy operations
#[derive(Error, Debug)]
pub enum SortCopyError {
    /// Source path does not exist
    #[error("Source folder does not exist: {0}")]
    SourceNotFound(PathBuf),

    /// Source path exists but is not a directory
    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Output root resolves to the source directory itself
    #[error("Source and output are the same: {0}")]
    SameSourceAndDestination(PathBuf),

    /// A directory could not be listed during traversal
    #[error("Cannot list directory '{path}': {source}")]
    DirectoryList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating a bucket or copying file bytes failed
    #[error("Error copying '{path}': {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Task submitted after the pool started draining
    #[error("Copy pool is closed to new tasks")]
    PoolClosed,

    /// Thread pool error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operation cancelled by caller
    #[error("Operation cancelled")]
    Cancelled,
}

impl SortCopyError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a directory listing error
    pub fn list(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryList {
            path: path.into(),
            source,
        }
    }

    /// Create a copy error
    pub fn copy(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Copy {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Errors that must stop the process before traversal begins
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound(_) | Self::NotADirectory(_) | Self::SameSourceAndDestination(_)
        )
    }
}

/// Result type alias for SortCopy operations
pub type Result<T> = std::result::Result<T, SortCopyError>;

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SortCopyError::io(path, e))
    }
}
