//! Error types for `millerfm-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`. Paths carried by the
//! variants are gateway-relative strings, the same form the navigation
//! stack works with.

use std::io;

/// Unified error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(String),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A directory was expected but the path points to something else.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The destination of a create or rename already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A file or directory name is invalid (empty, contains separators, etc.).
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The file's content cannot be shown as a text preview.
    #[error("cannot preview: {0}")]
    NotPreviewable(String),

    /// A column index outside `0..=len` was passed to a stack operation.
    #[error("column index {index} out of range (stack depth {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Failed to parse a configuration or resource file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// The change watcher could not be started or reported a failure.
    #[error("watch error: {0}")]
    Watch(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Classifies an [`io::Error`] raised while operating on `path`.
    pub fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_string()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.to_string()),
            _ => Self::Io(err),
        }
    }

    /// Returns `true` for [`CoreError::PermissionDenied`].
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

impl From<notify::Error> for CoreError {
    fn from(err: notify::Error) -> Self {
        Self::Watch(err.to_string())
    }
}

/// Convenience alias used throughout `millerfm-core`.
pub type CoreResult<T> = Result<T, CoreError>;
