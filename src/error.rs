use thiserror::Error;

/// Unified error type for monorel operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Git command `{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in monorel
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a not-found error with context
    pub fn not_found(msg: impl Into<String>) -> Self {
        ReleaseError::NotFound(msg.into())
    }

    /// Create an invalid-format error with context
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        ReleaseError::InvalidFormat(msg.into())
    }

    /// Create a conflict error with context
    pub fn conflict(msg: impl Into<String>) -> Self {
        ReleaseError::Conflict(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a cancellation error naming the interrupted operation
    pub fn cancelled(msg: impl Into<String>) -> Self {
        ReleaseError::Cancelled(msg.into())
    }

    /// True for the "nothing there yet" sentinel callers are expected to handle.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReleaseError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ReleaseError::Conflict(_))
    }

    pub fn is_invalid_format(&self) -> bool {
        matches!(self, ReleaseError::InvalidFormat(_))
    }
}
