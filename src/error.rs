//! Error types for the shell.

use thiserror::Error;

/// Startup and lifecycle errors.
///
/// Only startup can fail loudly. Asynchronous store/load outcomes never
/// surface here; they are logged or delivered through the load handler.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The domain could not create its execution context.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// A host facility the shell needs is missing.
    #[error("host unavailable: {0}")]
    HostUnavailable(String),

    /// A context was handed to a driver that is already running.
    #[error("driver is already running")]
    AlreadyRunning,

    /// Storage setup failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Failure reported by a host storage completion.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record has been stored under the requested name.
    #[error("record not found")]
    Missing,

    /// The host reported an error.
    #[error("host storage error: {0}")]
    Host(String),

    /// Filesystem error (native backend).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True when the record is simply absent rather than broken.
    pub fn is_missing(&self) -> bool {
        match self {
            StorageError::Missing => true,
            StorageError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            StorageError::Host(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_classification() {
        assert!(StorageError::Missing.is_missing());
        assert!(StorageError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)).is_missing());
        assert!(!StorageError::Host("quota".into()).is_missing());
        assert!(
            !StorageError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
                .is_missing()
        );
    }

    #[test]
    fn test_storage_error_converts_into_shell_error() {
        let err: ShellError = StorageError::Host("blocked".into()).into();
        assert!(matches!(err, ShellError::Storage(StorageError::Host(_))));
        assert_eq!(err.to_string(), "storage error: host storage error: blocked");
    }
}
