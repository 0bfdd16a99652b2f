//! Error types for the Docket search layer.
//!
//! Every crate in the workspace reports failures through [`Error`]. The
//! variants follow the search taxonomy: resolution and configuration errors
//! abort startup, storage and corruption errors are fatal for the operation
//! that hit them, and query syntax errors are recoverable.

use std::path::{Path, PathBuf};

/// Errors that can occur while resolving, indexing, or searching.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configured backend key is not registered.
    #[error("Cannot resolve search backend '{backend}': {message}")]
    BackendResolution {
        /// Backend key from configuration
        backend: String,
        /// What went wrong
        message: String,
    },

    /// Invalid or missing configuration (backend arguments, config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The index location cannot be reached or written.
    #[error("Index storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable {
        /// Index location
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// The persisted index cannot be read back. Requires a rebuild.
    #[error("Index corrupted at {}: {message}", path.display())]
    IndexCorruption {
        /// Index location
        path: PathBuf,
        /// Engine diagnostic
        message: String,
    },

    /// The query text could not be parsed.
    #[error("Invalid search query '{query}': {message}")]
    QuerySyntax {
        /// Offending query text
        query: String,
        /// Parser diagnostic
        message: String,
    },

    /// No search model is registered for the type tag.
    #[error("No search model registered for type '{0}'")]
    ModelNotFound(String),

    /// A search model was registered twice.
    #[error("Search model '{0}' is already registered")]
    DuplicateModel(String),

    /// The test context names a fixture object that is not bound.
    #[error("Test fixture '{0}' is not bound in the test context")]
    FixtureNotBound(String),

    /// I/O error with the path involved.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// Generic operation failure.
    #[error("Operation failed: {0}")]
    Operation(String),
}

/// Result type alias for Docket operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a backend resolution error.
    pub fn resolution<B: Into<String>, M: Into<String>>(backend: B, message: M) -> Self {
        Error::BackendResolution {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }

    /// Creates a storage error for the given location.
    pub fn storage<R: ToString>(path: impl AsRef<Path>, reason: R) -> Self {
        Error::StorageUnavailable {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Creates an index corruption error for the given location.
    pub fn corruption<M: Into<String>>(path: impl AsRef<Path>, message: M) -> Self {
        Error::IndexCorruption {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Creates a query syntax error.
    pub fn query_syntax<Q: Into<String>, M: Into<String>>(query: Q, message: M) -> Self {
        Error::QuerySyntax {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it concerns.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a generic operation error.
    pub fn operation<S: Into<String>>(message: S) -> Self {
        Error::Operation(message.into())
    }

    /// Returns whether the caller can simply report this error and carry on.
    ///
    /// Only query syntax errors qualify: they never touch the index.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::QuerySyntax { .. })
    }

    /// Returns whether this error needs operator attention.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::BackendResolution { .. } => true,
            Error::Config(_) => true,
            Error::StorageUnavailable { .. } => true,
            Error::IndexCorruption { .. } => true,
            Error::Io { .. } => true,
            Error::QuerySyntax { .. } => false,
            Error::ModelNotFound(_) => false,
            Error::DuplicateModel(_) => false,
            Error::FixtureNotBound(_) => false,
            Error::Operation(_) => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_display() {
        let err = Error::resolution("whoosh", "not registered (available: memory, tantivy)");
        assert_eq!(
            err.to_string(),
            "Cannot resolve search backend 'whoosh': not registered (available: memory, tantivy)"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_storage_error_display() {
        let err = Error::storage("/var/lib/docket", "permission denied");
        assert_eq!(
            err.to_string(),
            "Index storage unavailable at /var/lib/docket: permission denied"
        );
        assert!(err.is_fatal());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_query_syntax_is_recoverable() {
        let err = Error::query_syntax("title:(", "unexpected end of input");
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("title:("));
    }

    #[test]
    fn test_corruption_is_fatal() {
        let err = Error::corruption("/idx/document", "meta.json cannot be deserialized");
        let Error::IndexCorruption { path, message } = &err else {
            unreachable!("Expected IndexCorruption variant");
        };
        assert_eq!(path, Path::new("/idx/document"));
        assert!(message.contains("meta.json"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_io_with_path_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::io_with_path(io, "/tmp/records.json");
        assert!(err.to_string().contains("/tmp/records.json"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_model_errors_not_fatal() {
        assert!(!Error::ModelNotFound("tag".into()).is_fatal());
        assert!(!Error::FixtureNotBound("test_document".into()).is_fatal());
        assert_eq!(
            Error::DuplicateModel("document".into()).to_string(),
            "Search model 'document' is already registered"
        );
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
