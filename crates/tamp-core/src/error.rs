//! Error types for Tamp

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for Tamp
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Hyper-level errors while serving or reading a body
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// Compression library failure
    #[error("Compression failed: {0}")]
    Compression(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by a wrapped handler
    #[error("Handler error: {0}")]
    Handler(String),

    /// Resource not found (raised by handlers)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Access refused (raised by handlers)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    HttpError(#[from] http::Error),

    /// Generic error with context
    #[error("{0}")]
    Generic(String),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert error to HTTP status code
    pub fn to_status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Http(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a compression error from any displayable cause
    pub fn compression(cause: impl std::fmt::Display) -> Self {
        Error::Compression(cause.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            Error::NotFound("/missing.txt".to_string()).to_status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Forbidden("../etc/passwd".to_string()).to_status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::Compression("stream error".to_string()).to_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_compression_error() {
        let err = Error::compression("invalid stored block lengths");
        assert!(matches!(err, Error::Compression(_)));
        assert!(err.to_string().contains("invalid stored block lengths"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
