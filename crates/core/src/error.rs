/// Failures reported by an [`EventSource`](crate::EventSource).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The request signature is missing or does not match the body.
    #[error("Invalid request signature")]
    InvalidSignature,

    /// The request body could not be decoded into events.
    #[error("Malformed webhook body: {0}")]
    Decode(String),

    /// The platform API could not be reached (network, DNS, timeout, etc.).
    #[error("Platform request failed: {0}")]
    Request(String),

    /// The platform API answered with a non-2xx status code.
    #[error("Platform returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// Failures reported by an [`ObjectStore`](crate::ObjectStore).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Operation not supported by the {backend} backend: {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display_includes_body() {
        let err = SourceError::HttpStatus {
            status: 401,
            body: "invalid token".into(),
        };
        assert_eq!(err.to_string(), "Platform returned HTTP 401: invalid token");
    }

    #[test]
    fn unsupported_display_names_backend() {
        let err = StorageError::Unsupported {
            backend: "local",
            operation: "presign",
        };
        assert_eq!(
            err.to_string(),
            "Operation not supported by the local backend: presign"
        );
    }
}
