use std::path::PathBuf;

/// Result type alias for tpen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tpen operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credential could not be decoded into a claims object
    #[error("malformed token: {message}")]
    MalformedToken { message: String },

    /// Base64url payload whose length can never be padded to a multiple of four
    #[error("invalid base64url length {length}: a remainder of 1 cannot be padded")]
    InvalidLength { length: usize },

    /// A claim required by the caller is absent from the credential
    #[error("token claim '{claim}' is missing or not usable")]
    MissingClaim { claim: String },

    /// No usable credential is available
    #[error("not authenticated: {message}")]
    Unauthenticated { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Network-related errors
    #[error("network error for '{endpoint}': {message}")]
    Network { endpoint: String, message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// An event handler reported a failure
    #[error("handler for '{event}' failed: {message}")]
    Handler { event: String, message: String },
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a malformed token error
    #[must_use]
    pub fn malformed_token(message: impl Into<String>) -> Self {
        Error::MalformedToken {
            message: message.into(),
        }
    }

    /// Create an invalid base64url length error
    #[must_use]
    pub fn invalid_length(length: usize) -> Self {
        Error::InvalidLength { length }
    }

    /// Create a missing claim error
    #[must_use]
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Error::MissingClaim {
            claim: claim.into(),
        }
    }

    /// Create an unauthenticated error
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Error::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a network error
    #[must_use]
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a handler failure
    #[must_use]
    pub fn handler(event: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Handler {
            event: event.into(),
            message: message.into(),
        }
    }

    /// True for failures caused by the shape of a credential
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedToken { .. } | Error::InvalidLength { .. } | Error::MissingClaim { .. }
        )
    }
}

/// Attach a description of the failed step to any error convertible into
/// [`Error`]. Credential-shape errors pass through unchanged so callers can
/// still classify them with [`Error::is_token_error`].
pub trait ResultExt<T> {
    fn context(self, step: impl Into<String>) -> Result<T>;

    fn with_context<F>(self, step: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, step: impl Into<String>) -> Result<T> {
        self.with_context(|| step.into())
    }

    fn with_context<F>(self, step: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            token if token.is_token_error() => token,
            other => Error::configuration(format!("{}: {other}", step())),
        })
    }
}
