//! Fetch failures inside the vault
//!
//! These never leave [`crate::Vault::get`]; they become a `tpen-vault-error`
//! event and a `None` result.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("{uri} answered HTTP {status}")]
    Status { uri: String, status: u16 },

    #[error("request to {uri} failed: {message}")]
    Transport { uri: String, message: String },

    #[error("request to {uri} timed out")]
    Timeout { uri: String },

    #[error("{uri} did not return JSON: {message}")]
    InvalidJson { uri: String, message: String },

    #[error("HTTP client could not be built: {message}")]
    Client { message: String },
}

impl VaultError {
    pub fn status(uri: impl Into<String>, status: u16) -> Self {
        VaultError::Status {
            uri: uri.into(),
            status,
        }
    }

    pub fn transport(uri: impl Into<String>, message: impl Into<String>) -> Self {
        VaultError::Transport {
            uri: uri.into(),
            message: message.into(),
        }
    }

    pub fn invalid_json(uri: impl Into<String>, message: impl Into<String>) -> Self {
        VaultError::InvalidJson {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// HTTP status, when the server answered
    pub fn http_status(&self) -> Option<u16> {
        match self {
            VaultError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<VaultError> for tpen_core::Error {
    fn from(error: VaultError) -> Self {
        match &error {
            VaultError::Status { uri, .. }
            | VaultError::Transport { uri, .. }
            | VaultError::Timeout { uri }
            | VaultError::InvalidJson { uri, .. } => tpen_core::Error::network(uri.clone(), error.to_string()),
            VaultError::Client { .. } => tpen_core::Error::configuration(error.to_string()),
        }
    }
}
