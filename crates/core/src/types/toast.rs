use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a transient notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastStatus {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for ToastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToastStatus::Info => "info",
            ToastStatus::Success => "success",
            ToastStatus::Warning => "warning",
            ToastStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Payload of a `tpen-toast` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub message: String,
    #[serde(default)]
    pub status: ToastStatus,
}

impl Toast {
    pub fn new(message: impl Into<String>, status: ToastStatus) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, ToastStatus::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastStatus::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, ToastStatus::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastStatus::Error)
    }
}
