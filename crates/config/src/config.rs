//! Centralized configuration for tpen
//!
//! `Config` is immutable after loading and cheap to clone; every component
//! receives the values it needs from it rather than reading globals.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tpen_core::constants::{DEFAULT_AGENT_CLAIM, DEFAULT_API_BASE, USER_TOKEN_KEY};
use tpen_core::{Error, Result};
use tpen_utils::XdgPaths;

/// Resource cache tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// Per-request timeout for resource fetches
    pub request_timeout_secs: u64,
    /// Upper bound on JSON nodes visited when walking a manifest
    pub prefetch_limit: usize,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            prefetch_limit: 500,
        }
    }
}

impl VaultSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the TPEN services API
    pub api_base: String,
    /// Claim key holding the agent IRI when no `*/agent` claim is present
    pub agent_claim: String,
    /// Persistent key/value storage file
    pub storage_path: PathBuf,
    /// Storage key under which the credential is kept
    pub token_key: String,
    pub vault: VaultSettings,
    /// Default tracing directive
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            agent_claim: DEFAULT_AGENT_CLAIM.to_string(),
            storage_path: XdgPaths::storage_file(),
            token_key: USER_TOKEN_KEY.to_string(),
            vault: VaultSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        let api = url::Url::parse(&self.api_base).map_err(|e| {
            Error::configuration(format!("api_base '{}' is not a URL: {e}", self.api_base))
        })?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(Error::configuration(format!(
                "api_base must be http(s), got '{}'",
                api.scheme()
            )));
        }
        if self.token_key.trim().is_empty() {
            return Err(Error::configuration("token_key must not be empty"));
        }
        if self.agent_claim.trim().is_empty() {
            return Err(Error::configuration("agent_claim must not be empty"));
        }
        if self.vault.request_timeout_secs == 0 {
            return Err(Error::configuration(
                "vault.request_timeout_secs must be greater than zero",
            ));
        }
        Ok(())
    }

    /// `api_base` joined with `path`, without doubling slashes
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.token_key, "userToken");
        assert_eq!(config.vault.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_validate_rejects_bad_api_base() {
        let config = Config {
            api_base: "ftp://example.org".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            api_base: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_url_joins_cleanly() {
        let config = Config {
            api_base: "https://api.t-pen.org/".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.api_url("/project/abc"),
            "https://api.t-pen.org/project/abc"
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: Config = serde_json::from_str(
            r#"{"api_base":"http://localhost:3001","rerum_base":"https://devstore.rerum.io/v1"}"#,
        )
        .unwrap();
        assert_eq!(config.api_base, "http://localhost:3001");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_base":"http://localhost:3001","vault":{"prefetch_limit":10}}"#)
                .unwrap();
        assert_eq!(config.api_base, "http://localhost:3001");
        assert_eq!(config.vault.prefetch_limit, 10);
        assert_eq!(config.vault.request_timeout_secs, 30);
        assert_eq!(config.token_key, "userToken");
    }
}
