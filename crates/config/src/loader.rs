//! Configuration loader
//!
//! Layers, lowest precedence first: built-in defaults, an optional JSON file,
//! then `TPEN_*` environment variables.

use crate::config::Config;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tpen_core::constants::{
    TPEN_AGENT_CLAIM_VAR, TPEN_API_VAR, TPEN_CONFIG_VAR, TPEN_LOG_VAR, TPEN_STORAGE_VAR,
};
use tpen_core::{Error, Result};
use tpen_utils::XdgPaths;
use tracing::debug;

/// Configuration loader that handles all startup configuration
pub struct ConfigLoader {
    /// Explicit configuration file; when unset the XDG default is used if present
    file: Option<PathBuf>,
    /// Environment snapshot; `None` reads the process environment
    environment: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            environment: None,
        }
    }

    /// Load from `path`; a missing explicit file is an error
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Use `vars` instead of the process environment
    pub fn environment(mut self, vars: HashMap<String, String>) -> Self {
        self.environment = Some(vars);
        self
    }

    pub fn load(self) -> Result<Config> {
        let mut config = match self.resolve_file() {
            Some((path, required)) => Self::read_file(&path, required)?.unwrap_or_default(),
            None => Config::default(),
        };

        self.apply_environment(&mut config);
        config.validate()?;
        debug!(api_base = %config.api_base, storage = %config.storage_path.display(), "Configuration loaded");
        Ok(config)
    }

    fn var(&self, name: &str) -> Option<String> {
        match &self.environment {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
        .filter(|v| !v.trim().is_empty())
    }

    /// The file to read and whether its absence is an error
    fn resolve_file(&self) -> Option<(PathBuf, bool)> {
        if let Some(path) = &self.file {
            return Some((path.clone(), true));
        }
        if let Some(path) = self.var(TPEN_CONFIG_VAR) {
            return Some((PathBuf::from(path), true));
        }
        Some((XdgPaths::config_file(), false))
    }

    fn read_file(path: &Path, required: bool) -> Result<Option<Config>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => return Ok(None),
            Err(e) => return Err(Error::file_system(path, "read configuration", e)),
        };
        let config = serde_json::from_str(&content).map_err(|e| {
            Error::configuration(format!("invalid configuration in {}: {e}", path.display()))
        })?;
        Ok(Some(config))
    }

    fn apply_environment(&self, config: &mut Config) {
        if let Some(api) = self.var(TPEN_API_VAR) {
            config.api_base = api;
        }
        if let Some(claim) = self.var(TPEN_AGENT_CLAIM_VAR) {
            config.agent_claim = claim;
        }
        if let Some(storage) = self.var(TPEN_STORAGE_VAR) {
            config.storage_path = PathBuf::from(storage);
        }
        if let Some(level) = self.var(TPEN_LOG_VAR) {
            config.log_level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_file_then_environment_precedence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"api_base":"http://localhost:3001","log_level":"debug"}"#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .file(&path)
            .environment(env(&[
                (TPEN_API_VAR, "https://api.t-pen.org"),
                (TPEN_STORAGE_VAR, "/tmp/tpen-storage.json"),
            ]))
            .load()
            .unwrap();

        assert_eq!(config.api_base, "https://api.t-pen.org");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.storage_path, PathBuf::from("/tmp/tpen-storage.json"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = ConfigLoader::new()
            .file(dir.path().join("absent.json"))
            .environment(HashMap::new())
            .load();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_json_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();

        let err = ConfigLoader::new()
            .file(&path)
            .environment(HashMap::new())
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let result = ConfigLoader::new()
            .file(&path)
            .environment(env(&[(TPEN_API_VAR, "not a url")]))
            .load();
        assert!(result.is_err());
    }
}
