use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for tpen
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/tpen or fallback
    pub fn config_dir() -> PathBuf {
        Self::base("XDG_CONFIG_HOME", ".config")
    }

    /// Get XDG_DATA_HOME/tpen or fallback
    pub fn data_dir() -> PathBuf {
        Self::base("XDG_DATA_HOME", ".local/share")
    }

    /// Default configuration file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Default persistent key/value storage (holds the user credential)
    pub fn storage_file() -> PathBuf {
        Self::data_dir().join("storage.json")
    }

    fn base(var: &str, home_relative: &str) -> PathBuf {
        env::var(var)
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(home_relative))
                    .unwrap_or_else(|| PathBuf::from(home_relative))
            })
            .join("tpen")
    }
}
