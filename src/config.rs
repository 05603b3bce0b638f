//! Configuration file support.
//!
//! Loads and saves store configuration from TOML files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "primdb.toml";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `db_meta.json` and `data/<table>.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Ask before dropping tables or deleting records.
    #[serde(default = "default_true")]
    pub confirm_destructive: bool,

    /// Log how long each operation took.
    #[serde(default = "default_true")]
    pub log_timing: bool,

    /// Memoize select results.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            confirm_destructive: true,
            log_timing: true,
            cache_enabled: true,
        }
    }
}

impl Config {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Loads `path` when given, otherwise [DEFAULT_CONFIG_FILE] from the
    /// working directory if it exists, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(config.confirm_destructive);
        assert!(config.log_timing);
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("log_timing = false\n").unwrap();
        assert!(!config.log_timing);
        assert!(config.confirm_destructive);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("primdb.toml");

        let config = Config {
            data_dir: dir.path().join("store"),
            confirm_destructive: false,
            log_timing: false,
            cache_enabled: false,
        };
        config.save(&path).unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::from_file(&dir.path().join("nope.toml")).is_err());
    }
}
