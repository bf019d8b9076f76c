//! Configuration management for the CLI
//!
//! Defaults for the `translate` and `validate` commands are read from a
//! YAML or JSON file. Command-line flags take precedence over the file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Default translation cache size for `translate`
    pub cache_size: Option<usize>,

    /// Default directory for relative model resource paths
    pub paths_dir: Option<PathBuf>,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<Option<Config>>(&content)
                .map(Option::unwrap_or_default)
                .map_err(|e| e.to_string())
        };

        parsed.map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading configuration");
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".polyglot.yaml"),
            PathBuf::from(".polyglot.yml"),
            PathBuf::from(".polyglot.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("polyglot").join("config.yaml"));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "cache-size: 128\npaths-dir: /opt/models\nlogging:\n  level: debug").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.cache_size, Some(128));
        assert_eq!(config.paths_dir, Some(PathBuf::from("/opt/models")));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.format, None);
    }

    #[test]
    fn test_json_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"cache-size": 0, "logging": {{"format": "json"}}}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.cache_size, Some(0));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert_eq!(Config::from_file(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "cache_size: 12").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load_with_file(Some(Path::new("/nonexistent/polyglot.yaml"))).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
