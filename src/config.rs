/// Application configuration
///
/// Settings are read from a JSON file so catalogs can be re-pointed or
/// reshaped without a rebuild. The file is looked up in this order:
/// - the path in `CATALOG_VIEWER_CONFIG`
/// - Linux: ~/.config/catalog-viewer/config.json
/// - macOS: ~/Library/Application Support/catalog-viewer/config.json
/// - Windows: %APPDATA%\catalog-viewer\config.json
///
/// Without a file the built-in catalogs are used.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::state::catalog::{CatalogKind, CatalogSchema};
use crate::state::readiness::DEFAULT_IMAGE_TIMEOUT_MS;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "CATALOG_VIEWER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// All settings of the application
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// How long an image slot may show a spinner
    pub image_timeout_ms: u64,
    /// Upper bound for any single HTTP request
    pub request_timeout_secs: u64,
    /// Catalog definitions, one per kind
    pub catalogs: Vec<CatalogSchema>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            image_timeout_ms: DEFAULT_IMAGE_TIMEOUT_MS,
            request_timeout_secs: 30,
            catalogs: CatalogKind::ALL
                .iter()
                .map(|&kind| CatalogSchema::builtin(kind))
                .collect(),
        }
    }
}

impl AppConfig {
    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read a config file
    ///
    /// A missing file is not an error and yields `None`.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_json(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Resolve and load the configuration
    ///
    /// Never fails: a broken file is reported and defaults are used.
    pub fn load() -> (Self, ConfigSource) {
        let Some(path) = Self::config_path() else {
            return (Self::default(), ConfigSource::Defaults);
        };

        match Self::from_file(&path) {
            Ok(Some(config)) => (config, ConfigSource::File(path)),
            Ok(None) => (Self::default(), ConfigSource::Defaults),
            Err(e) => {
                tracing::warn!(error = %e, "⚠️  Ignoring unusable config file, using defaults");
                (Self::default(), ConfigSource::Defaults)
            }
        }
    }

    /// Get the path where the config file should be
    fn config_path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }

        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("catalog-viewer");
        path.push("config.json");
        Some(path)
    }

    /// Schema for a catalog kind; configured entries win over built-ins
    pub fn schema(&self, kind: CatalogKind) -> CatalogSchema {
        self.catalogs
            .iter()
            .find(|schema| schema.kind == kind)
            .cloned()
            .unwrap_or_else(|| CatalogSchema::builtin(kind))
    }

    /// Kinds offered in navigation, in configured order
    pub fn kinds(&self) -> Vec<CatalogKind> {
        let mut kinds: Vec<CatalogKind> = Vec::new();
        for schema in &self.catalogs {
            if !kinds.contains(&schema.kind) {
                kinds.push(schema.kind);
            }
        }
        if kinds.is_empty() {
            kinds.extend(CatalogKind::ALL);
        }
        kinds
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.image_timeout(), Duration::from_millis(5000));
        assert_eq!(config.kinds(), CatalogKind::ALL.to_vec());
    }

    #[test]
    fn test_serialization() {
        let mut config = AppConfig::default();
        config.image_timeout_ms = 1200;

        let json = config.to_json().unwrap();
        let restored = AppConfig::from_json(&json).unwrap();

        assert_eq!(config, restored);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "image_timeout_ms": 250 }"#).unwrap();
        assert_eq!(config.image_timeout_ms, 250);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.catalogs.len(), 4);
    }

    #[test]
    fn test_schema_falls_back_to_builtin() {
        let config = AppConfig {
            catalogs: Vec::new(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.schema(CatalogKind::Skins),
            CatalogSchema::builtin(CatalogKind::Skins)
        );
        assert_eq!(config.kinds().len(), 4);
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let path = std::env::temp_dir().join("catalog-viewer-definitely-missing.json");
        assert!(AppConfig::from_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let path = std::env::temp_dir().join(format!("catalog-viewer-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = AppConfig::from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
