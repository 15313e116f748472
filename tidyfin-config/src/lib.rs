//! Settings persistence.
//!
//! A single flat JSON file; every field is optional so the CLI and server
//! can layer their own flags and request bodies on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tmdb_api_key: Option<String>,
    pub source_dir: Option<PathBuf>,
    pub movies_dir: Option<PathBuf>,
    pub shows_dir: Option<PathBuf>,
    pub review_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write settings to `path` as pretty JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// API key from settings, overridable by the `TMDB_API_KEY` env var.
    pub fn effective_api_key(&self) -> Option<String> {
        std::env::var("TMDB_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.tmdb_api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let settings = Settings {
            tmdb_api_key: Some("abc123".to_string()),
            source_dir: Some("/downloads".into()),
            movies_dir: Some("/lib/Movies".into()),
            shows_dir: Some("/lib/Shows".into()),
            review_dir: None,
        };

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"tmdb_api_key":"k"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.tmdb_api_key.as_deref(), Some("k"));
        assert_eq!(settings.source_dir, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::Json(_))
        ));
    }
}
