use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use questlist_domain::rewards::LevelCurve;
use questlist_domain::shared::DomainError;

/// Application configuration. Loaded from a JSON file (path overridable
/// via `QUESTLIST_CONFIG`); every field falls back to its default when
/// absent, so a partial file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    /// Base URL of the remote document store. `None` runs local-only.
    pub remote_base_url: Option<String>,
    pub level_curve: LevelCurve,
    pub leaderboard_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("questlist");
        Self {
            db_path: data_dir.join("questlist.db"),
            log_dir: data_dir.join("logs"),
            remote_base_url: None,
            level_curve: LevelCurve::default(),
            leaderboard_limit: 50,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, DomainError> {
        let path = std::env::var("QUESTLIST_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_config_path());
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, DomainError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Infrastructure(format!("Failed to read config file: {}", e))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| DomainError::Serialization(format!("Invalid config file: {}", e)))
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("questlist")
            .join("config.json")
    }
}
