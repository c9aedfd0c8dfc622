use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variables checked for the backend URL, in order
pub const API_URL_ENV_VARS: [&str; 2] = ["SONIC_PI_API_URL", "REACT_APP_API_URL"];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Persist a backend URL as the new default.
    pub fn save_api_url(url: &str) -> Result<()> {
        Self::save_api_url_to(&Self::get_config_path()?, url)
    }

    pub fn save_api_url_to(path: &Path, url: &str) -> Result<()> {
        let mut config = match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Overwriting unreadable config {}: {:#}", path.display(), e);
                Self::new()
            }
        };
        config.api_url = Some(normalize_url(url));
        config.save_to(path)
    }

    /// Backend URL for this run: flag, then environment, then file, then default.
    pub fn resolve_api_url(&self, flag: Option<&str>) -> String {
        self.resolve_api_url_with(flag, |key| std::env::var(key).ok())
    }

    pub fn resolve_api_url_with<F>(&self, flag: Option<&str>, env: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = || {
            API_URL_ENV_VARS
                .iter()
                .filter_map(|key| env(key))
                .find(|value| !value.trim().is_empty())
        };

        let url = flag
            .map(str::to_string)
            .filter(|value| !value.trim().is_empty())
            .or_else(from_env)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        normalize_url(&url)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("sonicpi-chat").join("config.json"))
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_url() {
        assert_eq!(Config::new().resolve_api_url_with(None, no_env), DEFAULT_API_URL);
    }

    #[test]
    fn test_flag_wins() {
        let config = Config { api_url: Some("http://file:1".to_string()) };
        let url = config.resolve_api_url_with(Some("http://flag:2/"), |_| {
            Some("http://env:3".to_string())
        });
        assert_eq!(url, "http://flag:2");
    }

    #[test]
    fn test_env_beats_file() {
        let config = Config { api_url: Some("http://file:1".to_string()) };
        let url = config.resolve_api_url_with(None, |key| match key {
            "REACT_APP_API_URL" => Some("http://react:4".to_string()),
            _ => None,
        });
        assert_eq!(url, "http://react:4");

        let url = config.resolve_api_url_with(None, |key| match key {
            "SONIC_PI_API_URL" => Some("http://sonic:5".to_string()),
            "REACT_APP_API_URL" => Some("http://react:4".to_string()),
            _ => None,
        });
        assert_eq!(url, "http://sonic:5");
    }

    #[test]
    fn test_file_beats_default() {
        let config = Config { api_url: Some("http://file:1//".to_string()) };
        assert_eq!(config.resolve_api_url_with(None, no_env), "http://file:1");
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let config = Config::new();
        let url = config.resolve_api_url_with(Some("  "), |_| Some(String::new()));
        assert_eq!(url, DEFAULT_API_URL);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config { api_url: Some("http://studio:8000".to_string()) };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_api_url_replaces_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        Config::save_api_url_to(&path, "http://studio:8000/").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url.as_deref(), Some("http://studio:8000"));
    }
}
