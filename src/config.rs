use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const API_URL_ENV: &str = "FACTURE_API_URL";
pub const PAGE_SIZE_ENV: &str = "FACTURE_PAGE_SIZE";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub currency: String,
    /// Tera template for the share message; the built-in one when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_template: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            page_size: 10,
            timeout_secs: 30,
            currency: "FCFA".to_string(),
            share_template: None,
        }
    }
}

impl Settings {
    /// Reads `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, toml_str)?;
        Ok(())
    }

    /// Loads the user's settings file and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&config_path())?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(size) = lookup(PAGE_SIZE_ENV) {
            self.page_size = size
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::Config(format!("{PAGE_SIZE_ENV} must be a positive integer, got {size:?}")))?;
        }
        Ok(())
    }

    /// Public URL of an invoice's PDF, used in share links.
    pub fn pdf_url(&self, id: i64) -> String {
        format!("{}/factures/{id}/pdf", self.api_url.trim_end_matches('/'))
    }
}

pub fn config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "facture", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.toml");
        let settings = Settings {
            api_url: "https://factures.example/api".into(),
            page_size: 25,
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "currency = \"EUR\"\n").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.currency, "EUR");
        assert_eq!(settings.page_size, 10);
    }

    #[test]
    fn broken_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "page_size = \"many\"").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn environment_overrides_win() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(|key| match key {
                API_URL_ENV => Some("http://api.test".into()),
                PAGE_SIZE_ENV => Some("5".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(settings.api_url, "http://api.test");
        assert_eq!(settings.page_size, 5);

        let err = settings.apply_overrides(|key| (key == PAGE_SIZE_ENV).then(|| "0".to_string()));
        assert!(err.is_err());
    }

    #[test]
    fn pdf_url_joins_base() {
        let settings = Settings { api_url: "http://h/api/".into(), ..Settings::default() };
        assert_eq!(settings.pdf_url(3), "http://h/api/factures/3/pdf");
    }
}
