//! Application configuration

use crate::AppError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `server.base_url`
pub const SERVER_URL_ENV: &str = "GALLERY_SERVER_URL";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub viewer: ViewerConfig,
    pub thumbnails: ThumbnailConfig,
    pub downloads: DownloadConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3002".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_view_mode: ViewMode,
    pub button_zoom_factor: f32,
    pub wheel_zoom_factor: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Fraction of the viewport a fitted image may occupy
    pub fit_margin: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_view_mode: ViewMode::Detail,
            button_zoom_factor: 1.2,
            wheel_zoom_factor: 1.1,
            min_scale: 0.1,
            max_scale: 10.0,
            fit_margin: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub retry_interval_ms: u64,
    pub max_retries: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: 3000,
            max_retries: 15,
        }
    }
}

impl ThumbnailConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Target directory; the user's download dir when unset
    pub directory: Option<PathBuf>,
}

impl DownloadConfig {
    pub fn resolve_dir(&self) -> PathBuf {
        self.directory
            .clone()
            .or_else(dirs_next::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    #[serde(rename = "detail")]
    Detail,
    #[serde(rename = "grid")]
    Grid,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Detail => ViewMode::Grid,
            ViewMode::Grid => ViewMode::Detail,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, then apply env overrides
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())?;
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::info!("Server URL overridden by {}", SERVER_URL_ENV);
                self.server.base_url = url.trim().to_string();
            }
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// Get the persisted metadata panel state path
    pub fn panel_state_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.data_dir().join("panels.toml"))
            .unwrap_or_else(|| PathBuf::from("./panels.toml"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "ComfyGallery", "ComfyGallery")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.thumbnails.max_retries, 15);
        assert_eq!(config.thumbnails.retry_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nbase_url = \"http://gallery:8080\"\n\n[viewer]\ndefault_view_mode = \"grid\"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.server.base_url, "http://gallery:8080");
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.viewer.default_view_mode, ViewMode::Grid);
        assert_eq!(config.viewer.button_zoom_factor, 1.2);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.thumbnails.max_retries = 3;
        config.downloads.directory = Some(dir.path().to_path_buf());
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nbase_url = 1").unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_view_mode_toggle() {
        assert_eq!(ViewMode::Detail.toggled(), ViewMode::Grid);
        assert_eq!(ViewMode::Grid.toggled(), ViewMode::Detail);
    }
}
