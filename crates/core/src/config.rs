//! Application Configuration
//!
//! Settings read from `config.toml` in the platform config directory:
//! - Android SDK location
//! - Emulator boot defaults

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{CoreError, Result};

/// Android SDK configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AndroidConfig {
    /// Path to Android SDK, searched when a tool is missing from `$PATH`
    pub sdk_path: Option<PathBuf>,
}

/// Emulator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmulatorConfig {
    /// How long to wait for `sys.boot_completed`, unset waits forever
    pub boot_timeout_ms: Option<u64>,
    /// API level used to pick an image when none is named
    pub default_target_api: u32,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            boot_timeout_ms: None,
            default_target_api: 34,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Android SDK settings
    pub android: AndroidConfig,
    /// Emulator settings
    pub emulator: EmulatorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            android: AndroidConfig::default(),
            emulator: EmulatorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "rdroid", "avd-runner")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| CoreError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from a file, falling back to defaults when it is absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| CoreError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to a file
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Get Android SDK path: configured value, then environment, then common install paths
    pub fn get_sdk_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.android.sdk_path.clone() {
            return Some(path);
        }

        for var in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
            if let Some(value) = std::env::var_os(var) {
                if !value.is_empty() {
                    return Some(PathBuf::from(value));
                }
            }
        }

        let candidates = if cfg!(windows) {
            vec![
                dirs::data_local_dir().map(|d| d.join("Android").join("Sdk")),
                Some(PathBuf::from("C:\\Android\\sdk")),
            ]
        } else if cfg!(target_os = "macos") {
            vec![dirs::home_dir().map(|h| h.join("Library").join("Android").join("sdk"))]
        } else {
            vec![
                dirs::home_dir().map(|h| h.join("Android").join("Sdk")),
                Some(PathBuf::from("/usr/local/android-sdk")),
            ]
        };

        candidates.into_iter()
            .flatten()
            .find(|p| p.exists())
    }

    /// Boot timeout in milliseconds, `-1` meaning "wait forever"
    pub fn boot_timeout_ms(&self) -> i64 {
        match self.emulator.boot_timeout_ms {
            Some(ms) => i64::try_from(ms).unwrap_or(i64::MAX),
            None => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.android.sdk_path, None);
        assert_eq!(config.emulator.default_target_api, 34);
        assert_eq!(config.boot_timeout_ms(), -1);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str("[emulator]\nboot_timeout_ms = 120000\n").unwrap();
        assert_eq!(config.emulator.boot_timeout_ms, Some(120_000));
        assert_eq!(config.emulator.default_target_api, 34);
        assert_eq!(config.boot_timeout_ms(), 120_000);
    }

    #[test]
    fn test_configured_sdk_path_wins() {
        let mut config = AppConfig::default();
        config.android.sdk_path = Some(PathBuf::from("/opt/android-sdk"));
        assert_eq!(config.get_sdk_path(), Some(PathBuf::from("/opt/android-sdk")));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.android.sdk_path = Some(PathBuf::from("/sdk"));
        config.emulator.default_target_api = 29;
        config.save_to(&path).await.unwrap();

        let loaded = AppConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "version = [").await.unwrap();

        let err = AppConfig::load_from(&path).await.unwrap_err();
        assert!(matches!(err, CoreError::TomlParse(_)));
    }
}
