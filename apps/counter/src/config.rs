//! # Counter Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PHARMA_API_URL=http://192.168.1.20:7194/api                        │
//! │     PHARMA_NAME="PHARMACIE EL ABAWAIN"                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/counter/counter.toml (Linux)                             │
//! │     ~/Library/Application Support/com.pharma.counter/counter.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:7194/api, 80 ms idle, 800 ms duplicate window     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://localhost:7194/api"
//! timeout_secs = 15
//! connect_timeout_secs = 10
//!
//! [pharmacy]
//! name = "PHARMACIE EL ABAWAIN"
//! currency = "DH"
//!
//! [scanner]
//! idle_ms = 80
//! duplicate_window_ms = 800
//!
//! [store]
//! # database_path = "/var/lib/counter/counter.db"
//! ```

use pharma_api::{ClientSettings, DEFAULT_BASE_URL};
use pharma_core::{ScanTiming, DEFAULT_PHARMACY_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// File name of the config inside the platform config directory.
pub const CONFIG_FILE: &str = "counter.toml";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Cannot write {path}: {reason}")]
    Save { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Backend connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 15,
            connect_timeout_secs: 10,
        }
    }
}

/// What gets printed on invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PharmacySettings {
    pub name: String,
    pub currency: String,
}

impl Default for PharmacySettings {
    fn default() -> Self {
        PharmacySettings {
            name: DEFAULT_PHARMACY_NAME.to_string(),
            currency: "DH".to_string(),
        }
    }
}

/// Barcode scanner timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Silence after the last keystroke that completes a scan.
    pub idle_ms: u64,
    /// Same code again within this window is dropped.
    pub duplicate_window_ms: u64,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        let timing = ScanTiming::default();
        ScannerSettings {
            idle_ms: timing.idle_ms,
            duplicate_window_ms: timing.duplicate_window_ms,
        }
    }
}

/// Local store location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Defaults to `<data dir>/counter.db`.
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// AppConfig
// =============================================================================

/// Complete counter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub pharmacy: PharmacySettings,

    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, else the platform default)
    /// 3. Environment variables
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let (path, explicit) = match config_path {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (Self::default_config_path(), false),
        };

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::Load {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                config = toml::from_str(&contents).map_err(|e| ConfigError::Load {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            } else if explicit {
                return Err(ConfigError::Load {
                    path,
                    reason: "file does not exist".to_string(),
                });
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults (plus environment) if loading fails.
    pub fn load_or_default(config_path: Option<&Path>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            let mut config = Self::default();
            config.apply_env_overrides(|key| std::env::var(key).ok());
            if let Err(e) = config.validate() {
                warn!("Environment overrides rejected: {}. Using plain defaults.", e);
                return Self::default();
            }
            config
        })
    }

    /// Writes the configuration as pretty TOML, creating the directory.
    pub fn save(&self, config_path: Option<&Path>) -> ConfigResult<PathBuf> {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigDir)?;

        let save_err = |e: String| ConfigError::Save {
            path: path.clone(),
            reason: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| save_err(e.to_string()))?;
        std::fs::write(&path, contents).map_err(|e| save_err(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        pharma_api::client::normalize_base_url(&self.api.base_url)
            .map_err(|e| ConfigError::Invalid(format!("api.base_url: {}", e)))?;

        if self.api.timeout_secs == 0 || self.api.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api timeouts must be greater than 0".into(),
            ));
        }

        if self.scanner.idle_ms == 0 {
            return Err(ConfigError::Invalid(
                "scanner.idle_ms must be greater than 0".into(),
            ));
        }

        if self.scanner.idle_ms >= self.scanner.duplicate_window_ms {
            return Err(ConfigError::Invalid(format!(
                "scanner.idle_ms ({}) must be shorter than scanner.duplicate_window_ms ({})",
                self.scanner.idle_ms, self.scanner.duplicate_window_ms
            )));
        }

        if self.pharmacy.name.trim().is_empty() {
            return Err(ConfigError::Invalid("pharmacy.name is empty".into()));
        }

        Ok(())
    }

    /// Applies `PHARMA_*` overrides read through `lookup`.
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("PHARMA_API_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.api.base_url = url;
        }

        if let Some(raw) = lookup("PHARMA_API_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring PHARMA_API_TIMEOUT_SECS"),
            }
        }

        if let Some(name) = lookup("PHARMA_NAME") {
            self.pharmacy.name = name;
        }

        if let Some(raw) = lookup("PHARMA_SCAN_IDLE_MS") {
            match raw.parse() {
                Ok(ms) => self.scanner.idle_ms = ms,
                Err(_) => warn!(value = %raw, "Ignoring PHARMA_SCAN_IDLE_MS"),
            }
        }

        if let Some(raw) = lookup("PHARMA_SCAN_DUPLICATE_MS") {
            match raw.parse() {
                Ok(ms) => self.scanner.duplicate_window_ms = ms,
                Err(_) => warn!(value = %raw, "Ignoring PHARMA_SCAN_DUPLICATE_MS"),
            }
        }

        if let Some(path) = lookup("PHARMA_DB_PATH") {
            debug!(path = %path, "Overriding store path from environment");
            self.store.database_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        crate::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings::new(self.api.base_url.clone())
            .timeout(Duration::from_secs(self.api.timeout_secs))
            .connect_timeout(Duration::from_secs(self.api.connect_timeout_secs))
    }

    pub fn scan_timing(&self) -> ScanTiming {
        ScanTiming {
            idle_ms: self.scanner.idle_ms,
            duplicate_window_ms: self.scanner.duplicate_window_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:7194/api");
        assert_eq!(config.scanner.idle_ms, 80);
        assert_eq!(config.scanner.duplicate_window_ms, 800);
        assert_eq!(config.pharmacy.name, "PHARMACIE EL ABAWAIN");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.api.base_url = "localhost:7194".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.scanner.idle_ms = 900;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[
            ("PHARMA_API_URL", "http://10.0.0.5:7194/api"),
            ("PHARMA_API_TIMEOUT_SECS", "30"),
            ("PHARMA_SCAN_IDLE_MS", "not-a-number"),
            ("PHARMA_DB_PATH", "/tmp/counter.db"),
        ]));

        assert_eq!(config.api.base_url, "http://10.0.0.5:7194/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.scanner.idle_ms, 80);
        assert_eq!(
            config.store.database_path.as_deref(),
            Some(Path::new("/tmp/counter.db"))
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [pharmacy]
            name = "PHARMACIE DU CENTRE"

            [scanner]
            idle_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.pharmacy.name, "PHARMACIE DU CENTRE");
        assert_eq!(config.pharmacy.currency, "DH");
        assert_eq!(config.scanner.idle_ms, 50);
        assert_eq!(config.scanner.duplicate_window_ms, 800);
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("counter-config-{}", std::process::id()));
        let path = dir.join("nested").join("counter.toml");

        let mut config = AppConfig::default();
        config.pharmacy.name = "PHARMACIE TEST".into();
        config.save(Some(&path)).unwrap();

        let mut loaded: AppConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        loaded.validate().unwrap();
        assert_eq!(loaded.pharmacy.name, "PHARMACIE TEST");

        loaded.scanner.idle_ms = 10;
        assert_ne!(loaded, config);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/counter.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }
}
