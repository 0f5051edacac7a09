//! Configuration management for the wifi-beacon CLI
//!
//! Configuration is layered with figment, lowest priority first:
//! - defaults
//! - the user config file (`<config dir>/wifi-beacon/config.toml`)
//! - `wifi-beacon.toml` in the working directory
//! - the file given with `--config`
//! - `WIFI_BEACON_*` environment variables, `__` separating sections
//! - the legacy `ENABLE_BTMGT` / `DISABLE_BLUETOOTHCTL_HACK` flags
//! - command line arguments

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use wifi_beacon_ble::BeaconConfig;

/// Working-directory configuration file
pub const LOCAL_CONFIG_FILE: &str = "wifi-beacon.toml";

/// Prefix of layered environment overrides
pub const ENV_PREFIX: &str = "WIFI_BEACON_";

/// Set to `1` to reconfigure the radio through `btmgmt`
pub const ENABLE_BTMGMT_ENV: &str = "ENABLE_BTMGT";

/// Set to `1` to skip the `bluetoothctl advertise on` workaround
pub const DISABLE_BLUETOOTHCTL_HACK_ENV: &str = "DISABLE_BLUETOOTHCTL_HACK";

/// String-typed keys whose environment values are taken verbatim.
///
/// figment parses environment values, so `1000` or a digits-only passphrase
/// would otherwise arrive as integers and leading zeros would be lost.
const STRING_ENV_KEYS: &[&str] = &[
    "ble.adapter.name",
    "ble.adapter.local_name",
    "ble.uuids.base",
    "ble.uuids.suffix",
    "ble.uuids.ids.service",
    "ble.uuids.ids.bssid",
    "ble.uuids.ids.ssid",
    "ble.uuids.ids.psk",
    "ble.credentials.bssid",
    "ble.credentials.ssid",
    "ble.credentials.psk",
    "ble.radio.btmgmt_path",
    "ble.workaround.bluetoothctl_path",
];

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Peripheral configuration
    pub ble: BeaconConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log at debug level
    pub verbose: bool,
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration with the standard priority order, then apply the
    /// legacy environment flags and validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileSystem(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
        }

        let mut config: AppConfig = Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::Loading(format!("Failed to load configuration: {}", e)))?;

        config.apply_legacy_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Figment with every file and environment layer merged
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(user_path) = Self::user_config_path() {
            figment = figment.merge(Toml::file(user_path));
        }
        figment = figment.merge(Toml::file(LOCAL_CONFIG_FILE));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        let env = Env::prefixed(ENV_PREFIX).split("__");
        let raw: Vec<(String, String)> = env
            .iter()
            .map(|(key, value)| (key.as_str().to_ascii_lowercase(), value))
            .filter(|(key, _)| STRING_ENV_KEYS.contains(&key.as_str()))
            .collect();

        figment = figment.merge(env);
        for (key, value) in raw {
            figment = figment.merge((key, value));
        }
        figment
    }

    /// `<config dir>/wifi-beacon/config.toml`, when the platform has one
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wifi-beacon").join("config.toml"))
    }

    /// Apply `ENABLE_BTMGT=1` and `DISABLE_BLUETOOTHCTL_HACK=1`
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup(ENABLE_BTMGMT_ENV).as_deref() == Some("1") {
            self.ble.radio.reconfigure = true;
        }
        if lookup(DISABLE_BLUETOOTHCTL_HACK_ENV).as_deref() == Some("1") {
            self.ble.workaround.bluetoothctl = false;
        }
    }

    /// Apply command line overrides
    pub fn apply_overrides(&mut self, adapter: Option<String>, verbose: bool) {
        if let Some(adapter) = adapter {
            self.ble.adapter.name = Some(adapter);
        }
        if verbose {
            self.logging.verbose = true;
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ble
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        let mut example = AppConfig::default();
        example.ble.adapter.name = Some("hci0".to_string());
        example.ble.advertising.includes = vec!["tx-power".to_string()];

        example
            .to_toml()
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.logging.verbose);
        assert!(!config.ble.radio.reconfigure);
        assert!(config.ble.workaround.bluetoothctl);
    }

    #[test]
    fn test_legacy_env_flags() {
        let mut config = AppConfig::default();
        config.apply_legacy_env(env(&[
            ("ENABLE_BTMGT", "1"),
            ("DISABLE_BLUETOOTHCTL_HACK", "1"),
        ]));
        assert!(config.ble.radio.reconfigure);
        assert!(!config.ble.workaround.bluetoothctl);
    }

    #[test]
    fn test_legacy_env_requires_exact_one() {
        let mut config = AppConfig::default();
        config.apply_legacy_env(env(&[
            ("ENABLE_BTMGT", "true"),
            ("DISABLE_BLUETOOTHCTL_HACK", "0"),
        ]));
        assert!(!config.ble.radio.reconfigure);
        assert!(config.ble.workaround.bluetoothctl);
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(Some("hci2".to_string()), true);
        assert_eq!(config.ble.adapter.name.as_deref(), Some("hci2"));
        assert!(config.logging.verbose);

        // Absent overrides leave the loaded values alone
        config.apply_overrides(None, false);
        assert_eq!(config.ble.adapter.name.as_deref(), Some("hci2"));
        assert!(config.logging.verbose);
    }

    #[test]
    fn test_validation_reports_intervals() {
        let mut config = AppConfig::default();
        config.ble.advertising.min_interval_ms = 500;
        config.ble.advertising.max_interval_ms = 100;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_example_config_generation() {
        let example = AppConfig::example_config();
        assert!(example.contains("[ble.adapter]"));
        assert!(example.contains("[ble.advertising]"));
        assert!(example.contains("min_interval_ms = 32"));
        assert!(example.contains("tx-power"));
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let rendered = AppConfig::default().to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
