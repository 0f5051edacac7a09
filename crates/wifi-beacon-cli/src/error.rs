//! Error handling for the wifi-beacon CLI

use thiserror::Error;

use crate::config::ConfigError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Peripheral error: {0}")]
    Beacon(#[from] wifi_beacon_ble::BeaconError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
