//! Error types for the BLE peripheral

use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors raised while configuring the adapter or serving the GATT profile
#[derive(Error, Debug)]
pub enum BeaconError {
    #[error("Failed to open Bluetooth session: {0}")]
    Session(String),

    #[error("Bluetooth adapter not available: {0}")]
    AdapterUnavailable(String),

    #[error("Failed to configure adapter: {0}")]
    AdapterConfiguration(String),

    #[error("Failed to register pairing agent: {0}")]
    Agent(String),

    #[error("Failed to register GATT application: {0}")]
    Registration(String),

    #[error("Failed to start advertising: {0}")]
    Advertising(String),

    #[error("{command} failed: {reason}")]
    Management { command: String, reason: String },

    #[error("Invalid UUID '{value}': {reason}")]
    InvalidUuid { value: String, reason: String },

    #[error("UUID registered more than once: {uuid}")]
    DuplicateUuid { uuid: uuid::Uuid },

    #[error("Invalid advertising interval: min {min_ms} ms, max {max_ms} ms")]
    InvalidInterval { min_ms: u64, max_ms: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Operation not valid in state {state}: {operation}")]
    InvalidState { state: String, operation: String },

    #[error("BLE peripheral mode is not supported on this platform")]
    Unsupported,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for peripheral operations
pub type Result<T> = std::result::Result<T, BeaconError>;
