//! Peripheral configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BeaconError, Result};
use crate::mgmt::RadioSettings;
use crate::profile::{
    GattProfile, ProfileIds, UuidScheme, WifiCredentials, BLUETOOTH_BASE_SUFFIX, DEFAULT_UUID_BASE,
};

/// Shortest advertising interval the controller accepts
pub const MIN_ADVERTISING_INTERVAL_MS: u64 = 20;
/// Longest advertising interval the controller accepts
pub const MAX_ADVERTISING_INTERVAL_MS: u64 = 10_240;

// ----------------------------------------------------------------------------
// Configuration Sections
// ----------------------------------------------------------------------------

/// Adapter selection and identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Adapter name such as `hci0`; the default adapter when unset
    pub name: Option<String>,
    /// Alias set on the adapter and advertised as the local name
    pub local_name: String,
    /// Whether the adapter accepts pairing requests
    pub pairable: bool,
    /// Register a NoInputNoOutput agent as the default agent
    pub register_agent: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            name: None,
            local_name: "example-test".to_string(),
            pairable: false,
            register_agent: true,
        }
    }
}

/// UUID derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UuidConfig {
    pub base: String,
    pub suffix: String,
    pub ids: ProfileIds,
}

impl Default for UuidConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_UUID_BASE.to_string(),
            suffix: BLUETOOTH_BASE_SUFFIX.to_string(),
            ids: ProfileIds::default(),
        }
    }
}

/// Advertisement properties, fixed once advertising starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvertisingConfig {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub discoverable: bool,
    /// Extra properties BlueZ should include (e.g. `tx-power`); empty by default
    pub includes: Vec<String>,
}

impl Default for AdvertisingConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 32,
            max_interval_ms: 56,
            discoverable: true,
            includes: Vec::new(),
        }
    }
}

/// Low-level radio reconfiguration through `btmgmt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub reconfigure: bool,
    pub btmgmt_path: String,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            reconfigure: false,
            btmgmt_path: "btmgmt".to_string(),
        }
    }
}

/// The `bluetoothctl advertise on` workaround
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkaroundConfig {
    pub bluetoothctl: bool,
    pub bluetoothctl_path: String,
}

impl Default for WorkaroundConfig {
    fn default() -> Self {
        Self {
            bluetoothctl: true,
            bluetoothctl_path: "bluetoothctl".to_string(),
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the credentials peripheral
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    pub adapter: AdapterConfig,
    pub uuids: UuidConfig,
    pub credentials: WifiCredentials,
    pub advertising: AdvertisingConfig,
    pub radio: RadioConfig,
    pub workaround: WorkaroundConfig,
}

/// Advertisement parameters handed to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementParams {
    pub local_name: String,
    pub service_uuids: Vec<uuid::Uuid>,
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub discoverable: bool,
    pub includes: Vec<String>,
}

/// Adapter settings applied through the Bluetooth stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSettings {
    pub alias: String,
    pub pairable: bool,
    pub powered: bool,
}

impl BeaconConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific adapter instead of the default one
    pub fn with_adapter(mut self, name: impl Into<String>) -> Self {
        self.adapter.name = Some(name.into());
        self
    }

    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.adapter.local_name = name.into();
        self
    }

    pub fn with_credentials(mut self, credentials: WifiCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_intervals(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.advertising.min_interval_ms = min_ms;
        self.advertising.max_interval_ms = max_ms;
        self
    }

    /// Enable or disable `btmgmt` radio reconfiguration
    pub fn with_radio_reconfigure(mut self, enabled: bool) -> Self {
        self.radio.reconfigure = enabled;
        self
    }

    /// Enable or disable the `bluetoothctl advertise on` workaround
    pub fn with_bluetoothctl_workaround(mut self, enabled: bool) -> Self {
        self.workaround.bluetoothctl = enabled;
        self
    }

    pub fn uuid_scheme(&self) -> UuidScheme {
        UuidScheme::new(self.uuids.base.clone(), self.uuids.suffix.clone())
    }

    /// Build the GATT profile described by this configuration
    pub fn profile(&self) -> Result<GattProfile> {
        GattProfile::wifi_credentials(&self.uuid_scheme(), &self.uuids.ids, &self.credentials)
    }

    /// Advertisement for the given profile
    pub fn advertisement(&self, profile: &GattProfile) -> AdvertisementParams {
        AdvertisementParams {
            local_name: self.adapter.local_name.clone(),
            service_uuids: vec![profile.service_uuid],
            min_interval: Duration::from_millis(self.advertising.min_interval_ms),
            max_interval: Duration::from_millis(self.advertising.max_interval_ms),
            discoverable: self.advertising.discoverable,
            includes: self.advertising.includes.clone(),
        }
    }

    pub fn adapter_settings(&self) -> AdapterSettings {
        AdapterSettings {
            alias: self.adapter.local_name.clone(),
            pairable: self.adapter.pairable,
            powered: true,
        }
    }

    pub fn radio_settings(&self) -> RadioSettings {
        RadioSettings::low_energy_only()
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<()> {
        let min_ms = self.advertising.min_interval_ms;
        let max_ms = self.advertising.max_interval_ms;
        let allowed = MIN_ADVERTISING_INTERVAL_MS..=MAX_ADVERTISING_INTERVAL_MS;
        if !allowed.contains(&min_ms) || !allowed.contains(&max_ms) || min_ms > max_ms {
            return Err(BeaconError::InvalidInterval { min_ms, max_ms });
        }

        if self.adapter.local_name.is_empty() {
            return Err(BeaconError::InvalidConfiguration(
                "local name must not be empty".to_string(),
            ));
        }

        let credentials = &self.credentials;
        for (field, value) in [
            ("bssid", &credentials.bssid),
            ("ssid", &credentials.ssid),
            ("psk", &credentials.psk),
        ] {
            if value.is_empty() {
                return Err(BeaconError::InvalidConfiguration(format!(
                    "credential '{}' must not be empty",
                    field
                )));
            }
        }

        // Surfaces bad UUID fields and collisions
        self.profile()?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BeaconConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.adapter.local_name, "example-test");
        assert!(!config.adapter.pairable);
        assert!(!config.radio.reconfigure);
        assert!(config.workaround.bluetoothctl);
    }

    #[test]
    fn test_advertisement_params() {
        let config = BeaconConfig::default();
        let profile = config.profile().unwrap();
        let params = config.advertisement(&profile);

        assert_eq!(params.min_interval, Duration::from_millis(32));
        assert_eq!(params.max_interval, Duration::from_millis(56));
        assert!(params.discoverable);
        assert!(params.includes.is_empty());
        assert_eq!(params.service_uuids, vec![profile.service_uuid]);
    }

    #[test]
    fn test_interval_validation() {
        let config = BeaconConfig::default().with_intervals(100, 50);
        assert!(matches!(
            config.validate(),
            Err(BeaconError::InvalidInterval { min_ms: 100, max_ms: 50 })
        ));

        let config = BeaconConfig::default().with_intervals(0, 50);
        assert!(config.validate().is_err());

        let config = BeaconConfig::default().with_intervals(100, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_interval_range() {
        let config = BeaconConfig::default().with_intervals(10, 50);
        assert!(matches!(
            config.validate(),
            Err(BeaconError::InvalidInterval { min_ms: 10, max_ms: 50 })
        ));

        let config = BeaconConfig::default().with_intervals(100, 20_000);
        assert!(matches!(
            config.validate(),
            Err(BeaconError::InvalidInterval { min_ms: 100, max_ms: 20_000 })
        ));

        let config = BeaconConfig::default().with_intervals(20, 10_240);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let config = BeaconConfig::default().with_credentials(WifiCredentials {
            psk: String::new(),
            ..WifiCredentials::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_setters() {
        let config = BeaconConfig::new()
            .with_adapter("hci1")
            .with_local_name("beacon")
            .with_radio_reconfigure(true)
            .with_bluetoothctl_workaround(false);

        assert_eq!(config.adapter.name.as_deref(), Some("hci1"));
        assert_eq!(config.adapter_settings().alias, "beacon");
        assert!(config.radio.reconfigure);
        assert!(!config.workaround.bluetoothctl);
    }
}
