//! GATT profile model: UUID scheme, characteristics and the service they
//! belong to.
//!
//! The profile is pure data plus callbacks. Backends translate it into the
//! Bluetooth stack's own representation, so everything here can be exercised
//! without an adapter.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{BeaconError, Result};

// ----------------------------------------------------------------------------
// UUID Scheme
// ----------------------------------------------------------------------------

/// Bluetooth base UUID suffix appended to 32-bit UUIDs
pub const BLUETOOTH_BASE_SUFFIX: &str = "-0000-1000-8000-00805F9B34FB";

/// Application prefix placed in front of every 16-bit short id
pub const DEFAULT_UUID_BASE: &str = "6789";

/// Short id of the credentials service
pub const SERVICE_SHORT_ID: &str = "1000";
/// Short id of the BSSID characteristic
pub const BSSID_SHORT_ID: &str = "1001";
/// Short id of the SSID characteristic
pub const SSID_SHORT_ID: &str = "1002";
/// Short id of the PSK characteristic
pub const PSK_SHORT_ID: &str = "1003";

/// Expand a short id into a full 128-bit UUID.
///
/// A 4-digit short id is prefixed with `base`; an 8-digit one stands on its
/// own. The result is `<base><short><suffix>`.
pub fn expand_uuid(base: &str, short: &str, suffix: &str) -> Result<Uuid> {
    let head = match short.len() {
        8 => short.to_string(),
        4 => format!("{}{}", base, short),
        n => {
            return Err(BeaconError::InvalidUuid {
                value: short.to_string(),
                reason: format!("short id must be 4 or 8 hex digits, got {}", n),
            })
        }
    };

    if head.len() != 8 || !head.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BeaconError::InvalidUuid {
            value: head,
            reason: "expected 8 hex digits before the suffix".to_string(),
        });
    }

    let full = format!("{}{}", head, suffix);
    Uuid::parse_str(&full).map_err(|e| BeaconError::InvalidUuid {
        value: full,
        reason: e.to_string(),
    })
}

/// Base and suffix used to derive every UUID of the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UuidScheme {
    pub base: String,
    pub suffix: String,
}

impl UuidScheme {
    pub fn new(base: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            suffix: suffix.into(),
        }
    }

    /// Derive the full UUID for a short id
    pub fn uuid(&self, short: &str) -> Result<Uuid> {
        expand_uuid(&self.base, short, &self.suffix)
    }
}

impl Default for UuidScheme {
    fn default() -> Self {
        Self::new(DEFAULT_UUID_BASE, BLUETOOTH_BASE_SUFFIX)
    }
}

// ----------------------------------------------------------------------------
// Characteristics
// ----------------------------------------------------------------------------

/// Read callback: returns the current value
pub type ReadFn = Arc<dyn Fn() -> Vec<u8> + Send + Sync>;

/// Write callback: receives the written bytes and returns the echoed value
pub type WriteFn = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// A readable and writable characteristic backed by callbacks
#[derive(Clone)]
pub struct CharacteristicSpec {
    pub uuid: Uuid,
    pub name: String,
    read: ReadFn,
    write: WriteFn,
}

impl CharacteristicSpec {
    pub fn new(uuid: Uuid, name: impl Into<String>, read: ReadFn, write: WriteFn) -> Self {
        Self {
            uuid,
            name: name.into(),
            read,
            write,
        }
    }

    /// Characteristic that always reads back `value`. Writes are accepted
    /// and echoed but never stored.
    pub fn static_string(uuid: Uuid, name: impl Into<String>, value: impl Into<String>) -> Self {
        let value: Arc<[u8]> = Arc::from(value.into().into_bytes());
        let name = name.into();

        let read_value = Arc::clone(&value);
        let read: ReadFn = Arc::new(move || read_value.to_vec());

        let write_name = name.clone();
        let write: WriteFn = Arc::new(move |data: &[u8]| {
            debug!("Discarding {}-byte write to {}: {}", data.len(), write_name, hex::encode(data));
            data.to_vec()
        });

        Self::new(uuid, name, read, write)
    }

    /// Invoke the read callback
    pub fn read(&self) -> Vec<u8> {
        (self.read)()
    }

    /// Read starting at `offset`, as requested by long reads. `None` when the
    /// offset lies past the end of the value.
    pub fn read_at(&self, offset: usize) -> Option<Vec<u8>> {
        let value = self.read();
        value.get(offset..).map(<[u8]>::to_vec)
    }

    /// Invoke the write callback, returning the echoed bytes
    pub fn write(&self, data: &[u8]) -> Vec<u8> {
        (self.write)(data)
    }
}

impl fmt::Debug for CharacteristicSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacteristicSpec")
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Service Profile
// ----------------------------------------------------------------------------

/// Values served by the three credential characteristics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WifiCredentials {
    pub bssid: String,
    pub ssid: String,
    pub psk: String,
}

impl Default for WifiCredentials {
    fn default() -> Self {
        Self {
            bssid: "AA:BB:CC:DD:EE:FF".to_string(),
            ssid: "example-test".to_string(),
            psk: "N0t$oSecure0verB!E".to_string(),
        }
    }
}

/// Short ids of the service and its characteristics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProfileIds {
    pub service: String,
    pub bssid: String,
    pub ssid: String,
    pub psk: String,
}

impl Default for ProfileIds {
    fn default() -> Self {
        Self {
            service: SERVICE_SHORT_ID.to_string(),
            bssid: BSSID_SHORT_ID.to_string(),
            ssid: SSID_SHORT_ID.to_string(),
            psk: PSK_SHORT_ID.to_string(),
        }
    }
}

/// One primary service and its characteristics
#[derive(Debug, Clone)]
pub struct GattProfile {
    pub service_uuid: Uuid,
    pub characteristics: Vec<CharacteristicSpec>,
}

impl GattProfile {
    pub fn new(service_uuid: Uuid) -> Self {
        Self {
            service_uuid,
            characteristics: Vec::new(),
        }
    }

    /// Add a characteristic, rejecting UUIDs already present in the profile
    pub fn add_characteristic(&mut self, characteristic: CharacteristicSpec) -> Result<()> {
        if self.contains(&characteristic.uuid) {
            return Err(BeaconError::DuplicateUuid {
                uuid: characteristic.uuid,
            });
        }
        self.characteristics.push(characteristic);
        Ok(())
    }

    /// The credentials service: BSSID, SSID and PSK, each a static string
    pub fn wifi_credentials(
        scheme: &UuidScheme,
        ids: &ProfileIds,
        credentials: &WifiCredentials,
    ) -> Result<Self> {
        let mut profile = Self::new(scheme.uuid(&ids.service)?);
        profile.add_characteristic(CharacteristicSpec::static_string(
            scheme.uuid(&ids.bssid)?,
            "bssid",
            credentials.bssid.clone(),
        ))?;
        profile.add_characteristic(CharacteristicSpec::static_string(
            scheme.uuid(&ids.ssid)?,
            "ssid",
            credentials.ssid.clone(),
        ))?;
        profile.add_characteristic(CharacteristicSpec::static_string(
            scheme.uuid(&ids.psk)?,
            "psk",
            credentials.psk.clone(),
        ))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check that every UUID appears once and the service is not empty
    pub fn validate(&self) -> Result<()> {
        if self.characteristics.is_empty() {
            return Err(BeaconError::InvalidConfiguration(
                "service has no characteristics".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for uuid in self.uuids() {
            if !seen.insert(uuid) {
                return Err(BeaconError::DuplicateUuid { uuid });
            }
        }
        Ok(())
    }

    /// Service UUID followed by each characteristic UUID
    pub fn uuids(&self) -> impl Iterator<Item = Uuid> + '_ {
        std::iter::once(self.service_uuid).chain(self.characteristics.iter().map(|c| c.uuid))
    }

    pub fn characteristic(&self, uuid: &Uuid) -> Option<&CharacteristicSpec> {
        self.characteristics.iter().find(|c| &c.uuid == uuid)
    }

    fn contains(&self, uuid: &Uuid) -> bool {
        self.uuids().any(|u| &u == uuid)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn default_profile() -> GattProfile {
        GattProfile::wifi_credentials(
            &UuidScheme::default(),
            &ProfileIds::default(),
            &WifiCredentials::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_uuid_expansion() {
        let scheme = UuidScheme::default();
        assert_eq!(
            scheme.uuid("1000").unwrap().to_string(),
            "67891000-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            scheme.uuid("1003").unwrap().to_string(),
            "67891003-0000-1000-8000-00805f9b34fb"
        );
        // A full 32-bit id ignores the base
        assert_eq!(
            scheme.uuid("0000180f").unwrap().to_string(),
            "0000180f-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_uuid_expansion_rejects_bad_input() {
        let scheme = UuidScheme::default();
        assert!(scheme.uuid("100").is_err());
        assert!(scheme.uuid("10zz").is_err());
        assert!(UuidScheme::new("67", BLUETOOTH_BASE_SUFFIX).uuid("1000").is_err());
        assert!(UuidScheme::new("6789", "-bogus").uuid("1000").is_err());
    }

    #[test]
    fn test_reads_return_constants() {
        let profile = default_profile();
        let scheme = UuidScheme::default();

        let expected = [
            ("1001", "AA:BB:CC:DD:EE:FF"),
            ("1002", "example-test"),
            ("1003", "N0t$oSecure0verB!E"),
        ];
        for (short, value) in expected {
            let uuid = scheme.uuid(short).unwrap();
            let characteristic = profile.characteristic(&uuid).unwrap();
            assert_eq!(characteristic.read(), value.as_bytes());
        }
    }

    #[test]
    fn test_write_echoes_and_is_not_retained() {
        let profile = default_profile();
        for characteristic in &profile.characteristics {
            let before = characteristic.read();
            let echoed = characteristic.write(b"overwrite attempt");
            assert_eq!(echoed, b"overwrite attempt");
            assert_eq!(characteristic.read(), before);
        }
    }

    #[test]
    fn test_read_at_offset() {
        let uuid = UuidScheme::default().uuid("1002").unwrap();
        let characteristic = CharacteristicSpec::static_string(uuid, "ssid", "example-test");
        assert_eq!(characteristic.read_at(0).unwrap(), b"example-test");
        assert_eq!(characteristic.read_at(8).unwrap(), b"test");
        assert_eq!(characteristic.read_at(12).unwrap(), b"");
        assert!(characteristic.read_at(13).is_none());
    }

    #[test]
    fn test_duplicate_uuids_rejected() {
        let scheme = UuidScheme::default();
        let ids = ProfileIds {
            ssid: "1001".to_string(),
            ..ProfileIds::default()
        };
        let err = GattProfile::wifi_credentials(&scheme, &ids, &WifiCredentials::default())
            .unwrap_err();
        assert!(matches!(err, BeaconError::DuplicateUuid { .. }));

        // A characteristic may not reuse the service UUID either
        let ids = ProfileIds {
            psk: "1000".to_string(),
            ..ProfileIds::default()
        };
        assert!(GattProfile::wifi_credentials(&scheme, &ids, &WifiCredentials::default()).is_err());
    }

    #[test]
    fn test_empty_profile_is_invalid() {
        let profile = GattProfile::new(UuidScheme::default().uuid("1000").unwrap());
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_uuids_are_service_first() {
        let profile = default_profile();
        let uuids: Vec<Uuid> = profile.uuids().collect();
        assert_eq!(uuids.len(), 4);
        assert_eq!(uuids[0], profile.service_uuid);
    }
}
