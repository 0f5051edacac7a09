//! BLE peripheral serving static Wi-Fi credentials over GATT
//!
//! The adapter is put into peripheral mode and a single primary service is
//! registered with three read-only characteristics: BSSID, SSID and PSK.
//! Writes are accepted and echoed but never stored. The Bluetooth protocol
//! itself is left to BlueZ; this crate only sequences the calls into it.
//!
//! ## Architecture
//!
//! - [`profile`] - UUID scheme and the GATT profile model
//! - [`config`] - Peripheral configuration
//! - [`backend`] - Seam to the Bluetooth stack (BlueZ on Linux, mock for tests)
//! - [`mgmt`] - Radio reconfiguration through `btmgmt`
//! - [`peripheral`] - Setup sequence and ordered shutdown
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wifi_beacon_ble::{BeaconConfig, Peripheral, PlatformBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BeaconConfig::new().with_intervals(32, 56);
//! let mut peripheral = Peripheral::new(config, PlatformBackend::new());
//!
//! peripheral
//!     .run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
mod error;
pub mod mgmt;
pub mod peripheral;
pub mod profile;
mod workaround;

// Public API exports
pub use backend::mock::{BackendCall, BackendStep, MockBackend};
pub use backend::{PeripheralBackend, PlatformBackend};
pub use config::{AdvertisementParams, BeaconConfig};
pub use error::{BeaconError, Result};
pub use mgmt::{BtMgmt, RadioSettings};
pub use peripheral::{Peripheral, PeripheralState};
pub use profile::{CharacteristicSpec, GattProfile, UuidScheme, WifiCredentials};
pub use workaround::BluetoothctlWorkaround;
