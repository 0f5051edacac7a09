//! Fallback backend for platforms without peripheral support

use tracing::warn;

use crate::config::{AdapterSettings, AdvertisementParams};
use crate::error::{BeaconError, Result};
use crate::profile::GattProfile;

use super::PeripheralBackend;

/// Backend that refuses every setup call
pub struct UnsupportedBackend;

impl UnsupportedBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnsupportedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PeripheralBackend for UnsupportedBackend {
    async fn open_adapter(&mut self, _name: Option<&str>) -> Result<String> {
        warn!(
            "BLE peripheral mode not supported on this platform. \
            Use Linux with BlueZ to serve the credentials service."
        );
        Err(BeaconError::Unsupported)
    }

    async fn configure_adapter(&mut self, _settings: &AdapterSettings) -> Result<()> {
        Err(BeaconError::Unsupported)
    }

    async fn register_agent(&mut self) -> Result<()> {
        Err(BeaconError::Unsupported)
    }

    async fn serve_application(&mut self, _profile: &GattProfile) -> Result<()> {
        Err(BeaconError::Unsupported)
    }

    async fn start_advertising(&mut self, _params: &AdvertisementParams) -> Result<()> {
        Err(BeaconError::Unsupported)
    }

    async fn stop_advertising(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close_application(&mut self) -> Result<()> {
        Ok(())
    }

    async fn unregister_agent(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_is_refused() {
        let mut backend = UnsupportedBackend::new();
        assert!(matches!(
            backend.open_adapter(None).await,
            Err(BeaconError::Unsupported)
        ));
        assert!(backend.register_agent().await.is_err());
        assert!(backend.stop_advertising().await.is_ok());
        assert!(!backend.is_advertising());
    }
}
