//! Peripheral lifecycle: configure the adapter, serve the profile, advertise,
//! and release everything on shutdown.

use std::fmt;
use std::future::Future;

use tracing::{debug, info, warn};

use crate::backend::PeripheralBackend;
use crate::config::BeaconConfig;
use crate::error::{BeaconError, Result};
use crate::mgmt::BtMgmt;
use crate::profile::GattProfile;
use crate::workaround::BluetoothctlWorkaround;

// ----------------------------------------------------------------------------
// State
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralState {
    /// Nothing acquired yet
    Idle,
    /// GATT application registered, not yet advertising
    Registered,
    Advertising,
    /// All handles released; terminal
    Stopped,
}

impl fmt::Display for PeripheralState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Registered => "registered",
            Self::Advertising => "advertising",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

// ----------------------------------------------------------------------------
// Peripheral
// ----------------------------------------------------------------------------

/// Drives the setup sequence against a [`PeripheralBackend`]
pub struct Peripheral<B: PeripheralBackend> {
    config: BeaconConfig,
    backend: B,
    state: PeripheralState,
    adapter_id: Option<String>,
    profile: Option<GattProfile>,
    agent_registered: bool,
    application_served: bool,
}

impl<B: PeripheralBackend> Peripheral<B> {
    pub fn new(config: BeaconConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            state: PeripheralState::Idle,
            adapter_id: None,
            profile: None,
            agent_registered: false,
            application_served: false,
        }
    }

    pub fn state(&self) -> PeripheralState {
        self.state
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Identifier of the opened adapter, once started
    pub fn adapter_id(&self) -> Option<&str> {
        self.adapter_id.as_deref()
    }

    /// Profile being served, once started
    pub fn profile(&self) -> Option<&GattProfile> {
        self.profile.as_ref()
    }

    /// Run the setup sequence up to and including advertising.
    ///
    /// On failure whatever was already acquired is released and the
    /// peripheral ends up `Stopped`.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != PeripheralState::Idle {
            return Err(BeaconError::InvalidState {
                state: self.state.to_string(),
                operation: "start".to_string(),
            });
        }

        if let Err(e) = self.setup().await {
            let _ = self.release().await;
            self.state = PeripheralState::Stopped;
            return Err(e);
        }
        Ok(())
    }

    async fn setup(&mut self) -> Result<()> {
        self.config.validate()?;
        let profile = self.config.profile()?;

        let adapter_id = self
            .backend
            .open_adapter(self.config.adapter.name.as_deref())
            .await?;
        info!("Using Bluetooth adapter {}", adapter_id);
        self.adapter_id = Some(adapter_id.clone());

        if self.config.radio.reconfigure {
            BtMgmt::with_binary(&adapter_id, &self.config.radio.btmgmt_path)
                .apply(&self.config.radio_settings())
                .await?;
        }

        self.backend
            .configure_adapter(&self.config.adapter_settings())
            .await?;

        if self.config.adapter.register_agent {
            self.backend.register_agent().await?;
            self.agent_registered = true;
        }

        for characteristic in &profile.characteristics {
            debug!("Characteristic {} ({})", characteristic.uuid, characteristic.name);
        }
        self.backend.serve_application(&profile).await?;
        self.application_served = true;
        self.state = PeripheralState::Registered;
        info!("Registered GATT service {}", profile.service_uuid);

        let params = self.config.advertisement(&profile);
        self.backend.start_advertising(&params).await?;
        self.state = PeripheralState::Advertising;
        info!(
            "Advertising as '{}' ({}-{} ms)",
            params.local_name,
            params.min_interval.as_millis(),
            params.max_interval.as_millis()
        );

        self.profile = Some(profile);
        Ok(())
    }

    /// Start, then block until `shutdown` resolves and release everything
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        tokio::pin!(shutdown);

        if self.config.workaround.bluetoothctl {
            let mut workaround =
                BluetoothctlWorkaround::new(self.config.workaround.bluetoothctl_path.clone());
            workaround.spawn();

            let tool_exited = tokio::select! {
                _ = &mut shutdown => false,
                _ = workaround.wait() => true,
            };
            if tool_exited {
                (&mut shutdown).await;
            }
            workaround.stop().await;
        } else {
            info!("Using normal bluetooth flow without workarounds");
            (&mut shutdown).await;
        }

        info!("Shutting down");
        self.shutdown().await
    }

    /// Release advertisement, application and agent, in that order.
    /// Calling it again is a no-op.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.state == PeripheralState::Stopped {
            return Ok(());
        }
        let result = self.release().await;
        self.state = PeripheralState::Stopped;
        result
    }

    async fn release(&mut self) -> Result<()> {
        let mut first_error = None;

        if self.state == PeripheralState::Advertising {
            if let Err(e) = self.backend.stop_advertising().await {
                warn!("Failed to stop advertising: {}", e);
                first_error.get_or_insert(e);
            }
        }

        if std::mem::take(&mut self.application_served) {
            if let Err(e) = self.backend.close_application().await {
                warn!("Failed to unregister application: {}", e);
                first_error.get_or_insert(e);
            }
        }

        if std::mem::take(&mut self.agent_registered) {
            if let Err(e) = self.backend.unregister_agent().await {
                warn!("Failed to unregister agent: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{BackendCall, MockBackend};

    fn config() -> BeaconConfig {
        BeaconConfig::default().with_bluetoothctl_workaround(false)
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut peripheral = Peripheral::new(config(), MockBackend::new());
        assert_eq!(peripheral.state(), PeripheralState::Idle);

        peripheral.start().await.unwrap();
        assert_eq!(peripheral.state(), PeripheralState::Advertising);
        assert_eq!(peripheral.adapter_id(), Some("hci0"));
        assert!(peripheral.backend().is_advertising());

        peripheral.shutdown().await.unwrap();
        assert_eq!(peripheral.state(), PeripheralState::Stopped);
        assert!(!peripheral.backend().is_advertising());
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let mut peripheral = Peripheral::new(config(), MockBackend::new());
        peripheral.start().await.unwrap();
        assert!(matches!(
            peripheral.start().await,
            Err(BeaconError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let mut peripheral = Peripheral::new(config(), MockBackend::new());
        peripheral.start().await.unwrap();
        peripheral.shutdown().await.unwrap();
        let calls = peripheral.backend().calls().len();

        peripheral.shutdown().await.unwrap();
        assert_eq!(peripheral.backend().calls().len(), calls);
    }

    #[tokio::test]
    async fn test_agent_can_be_skipped() {
        let mut config = config();
        config.adapter.register_agent = false;
        let mut peripheral = Peripheral::new(config, MockBackend::new());
        peripheral.start().await.unwrap();
        peripheral.shutdown().await.unwrap();

        let calls = peripheral.backend().calls();
        assert!(!calls.contains(&BackendCall::RegisterAgent));
        assert!(!calls.contains(&BackendCall::UnregisterAgent));
    }
}
