//! Mock backend that records every call, for tests

use uuid::Uuid;

use crate::config::{AdapterSettings, AdvertisementParams};
use crate::error::{BeaconError, Result};
use crate::profile::GattProfile;

use super::PeripheralBackend;

/// A call received by [`MockBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    OpenAdapter(Option<String>),
    ConfigureAdapter(AdapterSettings),
    RegisterAgent,
    ServeApplication { service: Uuid, characteristics: Vec<Uuid> },
    StartAdvertising(AdvertisementParams),
    StopAdvertising,
    CloseApplication,
    UnregisterAgent,
}

/// Setup step a [`MockBackend`] can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStep {
    OpenAdapter,
    ConfigureAdapter,
    RegisterAgent,
    ServeApplication,
    StartAdvertising,
}

/// In-memory backend recording calls in order
pub struct MockBackend {
    adapter_id: String,
    fail_at: Option<BackendStep>,
    calls: Vec<BackendCall>,
    served: Option<GattProfile>,
    advertising: bool,
}

impl MockBackend {
    /// Create a new mock backend exposing adapter `hci0`
    pub fn new() -> Self {
        Self {
            adapter_id: "hci0".to_string(),
            fail_at: None,
            calls: Vec::new(),
            served: None,
            advertising: false,
        }
    }

    /// Make the given setup step fail
    pub fn failing_at(mut self, step: BackendStep) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Calls received so far (for verification)
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Profile currently registered, if any
    pub fn served_profile(&self) -> Option<&GattProfile> {
        self.served.as_ref()
    }

    fn check(&self, step: BackendStep) -> Result<()> {
        if self.fail_at == Some(step) {
            return Err(match step {
                BackendStep::OpenAdapter => BeaconError::AdapterUnavailable("mock".to_string()),
                BackendStep::ConfigureAdapter => {
                    BeaconError::AdapterConfiguration("mock".to_string())
                }
                BackendStep::RegisterAgent => BeaconError::Agent("mock".to_string()),
                BackendStep::ServeApplication => BeaconError::Registration("mock".to_string()),
                BackendStep::StartAdvertising => BeaconError::Advertising("mock".to_string()),
            });
        }
        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PeripheralBackend for MockBackend {
    async fn open_adapter(&mut self, name: Option<&str>) -> Result<String> {
        self.calls.push(BackendCall::OpenAdapter(name.map(str::to_string)));
        self.check(BackendStep::OpenAdapter)?;
        Ok(name.unwrap_or(&self.adapter_id).to_string())
    }

    async fn configure_adapter(&mut self, settings: &AdapterSettings) -> Result<()> {
        self.calls.push(BackendCall::ConfigureAdapter(settings.clone()));
        self.check(BackendStep::ConfigureAdapter)
    }

    async fn register_agent(&mut self) -> Result<()> {
        self.calls.push(BackendCall::RegisterAgent);
        self.check(BackendStep::RegisterAgent)
    }

    async fn serve_application(&mut self, profile: &GattProfile) -> Result<()> {
        self.calls.push(BackendCall::ServeApplication {
            service: profile.service_uuid,
            characteristics: profile.characteristics.iter().map(|c| c.uuid).collect(),
        });
        self.check(BackendStep::ServeApplication)?;
        self.served = Some(profile.clone());
        Ok(())
    }

    async fn start_advertising(&mut self, params: &AdvertisementParams) -> Result<()> {
        self.calls.push(BackendCall::StartAdvertising(params.clone()));
        self.check(BackendStep::StartAdvertising)?;
        self.advertising = true;
        Ok(())
    }

    async fn stop_advertising(&mut self) -> Result<()> {
        self.calls.push(BackendCall::StopAdvertising);
        self.advertising = false;
        Ok(())
    }

    async fn close_application(&mut self) -> Result<()> {
        self.calls.push(BackendCall::CloseApplication);
        self.served = None;
        Ok(())
    }

    async fn unregister_agent(&mut self) -> Result<()> {
        self.calls.push(BackendCall::UnregisterAgent);
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        self.advertising
    }
}
