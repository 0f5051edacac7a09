//! Linux backend using bluer (BlueZ)

use std::collections::BTreeSet;

use bluer::adv::{Advertisement, AdvertisementHandle, Feature};
use bluer::agent::{Agent, AgentHandle};
use bluer::gatt::local::{
    Application, ApplicationHandle, Characteristic, CharacteristicRead, CharacteristicWrite,
    CharacteristicWriteMethod, ReqError, Service,
};
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::config::{AdapterSettings, AdvertisementParams};
use crate::error::{BeaconError, Result};
use crate::profile::{CharacteristicSpec, GattProfile};

use super::PeripheralBackend;

// ----------------------------------------------------------------------------
// Linux Implementation
// ----------------------------------------------------------------------------

/// BlueZ backend. Dropping a handle unregisters the object from BlueZ.
pub struct BluezBackend {
    session: Option<bluer::Session>,
    adapter: Option<bluer::Adapter>,
    agent: Option<AgentHandle>,
    application: Option<ApplicationHandle>,
    advertisement: Option<AdvertisementHandle>,
}

impl BluezBackend {
    pub fn new() -> Self {
        Self {
            session: None,
            adapter: None,
            agent: None,
            application: None,
            advertisement: None,
        }
    }

    fn adapter(&self) -> Result<&bluer::Adapter> {
        self.adapter
            .as_ref()
            .ok_or_else(|| BeaconError::AdapterUnavailable("adapter not opened".to_string()))
    }

    fn session(&self) -> Result<&bluer::Session> {
        self.session
            .as_ref()
            .ok_or_else(|| BeaconError::Session("session not opened".to_string()))
    }
}

impl Default for BluezBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate the profile into a bluer application
fn application(profile: &GattProfile) -> Application {
    Application {
        services: vec![Service {
            uuid: profile.service_uuid,
            primary: true,
            characteristics: profile.characteristics.iter().map(characteristic).collect(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn characteristic(spec: &CharacteristicSpec) -> Characteristic {
    let reader = spec.clone();
    let writer = spec.clone();

    Characteristic {
        uuid: spec.uuid,
        read: Some(CharacteristicRead {
            read: true,
            fun: Box::new(move |req| {
                debug!(
                    "Read of {} by {} at offset {}",
                    reader.name, req.device_address, req.offset
                );
                let value = reader.read_at(req.offset as usize);
                async move { value.ok_or(ReqError::InvalidOffset) }.boxed()
            }),
            ..Default::default()
        }),
        write: Some(CharacteristicWrite {
            write: true,
            write_without_response: true,
            method: CharacteristicWriteMethod::Fun(Box::new(move |value, req| {
                debug!("Write to {} by {}", writer.name, req.device_address);
                writer.write(&value);
                async move { Ok(()) }.boxed()
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Map BlueZ include names onto bluer features
fn system_includes(includes: &[String]) -> BTreeSet<Feature> {
    includes
        .iter()
        .filter_map(|name| match name.as_str() {
            "tx-power" => Some(Feature::TxPower),
            "appearance" => Some(Feature::Appearance),
            "local-name" => Some(Feature::LocalName),
            other => {
                warn!("Ignoring unknown advertisement include '{}'", other);
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl PeripheralBackend for BluezBackend {
    async fn open_adapter(&mut self, name: Option<&str>) -> Result<String> {
        let session = bluer::Session::new()
            .await
            .map_err(|e| BeaconError::Session(format!("BlueZ session: {}", e)))?;

        let adapter = match name {
            Some(name) => session.adapter(name),
            None => session.default_adapter().await,
        }
        .map_err(|e| BeaconError::AdapterUnavailable(format!("BLE adapter: {}", e)))?;

        let adapter_id = adapter.name().to_string();
        self.session = Some(session);
        self.adapter = Some(adapter);
        Ok(adapter_id)
    }

    async fn configure_adapter(&mut self, settings: &AdapterSettings) -> Result<()> {
        let adapter = self.adapter()?;

        adapter.set_alias(settings.alias.clone()).await.map_err(|e| {
            BeaconError::AdapterConfiguration(format!("Failed to set alias: {}", e))
        })?;

        if settings.powered && !adapter.is_powered().await.unwrap_or(false) {
            info!("Powering adapter {}", adapter.name());
            adapter.set_powered(true).await.map_err(|e| {
                BeaconError::AdapterConfiguration(format!(
                    "Failed to power on adapter {}: {}",
                    adapter.name(),
                    e
                ))
            })?;
        }

        adapter.set_pairable(settings.pairable).await.map_err(|e| {
            BeaconError::AdapterConfiguration(format!("Failed to set pairable: {}", e))
        })?;

        Ok(())
    }

    async fn register_agent(&mut self) -> Result<()> {
        // No callbacks means BlueZ treats it as NoInputNoOutput
        let agent = Agent {
            request_default: true,
            ..Default::default()
        };
        let handle = self
            .session()?
            .register_agent(agent)
            .await
            .map_err(|e| BeaconError::Agent(e.to_string()))?;
        self.agent = Some(handle);
        Ok(())
    }

    async fn serve_application(&mut self, profile: &GattProfile) -> Result<()> {
        let handle = self
            .adapter()?
            .serve_gatt_application(application(profile))
            .await
            .map_err(|e| BeaconError::Registration(e.to_string()))?;
        self.application = Some(handle);
        Ok(())
    }

    async fn start_advertising(&mut self, params: &AdvertisementParams) -> Result<()> {
        let advertisement = Advertisement {
            advertisement_type: bluer::adv::Type::Peripheral,
            service_uuids: params.service_uuids.iter().copied().collect(),
            local_name: Some(params.local_name.clone()),
            discoverable: Some(params.discoverable),
            min_interval: Some(params.min_interval),
            max_interval: Some(params.max_interval),
            system_includes: system_includes(&params.includes),
            ..Default::default()
        };
        debug!("{:?}", &advertisement);

        let handle = self
            .adapter()?
            .advertise(advertisement)
            .await
            .map_err(|e| BeaconError::Advertising(e.to_string()))?;
        self.advertisement = Some(handle);
        Ok(())
    }

    async fn stop_advertising(&mut self) -> Result<()> {
        if let Some(handle) = self.advertisement.take() {
            drop(handle);
            info!("Removed advertisement");
        }
        Ok(())
    }

    async fn close_application(&mut self) -> Result<()> {
        if let Some(handle) = self.application.take() {
            drop(handle);
            info!("Unregistered GATT application");
        }
        Ok(())
    }

    async fn unregister_agent(&mut self) -> Result<()> {
        if let Some(handle) = self.agent.take() {
            drop(handle);
            debug!("Unregistered agent");
        }
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        self.advertisement.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeaconConfig;

    #[test]
    fn test_application_layout() {
        let profile = BeaconConfig::default().profile().unwrap();
        let app = application(&profile);

        assert_eq!(app.services.len(), 1);
        let service = &app.services[0];
        assert_eq!(service.uuid, profile.service_uuid);
        assert!(service.primary);
        assert_eq!(service.characteristics.len(), 3);
        for (built, spec) in service.characteristics.iter().zip(&profile.characteristics) {
            assert_eq!(built.uuid, spec.uuid);
            assert!(built.read.as_ref().map(|r| r.read).unwrap_or(false));
            assert!(built.write.as_ref().map(|w| w.write).unwrap_or(false));
        }
    }

    #[test]
    fn test_system_includes() {
        let includes = system_includes(&["tx-power".to_string(), "bogus".to_string()]);
        assert_eq!(includes.len(), 1);
        assert!(includes.contains(&Feature::TxPower));
        assert!(system_includes(&[]).is_empty());
    }
}
