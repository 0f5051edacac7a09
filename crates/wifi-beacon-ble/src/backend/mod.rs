//! Seam between the peripheral sequence and the host Bluetooth stack

pub mod fallback;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod mock;

use crate::config::{AdapterSettings, AdvertisementParams};
use crate::error::Result;
use crate::profile::GattProfile;

// ----------------------------------------------------------------------------
// Backend Trait
// ----------------------------------------------------------------------------

/// Operations the peripheral needs from the Bluetooth stack.
///
/// Each `register`/`serve`/`start` call acquires a handle that the matching
/// release call gives back.
#[async_trait::async_trait]
pub trait PeripheralBackend: Send {
    /// Open the named adapter, or the default one, and return its identifier
    async fn open_adapter(&mut self, name: Option<&str>) -> Result<String>;

    /// Set alias, power and pairing on the opened adapter
    async fn configure_adapter(&mut self, settings: &AdapterSettings) -> Result<()>;

    /// Register a NoInputNoOutput agent as the default agent
    async fn register_agent(&mut self) -> Result<()>;

    /// Register the GATT application
    async fn serve_application(&mut self, profile: &GattProfile) -> Result<()>;

    /// Register the LE advertisement
    async fn start_advertising(&mut self, params: &AdvertisementParams) -> Result<()>;

    async fn stop_advertising(&mut self) -> Result<()>;

    async fn close_application(&mut self) -> Result<()>;

    async fn unregister_agent(&mut self) -> Result<()>;

    fn is_advertising(&self) -> bool;
}

// ----------------------------------------------------------------------------
// Platform Detection and Factory
// ----------------------------------------------------------------------------

/// Platform-specific backend enum
pub enum PlatformBackend {
    #[cfg(target_os = "linux")]
    Linux(linux::BluezBackend),
    #[allow(dead_code)]
    Unsupported(fallback::UnsupportedBackend),
}

impl PlatformBackend {
    /// Create the appropriate backend for the current platform
    pub fn new() -> Self {
        #[cfg(target_os = "linux")]
        {
            Self::Linux(linux::BluezBackend::new())
        }
        #[cfg(not(target_os = "linux"))]
        {
            Self::Unsupported(fallback::UnsupportedBackend::new())
        }
    }
}

impl Default for PlatformBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PeripheralBackend for PlatformBackend {
    async fn open_adapter(&mut self, name: Option<&str>) -> Result<String> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut backend) => backend.open_adapter(name).await,
            Self::Unsupported(ref mut backend) => backend.open_adapter(name).await,
        }
    }

    async fn configure_adapter(&mut self, settings: &AdapterSettings) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut backend) => backend.configure_adapter(settings).await,
            Self::Unsupported(ref mut backend) => backend.configure_adapter(settings).await,
        }
    }

    async fn register_agent(&mut self) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut backend) => backend.register_agent().await,
            Self::Unsupported(ref mut backend) => backend.register_agent().await,
        }
    }

    async fn serve_application(&mut self, profile: &GattProfile) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut backend) => backend.serve_application(profile).await,
            Self::Unsupported(ref mut backend) => backend.serve_application(profile).await,
        }
    }

    async fn start_advertising(&mut self, params: &AdvertisementParams) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut backend) => backend.start_advertising(params).await,
            Self::Unsupported(ref mut backend) => backend.start_advertising(params).await,
        }
    }

    async fn stop_advertising(&mut self) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut backend) => backend.stop_advertising().await,
            Self::Unsupported(ref mut backend) => backend.stop_advertising().await,
        }
    }

    async fn close_application(&mut self) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut backend) => backend.close_application().await,
            Self::Unsupported(ref mut backend) => backend.close_application().await,
        }
    }

    async fn unregister_agent(&mut self) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut backend) => backend.unregister_agent().await,
            Self::Unsupported(ref mut backend) => backend.unregister_agent().await,
        }
    }

    fn is_advertising(&self) -> bool {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref backend) => backend.is_advertising(),
            Self::Unsupported(ref backend) => backend.is_advertising(),
        }
    }
}
