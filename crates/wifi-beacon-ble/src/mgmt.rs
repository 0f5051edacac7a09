//! Low-level radio reconfiguration through BlueZ's `btmgmt` tool
//!
//! Some controllers only advertise reliably once BR/EDR is switched off and
//! the adapter is cycled into LE-only mode. BlueZ exposes those switches over
//! the management socket; `btmgmt` is the stock frontend for it.

use std::fmt;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{BeaconError, Result};

// ----------------------------------------------------------------------------
// Settings
// ----------------------------------------------------------------------------

/// A single on/off switch understood by `btmgmt`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MgmtSetting {
    Pairable,
    Powered,
    BrEdr,
    Le,
    Privacy,
    FastConnectable,
    Bondable,
}

impl MgmtSetting {
    /// The `btmgmt` subcommand for this setting
    pub fn command(&self) -> &'static str {
        match self {
            Self::Pairable => "pairable",
            Self::Powered => "power",
            Self::BrEdr => "bredr",
            Self::Le => "le",
            Self::Privacy => "privacy",
            Self::FastConnectable => "fast-conn",
            Self::Bondable => "bondable",
        }
    }
}

impl fmt::Display for MgmtSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Target radio state applied by [`BtMgmt::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioSettings {
    pub pairable: bool,
    pub bredr: bool,
    pub le: bool,
    pub privacy: bool,
    pub fast_connectable: bool,
    pub bondable: bool,
}

impl RadioSettings {
    /// Non-pairable, non-bondable, LE-only radio without privacy
    pub fn low_energy_only() -> Self {
        Self {
            pairable: false,
            bredr: false,
            le: true,
            privacy: false,
            fast_connectable: true,
            bondable: false,
        }
    }

    /// Ordered steps: the adapter is powered down while the mode changes
    pub fn steps(&self) -> Vec<(MgmtSetting, bool)> {
        vec![
            (MgmtSetting::Pairable, self.pairable),
            (MgmtSetting::Powered, false),
            (MgmtSetting::BrEdr, self.bredr),
            (MgmtSetting::Le, self.le),
            (MgmtSetting::Privacy, self.privacy),
            (MgmtSetting::FastConnectable, self.fast_connectable),
            (MgmtSetting::Bondable, self.bondable),
            (MgmtSetting::Powered, true),
        ]
    }
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self::low_energy_only()
    }
}

// ----------------------------------------------------------------------------
// btmgmt Wrapper
// ----------------------------------------------------------------------------

/// Runs `btmgmt` against one adapter
#[derive(Debug, Clone)]
pub struct BtMgmt {
    adapter_id: String,
    bin_path: String,
}

impl BtMgmt {
    pub fn new(adapter_id: impl Into<String>) -> Self {
        Self::with_binary(adapter_id, "btmgmt")
    }

    pub fn with_binary(adapter_id: impl Into<String>, bin_path: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            bin_path: bin_path.into(),
        }
    }

    pub fn adapter_id(&self) -> &str {
        &self.adapter_id
    }

    pub fn bin_path(&self) -> &str {
        &self.bin_path
    }

    /// Arguments passed to `btmgmt` for one switch
    pub fn args(&self, setting: MgmtSetting, on: bool) -> Vec<String> {
        vec![
            "--index".to_string(),
            self.adapter_id.clone(),
            setting.command().to_string(),
            if on { "on" } else { "off" }.to_string(),
        ]
    }

    /// Flip a single switch
    pub async fn set(&self, setting: MgmtSetting, on: bool) -> Result<()> {
        let args = self.args(setting, on);
        debug!("Running {} {}", self.bin_path, args.join(" "));

        let output = Command::new(&self.bin_path).args(&args).output().await?;
        if !output.status.success() {
            return Err(BeaconError::Management {
                command: format!("{} {}", self.bin_path, args.join(" ")),
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }

    pub async fn set_pairable(&self, on: bool) -> Result<()> {
        self.set(MgmtSetting::Pairable, on).await
    }

    pub async fn set_powered(&self, on: bool) -> Result<()> {
        self.set(MgmtSetting::Powered, on).await
    }

    pub async fn set_bredr(&self, on: bool) -> Result<()> {
        self.set(MgmtSetting::BrEdr, on).await
    }

    pub async fn set_le(&self, on: bool) -> Result<()> {
        self.set(MgmtSetting::Le, on).await
    }

    pub async fn set_privacy(&self, on: bool) -> Result<()> {
        self.set(MgmtSetting::Privacy, on).await
    }

    pub async fn set_fast_connectable(&self, on: bool) -> Result<()> {
        self.set(MgmtSetting::FastConnectable, on).await
    }

    pub async fn set_bondable(&self, on: bool) -> Result<()> {
        self.set(MgmtSetting::Bondable, on).await
    }

    /// Apply the full settings sequence.
    ///
    /// Failing to set pairable aborts; later steps only warn.
    pub async fn apply(&self, settings: &RadioSettings) -> Result<()> {
        info!("Reconfiguring radio of {} via {}", self.adapter_id, self.bin_path);

        for (setting, on) in settings.steps() {
            match self.set(setting, on).await {
                Ok(()) => {}
                Err(e) if setting == MgmtSetting::Pairable => return Err(e),
                Err(e) => warn!("Ignoring failed radio step {} {}: {}", setting, on, e),
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
