//! Command execution and dispatch

use std::fmt::Write as _;

use tracing::{info, warn};
use wifi_beacon_ble::{GattProfile, Peripheral, PlatformBackend};

use crate::cli::Commands;
use crate::config::AppConfig;
use crate::error::Result;

/// Dispatches a parsed command against the loaded configuration
pub struct CommandDispatcher;

impl CommandDispatcher {
    pub async fn execute(command: Commands, config: AppConfig) -> Result<()> {
        match command {
            Commands::Run => Self::run(config).await,
            Commands::Profile { show_secrets } => {
                let profile = config.ble.profile()?;
                print!("{}", render_profile(&profile, show_secrets));
                Ok(())
            }
            Commands::Config { example } => {
                if example {
                    println!("{}", AppConfig::example_config());
                } else {
                    println!("{}", config.to_toml()?);
                }
                Ok(())
            }
        }
    }

    /// Serve and advertise until Ctrl-C
    async fn run(config: AppConfig) -> Result<()> {
        let mut peripheral = Peripheral::new(config.ble, PlatformBackend::new());

        peripheral
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for interrupt: {}", e);
                }
            })
            .await?;

        info!("Peripheral stopped");
        Ok(())
    }
}

/// Human-readable GATT table. The `psk` characteristic is masked unless
/// `show_secrets` is set.
pub fn render_profile(profile: &GattProfile, show_secrets: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "service {}", profile.service_uuid);

    for characteristic in &profile.characteristics {
        let value = String::from_utf8_lossy(&characteristic.read()).into_owned();
        let shown = if characteristic.name == "psk" && !show_secrets {
            "*".repeat(value.chars().count())
        } else {
            value
        };
        let _ = writeln!(
            out,
            "  {} {:<6} read,write  {:?}",
            characteristic.uuid, characteristic.name, shown
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_profile_masks_psk() {
        let profile = AppConfig::default().ble.profile().unwrap();
        let rendered = render_profile(&profile, false);

        assert!(rendered.starts_with("service 67891000-0000-1000-8000-00805f9b34fb"));
        assert!(rendered.contains("AA:BB:CC:DD:EE:FF"));
        assert!(rendered.contains("example-test"));
        assert!(!rendered.contains("N0t$oSecure0verB!E"));
        assert!(rendered.contains(&"*".repeat(18)));
        assert_eq!(rendered.lines().count(), 4);
    }

    #[test]
    fn test_render_profile_with_secrets() {
        let profile = AppConfig::default().ble.profile().unwrap();
        let rendered = render_profile(&profile, true);
        assert!(rendered.contains("N0t$oSecure0verB!E"));
    }

    #[tokio::test]
    async fn test_profile_command_succeeds() {
        let command = Commands::Profile { show_secrets: false };
        assert!(CommandDispatcher::execute(command, AppConfig::default())
            .await
            .is_ok());
    }
}
