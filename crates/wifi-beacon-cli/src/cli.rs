//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Bluetooth adapter to use (e.g. hci0); defaults to the system default
    #[arg(short, long)]
    pub adapter: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve the credentials service and advertise until interrupted (default)
    Run,
    /// Print the GATT table that would be served
    Profile {
        /// Print the pre-shared key instead of masking it
        #[arg(long)]
        show_secrets: bool,
    },
    /// Print the effective configuration as TOML
    Config {
        /// Print an example configuration file instead
        #[arg(long)]
        example: bool,
    },
}

impl Cli {
    /// The subcommand to run, `run` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["wifi-beacon"]);
        assert_eq!(cli.command(), Commands::Run);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "wifi-beacon",
            "--verbose",
            "--adapter",
            "hci1",
            "--config",
            "beacon.toml",
            "profile",
            "--show-secrets",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.adapter.as_deref(), Some("hci1"));
        assert_eq!(cli.config.as_deref(), Some("beacon.toml"));
        assert_eq!(cli.command(), Commands::Profile { show_secrets: true });
    }
}
