//! wifi-beacon - advertise the Wi-Fi credentials GATT service until Ctrl-C

use std::path::Path;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wifi_beacon_cli::{cli::Cli, commands::CommandDispatcher, config::AppConfig};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = match AppConfig::load(cli.config.as_deref().map(Path::new)) {
        Ok(config) => config,
        Err(e) => {
            setup_logging(cli.verbose);
            error!("{}", e);
            std::process::exit(1);
        }
    };
    config.apply_overrides(cli.adapter.clone(), cli.verbose);

    // Initialize logging
    setup_logging(config.logging.verbose);

    // Execute the command
    if let Err(e) = CommandDispatcher::execute(cli.command(), config).await {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("wifi-beacon exited successfully");
}

/// Setup logging based on verbosity level; `RUST_LOG` takes precedence
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
