//! `bluetoothctl advertise on` workaround
//!
//! On some BlueZ versions a registered advertisement is not broadcast until
//! `bluetoothctl` has toggled advertising itself. The child process is killed
//! when the workaround is dropped.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, error, warn};

use crate::error::Result;

pub struct BluetoothctlWorkaround {
    bin_path: String,
    child: Option<Child>,
}

impl BluetoothctlWorkaround {
    pub fn new(bin_path: impl Into<String>) -> Self {
        Self {
            bin_path: bin_path.into(),
            child: None,
        }
    }

    /// Arguments passed to `bluetoothctl`
    pub fn args() -> [&'static str; 2] {
        ["advertise", "on"]
    }

    /// Spawn `bluetoothctl advertise on`. Failing to spawn is logged and
    /// otherwise ignored.
    pub fn spawn(&mut self) {
        warn!(
            "Using \"{} advertise on\" workaround to get advertising to start",
            self.bin_path
        );
        match self.try_spawn() {
            Ok(child) => self.child = Some(child),
            Err(e) => error!("Failed to run {}: {}", self.bin_path, e),
        }
    }

    fn try_spawn(&self) -> Result<Child> {
        let child = Command::new(&self.bin_path)
            .args(Self::args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;
        Ok(child)
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Wait for the tool to exit on its own. Pending forever when it was
    /// never spawned, so this can sit in a `select!` next to a shutdown
    /// signal.
    pub async fn wait(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return std::future::pending().await;
        };

        match child.wait().await {
            Ok(status) if status.success() => debug!("{} exited", self.bin_path),
            Ok(status) => error!("{} exited with {}", self.bin_path, status),
            Err(e) => error!("Error from {}: {}", self.bin_path, e),
        }
        self.child = None;
        warn!("Exited {}", self.bin_path);
    }

    /// Kill the tool if it is still running. Errors are ignored since
    /// shutdown is already under way.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
