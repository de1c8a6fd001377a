// Host-side collaborators: battery probe, restart, address lookup and the
// physical reset button

use std::future;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: String },
}

/// Run a shell command line and return its trimmed stdout
fn shell(command: &str) -> Result<String, HostError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .map_err(|source| HostError::Spawn {
            command: command.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(HostError::Failed {
            command: command.to_string(),
            status: output.status.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Produces a human-readable battery voltage report
pub trait BatteryProbe {
    fn read(&mut self) -> Result<String, HostError>;
}

/// Battery probe backed by an external command
pub struct CommandProbe {
    command: String,
}

impl CommandProbe {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl BatteryProbe for CommandProbe {
    fn read(&mut self) -> Result<String, HostError> {
        info!("Battery monitor updating");
        shell(&self.command)
    }
}

/// Operations on the machine we run on
pub trait HostControl {
    fn restart(&mut self) -> Result<(), HostError>;

    /// First address reported for this host, if any
    fn primary_address(&mut self) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct SystemHost;

impl HostControl for SystemHost {
    fn restart(&mut self) -> Result<(), HostError> {
        info!("Restarting host");
        shell("sudo shutdown -r now").map(|_| ())
    }

    fn primary_address(&mut self) -> Option<String> {
        match shell("hostname -I") {
            Ok(out) => first_address(&out),
            Err(e) => {
                warn!("Could not look up host address: {}", e);
                None
            }
        }
    }
}

fn first_address(output: &str) -> Option<String> {
    output.split_whitespace().next().map(str::to_string)
}

/// Poll period for the reset button line
pub const RESET_POLL: Duration = Duration::from_millis(50);

/// Momentary button on a sysfs GPIO line, pulled up (pressed reads 0)
pub struct ResetButton {
    value_path: Option<PathBuf>,
}

impl ResetButton {
    pub fn new(gpio: Option<u32>) -> Self {
        Self::with_value_path(gpio.map(|n| PathBuf::from(format!("/sys/class/gpio/gpio{}/value", n))))
    }

    pub fn with_value_path(value_path: Option<PathBuf>) -> Self {
        Self { value_path }
    }

    /// Resolves on the first press. Never resolves if the line is unavailable.
    pub async fn pressed(&self) {
        let Some(path) = self.value_path.as_ref() else {
            return future::pending().await;
        };
        if !path.exists() {
            info!("Reset button GPIO {} not exported, button disabled", path.display());
            return future::pending().await;
        }

        let mut tick = interval(RESET_POLL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut was_high = true;

        loop {
            tick.tick().await;
            // sysfs reads return immediately
            let level = match std::fs::read_to_string(path) {
                Ok(value) => value.trim() != "0",
                Err(e) => {
                    debug!("Reset button read failed: {}", e);
                    continue;
                }
            };
            // Falling edge
            if was_high && !level {
                warn!("Reset button pressed");
                return;
            }
            was_high = level;
        }
    }
}
