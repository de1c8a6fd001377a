// Differential drive on a dual-channel Sabertooth
//
// Motor 1 drives the right-hand wheels, motor 2 the left-hand wheels.

use tracing::{info, warn};

use super::sabertooth::{Channel, SabertoothBus, SabertoothError};
use super::MotorSink;
use crate::messages::PowerPair;

pub const CHANNEL_LEFT: Channel = Channel::Motor2;
pub const CHANNEL_RIGHT: Channel = Channel::Motor1;

pub struct MotorDriver {
    bus: SabertoothBus,
}

impl MotorDriver {
    /// Connect to the controller on the given serial port
    pub fn open(port: &str, address: u8, baudrate: u32) -> Result<Self, SabertoothError> {
        info!("Opening motor controller on {} (address {})", port, address);
        let bus = SabertoothBus::open_with(port, address, baudrate)?;
        Ok(Self { bus })
    }

    fn write(&mut self, power: PowerPair) -> Result<(), SabertoothError> {
        self.bus.drive(CHANNEL_RIGHT, power.right)?;
        self.bus.drive(CHANNEL_LEFT, power.left)
    }
}

impl MotorSink for MotorDriver {
    fn set_speeds(&mut self, power: PowerPair) {
        if let Err(e) = self.write(power) {
            warn!("Failed to send motor powers {:?}: {}", power, e);
        }
    }

    fn stop(&mut self) {
        info!("Motors stopped!");
        if let Err(e) = self.write(PowerPair::zero()) {
            warn!("Failed to stop motors: {}", e);
        }
    }
}

impl Drop for MotorDriver {
    fn drop(&mut self) {
        // Never leave the wheels turning once the driver is gone
        if let Err(e) = self.write(PowerPair::zero()) {
            warn!("Failed to stop motors on drop: {}", e);
        }
    }
}
