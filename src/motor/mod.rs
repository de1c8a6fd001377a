// Motor output for the differential-drive base
//
// Provides:
// - The motor sink capability used by the control loop
// - Sabertooth packetized serial protocol and driver
// - A logging stand-in for machines without a motor controller

mod driver;
pub mod sabertooth;

use tracing::{debug, info, warn};

use crate::messages::PowerPair;

pub use driver::{MotorDriver, CHANNEL_LEFT, CHANNEL_RIGHT};
pub use sabertooth::{SabertoothBus, SabertoothError};

/// Anything that can turn the wheels. Commands are fire-and-forget.
pub trait MotorSink {
    fn set_speeds(&mut self, power: PowerPair);
    fn stop(&mut self);
}

/// Prints what would have been sent to a real controller
#[derive(Debug, Default)]
pub struct LoggingMotorSink;

impl MotorSink for LoggingMotorSink {
    fn set_speeds(&mut self, power: PowerPair) {
        match serde_json::to_string(&power) {
            Ok(json) => debug!("Motor powers: {}", json),
            Err(_) => debug!("Motor powers: {:?}", power),
        }
    }

    fn stop(&mut self) {
        info!("Motors stopping");
    }
}

/// Open the motor controller if one is configured and reachable,
/// otherwise fall back to the logging sink
pub fn open_sink(port: Option<&str>, address: u8, baudrate: u32) -> Box<dyn MotorSink> {
    let Some(port) = port else {
        info!("No motor port configured, using logging motor sink");
        return Box::new(LoggingMotorSink);
    };

    match MotorDriver::open(port, address, baudrate) {
        Ok(driver) => {
            info!("Motor controller available");
            Box::new(driver)
        }
        Err(e) => {
            warn!("No motor controller on {} ({}), using logging motor sink", port, e);
            Box::new(LoggingMotorSink)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_port_falls_back_to_logging() {
        let mut sink = open_sink(Some("/dev/does-not-exist-tiny4wd"), 128, 9600);
        // Logging sink accepts anything without panicking
        sink.set_speeds(PowerPair::new(80, -80));
        sink.stop();
    }

    #[test]
    fn test_unconfigured_port_falls_back_to_logging() {
        let mut sink = open_sink(None, 128, 9600);
        sink.set_speeds(PowerPair::zero());
    }
}
