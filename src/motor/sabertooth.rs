// Sabertooth packetized serial protocol
//
// Packet format: [Address, Command, Data, Checksum]
// Checksum = (Address + Command + Data) & 0x7F. Writes are not acknowledged.

use serialport::{self, SerialPort};
use std::io::Write;
use std::time::Duration;
use tracing::debug;

/// Default serial configuration for a Sabertooth in packetized mode
pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_ADDRESS: u8 = 128;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Largest data byte the controller accepts
pub const MAX_DATA: u8 = 127;

/// Power magnitude that maps to full scale
pub const FULL_SCALE_POWER: i32 = 100;

/// Bauding byte, sent once so the controller locks on to our baud rate
const AUTOBAUD: u8 = 0xAA;

/// Command set (packetized serial, single-motor commands)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Motor1Forward = 0,
    Motor1Backward = 1,
    Motor2Forward = 4,
    Motor2Backward = 5,
}

/// Motor channels on a dual controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Channel {
    Motor1,
    Motor2,
}

impl Channel {
    fn command(self, forward: bool) -> Command {
        match (self, forward) {
            (Channel::Motor1, true) => Command::Motor1Forward,
            (Channel::Motor1, false) => Command::Motor1Backward,
            (Channel::Motor2, true) => Command::Motor2Forward,
            (Channel::Motor2, false) => Command::Motor2Backward,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SabertoothError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid address {0}, must be 128..=135")]
    InvalidAddress(u8),
}

pub type Result<T> = std::result::Result<T, SabertoothError>;

/// Serial link to one Sabertooth controller
pub struct SabertoothBus {
    port: Box<dyn SerialPort>,
    address: u8,
}

impl SabertoothBus {
    pub fn open_with(port_name: &str, address: u8, baudrate: u32) -> Result<Self> {
        if !(128..=135).contains(&address) {
            return Err(SabertoothError::InvalidAddress(address));
        }

        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        let mut bus = Self { port, address };
        bus.send(&[AUTOBAUD])?;
        Ok(bus)
    }

    /// 7-bit checksum over address, command and data
    fn checksum(address: u8, command: u8, data: u8) -> u8 {
        (address.wrapping_add(command).wrapping_add(data)) & 0x7F
    }

    fn build_packet(address: u8, command: Command, data: u8) -> [u8; 4] {
        let command = command as u8;
        [address, command, data, Self::checksum(address, command, data)]
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    /// Drive one channel at a signed power in [-FULL_SCALE_POWER, FULL_SCALE_POWER]
    pub fn drive(&mut self, channel: Channel, power: i32) -> Result<()> {
        let (command, data) = encode_power(channel, power);
        debug!("Sabertooth {:?}: command={:?} data={}", channel, command, data);
        let packet = Self::build_packet(self.address, command, data);
        self.send(&packet)
    }
}

/// Split signed power into a direction command and a 0..=127 magnitude
fn encode_power(channel: Channel, power: i32) -> (Command, u8) {
    let clamped = power.clamp(-FULL_SCALE_POWER, FULL_SCALE_POWER);
    let data = clamped.unsigned_abs() * MAX_DATA as u32 / FULL_SCALE_POWER as u32;
    (channel.command(clamped >= 0), data as u8)
}
