// Value types passed between the controller, the mixer and the motors

use serde::Serialize;

// Stick reading for one loop iteration, both values in [-1.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisPair {
    pub yaw: f32,
    pub throttle: f32,
}

impl AxisPair {
    pub fn new(yaw: f32, throttle: f32) -> Self {
        Self { yaw, throttle }
    }
}

// Mixer output -> motor sink
// Default is the stopped pair
// Serialized for the command log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PowerPair {
    pub left: i32,
    pub right: i32,
}

impl PowerPair {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Current motor power ceiling
pub type PowerLevel = i32;

/// Link state between the loop and the handheld controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Searching,
    Bound,
}
