// Handheld controller input
//
// Provides:
// - Named buttons and stick axes
// - Edge-triggered press sets
// - Binder/source traits for the connection lifecycle
// - Dead zone / hot zone axis conditioning

pub mod gamepad;

use std::collections::BTreeSet;
use std::fmt;

use crate::messages::AxisPair;

pub use gamepad::{GamepadBinder, GamepadSource};

/// Controller buttons, named after the PlayStation layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Button {
    Cross,
    Circle,
    Triangle,
    Square,
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
    Home,
}

impl Button {
    pub fn name(self) -> &'static str {
        match self {
            Button::Cross => "cross",
            Button::Circle => "circle",
            Button::Triangle => "triangle",
            Button::Square => "square",
            Button::L1 => "l1",
            Button::R1 => "r1",
            Button::L2 => "l2",
            Button::R2 => "r2",
            Button::Start => "start",
            Button::Select => "select",
            Button::Home => "home",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Analogue stick axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Lx,
    Ly,
    Rx,
    Ry,
}

/// Buttons pressed since the previous poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonPresses(BTreeSet<Button>);

impl ButtonPresses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, button: Button) {
        self.0.insert(button);
    }

    pub fn contains(&self, button: Button) -> bool {
        self.0.contains(&button)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Button> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Button> for ButtonPresses {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ButtonPresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Button::name).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("No controller connected")]
    NotFound,

    #[error("Input backend unavailable: {0}")]
    Backend(String),
}

/// A bound controller. Released when dropped.
pub trait InputSource {
    /// False once the controller has gone away; the source is then spent
    fn is_connected(&mut self) -> bool;

    /// Conditioned value of one axis in [-1.0, 1.0]
    fn sample(&mut self, axis: Axis) -> f32;

    /// Buttons pressed since the last call
    fn poll_presses(&mut self) -> ButtonPresses;

    /// Left stick as (yaw, throttle)
    fn axes(&mut self) -> AxisPair {
        AxisPair::new(self.sample(Axis::Lx), self.sample(Axis::Ly))
    }
}

/// Acquires a controller, failing quickly when none is present
pub trait InputBinder {
    type Source: InputSource;

    fn acquire(&mut self) -> Result<Self::Source, InputError>;
}

/// Apply a dead zone around centre and a hot zone at the ends of travel
///
/// |raw| <= dead_zone reads as 0, |raw| >= 1 - hot_zone reads as full scale,
/// and the range between is stretched linearly. Sign is preserved.
pub fn condition(raw: f32, dead_zone: f32, hot_zone: f32) -> f32 {
    let magnitude = raw.abs();
    let full = 1.0 - hot_zone;

    if magnitude <= dead_zone {
        0.0
    } else if magnitude >= full {
        raw.signum()
    } else {
        raw.signum() * (magnitude - dead_zone) / (full - dead_zone)
    }
}
