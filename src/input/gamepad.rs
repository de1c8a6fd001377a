// Gamepad input through gilrs
//
// One gilrs context lives as long as the binder; every bound source shares
// it. Opening a context starts a hotplug thread, so it is done once.

use std::cell::RefCell;
use std::rc::Rc;

use gilrs::{EventType, GamepadId, Gilrs};
use tracing::{debug, info, warn};

use super::{condition, Axis, Button, ButtonPresses, InputBinder, InputError, InputSource};

/// Map a gilrs button to the PlayStation-style names used by the loop
fn button_from_gilrs(button: gilrs::Button) -> Option<Button> {
    match button {
        gilrs::Button::South => Some(Button::Cross),
        gilrs::Button::East => Some(Button::Circle),
        gilrs::Button::North => Some(Button::Triangle),
        gilrs::Button::West => Some(Button::Square),
        gilrs::Button::LeftTrigger => Some(Button::L1),
        gilrs::Button::RightTrigger => Some(Button::R1),
        gilrs::Button::LeftTrigger2 => Some(Button::L2),
        gilrs::Button::RightTrigger2 => Some(Button::R2),
        gilrs::Button::Start => Some(Button::Start),
        gilrs::Button::Select => Some(Button::Select),
        gilrs::Button::Mode => Some(Button::Home),
        _ => None,
    }
}

fn axis_to_gilrs(axis: Axis) -> gilrs::Axis {
    match axis {
        Axis::Lx => gilrs::Axis::LeftStickX,
        Axis::Ly => gilrs::Axis::LeftStickY,
        Axis::Rx => gilrs::Axis::RightStickX,
        Axis::Ry => gilrs::Axis::RightStickY,
    }
}

/// Binds any connected gamepad
pub struct GamepadBinder {
    context: Option<Rc<RefCell<Gilrs>>>,
    open_error: Option<String>,
    contexts_opened: usize,
    dead_zone: f32,
    hot_zone: f32,
}

impl GamepadBinder {
    pub fn new(dead_zone: f32, hot_zone: f32) -> Self {
        Self {
            context: None,
            open_error: None,
            contexts_opened: 0,
            dead_zone,
            hot_zone,
        }
    }

    /// Number of gilrs contexts this binder has created
    pub fn contexts_opened(&self) -> usize {
        self.contexts_opened
    }

    /// Shared context, opened on first use. A failed open is not retried.
    fn context(&mut self) -> Result<Rc<RefCell<Gilrs>>, InputError> {
        if let Some(context) = &self.context {
            return Ok(context.clone());
        }
        if let Some(e) = &self.open_error {
            return Err(InputError::Backend(e.clone()));
        }

        self.contexts_opened += 1;
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => gilrs,
            Err(gilrs::Error::NotImplemented(dummy)) => {
                warn!("No gamepad backend on this platform");
                dummy
            }
            Err(e) => {
                warn!("Failed to open gamepad backend: {}", e);
                self.open_error = Some(e.to_string());
                return Err(InputError::Backend(e.to_string()));
            }
        };
        let context = Rc::new(RefCell::new(gilrs));
        self.context = Some(context.clone());
        Ok(context)
    }
}

impl InputBinder for GamepadBinder {
    type Source = GamepadSource;

    fn acquire(&mut self) -> Result<GamepadSource, InputError> {
        let context = self.context()?;

        let (id, name) = {
            let mut gilrs = context.borrow_mut();
            // Connection events refresh the pad list; presses made while unbound are dropped
            while gilrs.next_event().is_some() {}
            gilrs
                .gamepads()
                .next()
                .map(|(id, pad)| (id, pad.name().to_string()))
                .ok_or(InputError::NotFound)?
        };

        info!("Bound to gamepad {} ({})", name, id);
        Ok(GamepadSource {
            gilrs: context,
            id,
            connected: true,
            pending: ButtonPresses::new(),
            dead_zone: self.dead_zone,
            hot_zone: self.hot_zone,
        })
    }
}

/// One bound gamepad
pub struct GamepadSource {
    gilrs: Rc<RefCell<Gilrs>>,
    id: GamepadId,
    connected: bool,
    pending: ButtonPresses,
    dead_zone: f32,
    hot_zone: f32,
}

impl GamepadSource {
    /// Drain gilrs events, collecting presses and disconnects for our pad
    fn pump(&mut self) {
        let mut gilrs = self.gilrs.borrow_mut();
        while let Some(gilrs::Event { id, event, .. }) = gilrs.next_event() {
            if id != self.id {
                continue;
            }
            match event {
                EventType::ButtonPressed(button, _) => {
                    if let Some(button) = button_from_gilrs(button) {
                        self.pending.insert(button);
                    }
                }
                EventType::Disconnected => {
                    info!("Gamepad {} disconnected", self.id);
                    self.connected = false;
                }
                _ => {}
            }
        }
    }
}

impl InputSource for GamepadSource {
    fn is_connected(&mut self) -> bool {
        self.pump();
        self.connected && self.gilrs.borrow().gamepad(self.id).is_connected()
    }

    fn sample(&mut self, axis: Axis) -> f32 {
        let raw = self.gilrs.borrow().gamepad(self.id).value(axis_to_gilrs(axis));
        condition(raw, self.dead_zone, self.hot_zone)
    }

    fn poll_presses(&mut self) -> ButtonPresses {
        self.pump();
        std::mem::take(&mut self.pending)
    }
}

impl Drop for GamepadSource {
    fn drop(&mut self) {
        debug!("Releasing gamepad {}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_acquire_opens_one_context() {
        let mut binder = GamepadBinder::new(0.3, 0.5);
        for _ in 0..10 {
            // Bound or not, every attempt reuses the first context
            let _ = binder.acquire();
        }
        assert_eq!(binder.contexts_opened(), 1);
    }

    #[test]
    fn test_face_buttons_follow_playstation_names() {
        assert_eq!(button_from_gilrs(gilrs::Button::South), Some(Button::Cross));
        assert_eq!(button_from_gilrs(gilrs::Button::East), Some(Button::Circle));
        assert_eq!(button_from_gilrs(gilrs::Button::North), Some(Button::Triangle));
        assert_eq!(button_from_gilrs(gilrs::Button::Mode), Some(Button::Home));
    }

    #[test]
    fn test_shoulders_map_to_power_buttons() {
        assert_eq!(button_from_gilrs(gilrs::Button::LeftTrigger), Some(Button::L1));
        assert_eq!(button_from_gilrs(gilrs::Button::RightTrigger), Some(Button::R1));
    }

    #[test]
    fn test_unmapped_buttons_ignored() {
        assert_eq!(button_from_gilrs(gilrs::Button::DPadUp), None);
        assert_eq!(button_from_gilrs(gilrs::Button::Unknown), None);
    }
}
