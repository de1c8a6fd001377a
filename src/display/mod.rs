// Four-line status display
//
// DisplayState is owned by the control loop; the renderer draws it onto a
// 128x32 canvas and pushes that to whatever device is attached.

pub mod canvas;
pub mod terminal;

use embedded_graphics::{
    mono_font::{ascii::FONT_5X8, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use tracing::{info, warn};

pub use canvas::MonoCanvas;
pub use terminal::TerminalPanel;

/// Vertical pitch of one text line, in pixels
pub const LINE_HEIGHT: i32 = 8;

/// Number of text lines on the panel
pub const LINE_COUNT: usize = 4;

/// Line slots, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Address = 0,
    Battery = 1,
    Status = 2,
    Prompt = 3,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    lines: [String; LINE_COUNT],
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one line; returns false if the text was already shown
    pub fn set(&mut self, line: Line, text: impl Into<String>) -> bool {
        let text = text.into();
        let slot = &mut self.lines[line as usize];
        if *slot == text {
            return false;
        }
        *slot = text;
        true
    }

    pub fn get(&self, line: Line) -> &str {
        &self.lines[line as usize]
    }

    pub fn lines(&self) -> &[String; LINE_COUNT] {
        &self.lines
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("Display not present: {0}")]
    Absent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output device for a finished canvas
pub trait DisplayDevice {
    fn flush(&mut self, canvas: &MonoCanvas) -> Result<(), DisplayError>;
}

pub struct Renderer {
    canvas: MonoCanvas,
    device: Option<Box<dyn DisplayDevice>>,
}

impl Renderer {
    pub fn new(device: Box<dyn DisplayDevice>) -> Self {
        Self {
            canvas: MonoCanvas::new(),
            device: Some(device),
        }
    }

    /// Renderer with nothing attached; draws to the canvas only
    pub fn headless() -> Self {
        Self {
            canvas: MonoCanvas::new(),
            device: None,
        }
    }

    /// Use the device if it opened, otherwise log and run headless
    pub fn open_or_headless(device: Result<Box<dyn DisplayDevice>, DisplayError>) -> Self {
        match device {
            Ok(device) => Self::new(device),
            Err(e) => {
                warn!("Unable to set-up display: {}", e);
                Self::headless()
            }
        }
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn canvas(&self) -> &MonoCanvas {
        &self.canvas
    }

    /// Clear, draw all four lines, push to the device
    pub fn render(&mut self, state: &DisplayState) {
        let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);

        // MonoCanvas drawing is infallible
        let _ = self.canvas.clear(BinaryColor::Off);
        for (i, text) in state.lines().iter().enumerate() {
            let origin = Point::new(0, i as i32 * LINE_HEIGHT);
            let _ = Text::with_baseline(text, origin, style, Baseline::Top).draw(&mut self.canvas);
        }

        let Some(device) = self.device.as_mut() else {
            return;
        };
        if let Err(e) = device.flush(&self.canvas) {
            warn!("Display update failed, continuing without display: {}", e);
            self.device = None;
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if self.device.is_some() {
            info!("Releasing display");
        }
    }
}
