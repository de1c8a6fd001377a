// Terminal stand-in for the OLED panel
//
// Draws the canvas with half-block characters: two pixel rows per text row.

use std::io::{self, IsTerminal, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::Print,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::warn;

use super::canvas::{MonoCanvas, HEIGHT, WIDTH};
use super::{DisplayDevice, DisplayError};

pub struct TerminalPanel {
    out: Stdout,
}

impl TerminalPanel {
    /// Take over stdout. Fails when stdout is not a terminal.
    pub fn open() -> Result<Self, DisplayError> {
        let mut out = io::stdout();
        if !out.is_terminal() {
            return Err(DisplayError::Absent("stdout is not a terminal".to_string()));
        }
        queue!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        out.flush()?;
        Ok(Self { out })
    }
}

/// Half-block glyph for a (top, bottom) pixel pair
fn cell(top: bool, bottom: bool) -> char {
    match (top, bottom) {
        (true, true) => '█',
        (true, false) => '▀',
        (false, true) => '▄',
        (false, false) => ' ',
    }
}

/// Text rows for the whole canvas
pub fn to_rows(canvas: &MonoCanvas) -> Vec<String> {
    (0..HEIGHT)
        .step_by(2)
        .map(|y| {
            (0..WIDTH)
                .map(|x| cell(canvas.get(x, y), canvas.get(x, y + 1)))
                .collect::<String>()
        })
        .collect()
}

impl DisplayDevice for TerminalPanel {
    fn flush(&mut self, canvas: &MonoCanvas) -> Result<(), DisplayError> {
        for (row, text) in to_rows(canvas).into_iter().enumerate() {
            queue!(self.out, MoveTo(0, row as u16), Print(text))?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalPanel {
    fn drop(&mut self) {
        let restored = queue!(self.out, Show, LeaveAlternateScreen).and_then(|_| self.out.flush());
        if let Err(e) = restored {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

    #[test]
    fn test_rows_cover_canvas() {
        let rows = to_rows(&MonoCanvas::new());
        assert_eq!(rows.len(), (HEIGHT / 2) as usize);
        assert!(rows.iter().all(|r| r.chars().count() == WIDTH as usize));
        assert!(rows.iter().all(|r| r.chars().all(|c| c == ' ')));
    }

    #[test]
    fn test_half_blocks() {
        let mut canvas = MonoCanvas::new();
        let _ = canvas.draw_iter([
            Pixel(Point::new(0, 0), BinaryColor::On),
            Pixel(Point::new(1, 1), BinaryColor::On),
            Pixel(Point::new(2, 0), BinaryColor::On),
            Pixel(Point::new(2, 1), BinaryColor::On),
        ]);
        let first: Vec<char> = to_rows(&canvas)[0].chars().take(4).collect();
        assert_eq!(first, vec!['▀', '▄', '█', ' ']);
    }
}
