// 1-bit framebuffer in SSD1306 page layout
//
// Each byte holds a vertical strip of 8 pixels; bit 0 is the top pixel.

use std::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 32;

#[derive(Debug, Clone)]
pub struct MonoCanvas {
    buffer: Vec<u8>,
}

impl MonoCanvas {
    pub fn new() -> Self {
        Self {
            buffer: vec![0; (WIDTH * HEIGHT / 8) as usize],
        }
    }

    fn index(x: u32, y: u32) -> (usize, u8) {
        ((x + (y / 8) * WIDTH) as usize, 1 << (y % 8))
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        let (byte, mask) = Self::index(x, y);
        self.buffer[byte] & mask != 0
    }

    fn set(&mut self, x: u32, y: u32, on: bool) {
        let (byte, mask) = Self::index(x, y);
        if on {
            self.buffer[byte] |= mask;
        } else {
            self.buffer[byte] &= !mask;
        }
    }

    /// True if any pixel inside the row band [top, top + height) is lit
    pub fn band_lit(&self, top: u32, height: u32) -> bool {
        (top..(top + height).min(HEIGHT)).any(|y| (0..WIDTH).any(|x| self.get(x, y)))
    }
}

impl Default for MonoCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for MonoCanvas {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl DrawTarget for MonoCanvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Text running off the edge is clipped
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                if x < WIDTH && y < HEIGHT {
                    self.set(x, y, color.is_on());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(canvas: &MonoCanvas) -> usize {
        (0..HEIGHT)
            .flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.get(x, y))
            .count()
    }

    #[test]
    fn test_page_layout() {
        let mut canvas = MonoCanvas::new();
        canvas.set(3, 9, true);
        // Page 1 starts at byte WIDTH; row 9 is bit 1
        assert_eq!(MonoCanvas::index(3, 9), (WIDTH as usize + 3, 0b10));
        assert_eq!(canvas.buffer[WIDTH as usize + 3], 0b10);
        assert!(canvas.get(3, 9));
        assert!(!canvas.get(3, 8));
    }

    #[test]
    fn test_clear_and_clip() {
        let mut canvas = MonoCanvas::new();
        let pixels = [
            Pixel(Point::new(0, 0), BinaryColor::On),
            Pixel(Point::new(-1, 4), BinaryColor::On),
            Pixel(Point::new(200, 4), BinaryColor::On),
        ];
        let _ = canvas.draw_iter(pixels);
        assert!(canvas.get(0, 0));
        assert_eq!(lit(&canvas), 1);

        let _ = canvas.clear(BinaryColor::Off);
        assert_eq!(lit(&canvas), 0);
        assert!(!canvas.band_lit(0, HEIGHT));
    }
}
