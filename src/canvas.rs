use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::color::Color;

/// A rectangular grid of pixels, written out as plain-text PPM.
#[derive(Clone)]
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    pixels: Vec<Color>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height],
        }
    }

    /// Writes outside the canvas are silently ignored.
    pub fn write_pixel(&mut self, col: usize, row: usize, color: Color) {
        if col < self.width && row < self.height {
            self.pixels[row * self.width + col] = color;
        }
    }

    pub fn read_pixel(&self, col: usize, row: usize) -> Option<Color> {
        if col < self.width && row < self.height {
            Some(self.pixels[row * self.width + col])
        } else {
            None
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "P3")?;
        writeln!(writer, "{} {}", self.width, self.height)?;
        writeln!(writer, "255")?;
        for pixel in &self.pixels {
            writeln!(
                writer,
                "{} {} {}",
                channel(pixel.r),
                channel(pixel.g),
                channel(pixel.b)
            )?;
        }
        writer.flush()
    }
}

fn channel(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/* Tests */

#[test]
fn new_canvas_is_black() {
    let canvas = Canvas::new(3, 2);
    assert_eq!(canvas.read_pixel(2, 1), Some(Color::black()));
}

#[test]
fn writes_and_reads_back() {
    let mut canvas = Canvas::new(4, 4);
    canvas.write_pixel(1, 2, Color::rgb(0.5, 0.0, 1.0));
    assert_eq!(canvas.read_pixel(1, 2), Some(Color::rgb(0.5, 0.0, 1.0)));
}

#[test]
fn out_of_bounds_access_is_harmless() {
    let mut canvas = Canvas::new(2, 2);
    canvas.write_pixel(5, 0, Color::white());
    assert_eq!(canvas.read_pixel(5, 0), None);
    assert_eq!(canvas.read_pixel(0, 5), None);
}

#[test]
fn channels_clamp_to_displayable_range() {
    assert_eq!(channel(-0.5), 0);
    assert_eq!(channel(0.5), 128);
    assert_eq!(channel(1.7), 255);
}
