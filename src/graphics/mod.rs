//! Pixel buffers and palettes
//!
//! Every decoder in this module produces a [`PixelBuffer`] tagged with its [`PixelFormat`], so
//! the encoders never have to guess how many bytes a pixel occupies.

pub mod bitplane;
pub mod convert;
pub mod cry;
pub mod font;
pub mod fringe;
pub mod scale;
pub mod sprite;
pub mod wall;

use crate::error::{Result, WolfError};

pub type Rgb = [u8; 3];

/// Transparent key colour used behind sprites.
pub const MAGENTA: Rgb = [255, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Indexed8,
    Rgb24,
    Rgba32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Indexed8 => 1,
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba32 => 4,
        }
    }

    pub fn bits_per_pixel(self) -> u8 {
        (self.bytes_per_pixel() * 8) as u8
    }
}

/// Row-major pixels with no padding. `data.len() == width * height * bpp` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Zero-filled buffer.
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        PixelBuffer {
            width,
            height,
            format,
            data: vec![0; width * height * format.bytes_per_pixel()],
        }
    }

    /// Buffer with every pixel set to `pixel`, which must be one pixel wide.
    pub fn filled(width: usize, height: usize, format: PixelFormat, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != format.bytes_per_pixel() {
            return Err(WolfError::format(format!(
                "Fill pixel of {} bytes does not match {:?}",
                pixel.len(),
                format
            )));
        }
        let data = pixel.repeat(width * height);
        Ok(PixelBuffer {
            width,
            height,
            format,
            data,
        })
    }

    pub fn from_raw(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width * height * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(WolfError::format(format!(
                "{}x{} {:?} buffer needs {} bytes, got {}",
                width,
                height,
                format,
                expected,
                data.len()
            )));
        }
        Ok(PixelBuffer {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    pub fn stride(&self) -> usize {
        self.width * self.bytes_per_pixel()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let stride = self.stride();
        self.data.get(y * stride..(y + 1) * stride)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.bytes_per_pixel();
        let start = (y * self.width + x) * bpp;
        self.data.get(start..start + bpp)
    }

    /// Write one pixel, ignoring coordinates outside the buffer. Returns whether it was written.
    pub fn put(&mut self, x: usize, y: usize, pixel: &[u8]) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let bpp = self.bytes_per_pixel();
        let start = (y * self.width + x) * bpp;
        match self.data.get_mut(start..start + bpp) {
            Some(slot) if pixel.len() >= bpp => {
                slot.copy_from_slice(&pixel[..bpp]);
                true
            }
            _ => false,
        }
    }

    /// Write a palette colour at `(x, y)`. In `Rgba32` the alpha is set to 255.
    pub fn put_rgb(&mut self, x: usize, y: usize, colour: Rgb) -> bool {
        match self.format {
            PixelFormat::Rgb24 => self.put(x, y, &colour),
            PixelFormat::Rgba32 => self.put(x, y, &[colour[0], colour[1], colour[2], 0xFF]),
            PixelFormat::Indexed8 => false,
        }
    }
}

pub const PALETTE_SIZE: usize = 768;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colours: [Rgb; 256],
}

impl Palette {
    /// 256 RGB triplets of 8-bit components.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(data, |v| v)
    }

    /// 256 RGB triplets of 6-bit VGA DAC components, scaled up to 8 bits.
    pub fn from_vga(data: &[u8]) -> Result<Self> {
        Self::parse(data, |v| v << 2)
    }

    fn parse(data: &[u8], scale: impl Fn(u8) -> u8) -> Result<Self> {
        if data.len() < PALETTE_SIZE {
            return Err(WolfError::format(format!(
                "Palette needs {} bytes, got {}",
                PALETTE_SIZE,
                data.len()
            )));
        }

        let mut colours = [[0u8; 3]; 256];
        for (colour, triplet) in colours.iter_mut().zip(data.chunks_exact(3)) {
            *colour = [scale(triplet[0]), scale(triplet[1]), scale(triplet[2])];
        }
        Ok(Palette { colours })
    }

    pub fn greyscale() -> Self {
        let mut colours = [[0u8; 3]; 256];
        for (i, colour) in colours.iter_mut().enumerate() {
            *colour = [i as u8; 3];
        }
        Palette { colours }
    }

    pub fn colour(&self, index: u8) -> Rgb {
        self.colours[usize::from(index)]
    }

    /// `0xRRGGBB` packed colour, as stored in converted map headers.
    pub fn packed_rgb(&self, index: u8) -> u32 {
        let [r, g, b] = self.colour(index);
        u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b)
    }
}
