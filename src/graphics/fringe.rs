//! Smooth upscaling blends the magenta transparency key into neighbouring pixels. The ranges
//! below catch those purple-ish blends so they can be made transparent again.

use image::{imageops, imageops::FilterType, RgbaImage};

use super::{PixelBuffer, PixelFormat, MAGENTA};
use crate::error::{Result, WolfError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FringeRange {
    pub min_red: u8,
    /// `None` means green must be exactly zero.
    pub max_green: Option<u8>,
    pub min_blue: u8,
}

impl FringeRange {
    const fn new(min_red: u8, max_green: u8, min_blue: u8) -> Self {
        FringeRange {
            min_red,
            max_green: Some(max_green),
            min_blue,
        }
    }

    pub fn matches(&self, r: u8, g: u8, b: u8) -> bool {
        let green_ok = match self.max_green {
            Some(max) => g <= max,
            None => g == 0,
        };
        r >= self.min_red && green_ok && b >= self.min_blue
    }
}

pub const FRINGE_RANGES: [FringeRange; 17] = [
    FringeRange::new(150, 60, 150),
    FringeRange {
        min_red: 124,
        max_green: None,
        min_blue: 124,
    },
    FringeRange::new(120, 60, 170),
    FringeRange::new(160, 100, 220),
    FringeRange::new(120, 40, 150),
    FringeRange::new(140, 90, 200),
    FringeRange::new(120, 70, 190),
    FringeRange::new(120, 70, 160),
    FringeRange::new(200, 120, 230),
    FringeRange::new(150, 110, 150),
    FringeRange::new(120, 70, 120),
    FringeRange::new(100, 55, 100),
    FringeRange::new(180, 130, 180),
    FringeRange::new(200, 150, 200),
    FringeRange::new(190, 140, 190),
    FringeRange::new(170, 120, 170),
    FringeRange::new(130, 80, 130),
];

/// 1-based number of the first range the colour falls in.
pub fn matching_range(r: u8, g: u8, b: u8) -> Option<usize> {
    FRINGE_RANGES
        .iter()
        .position(|range| range.matches(r, g, b))
        .map(|i| i + 1)
}

/// Rewrite the alpha of every pixel: 0 inside a fringe range, 255 otherwise.
pub fn clean(buffer: &mut PixelBuffer) -> Result<()> {
    if buffer.format() != PixelFormat::Rgba32 {
        return Err(WolfError::format(format!(
            "Fringe cleanup needs RGBA pixels, got {:?}",
            buffer.format()
        )));
    }

    for pixel in buffer.data_mut().chunks_exact_mut(4) {
        pixel[3] = if matching_range(pixel[0], pixel[1], pixel[2]).is_some() {
            0x00
        } else {
            0xFF
        };
    }
    Ok(())
}

/// Smooth 2x upscale of an RGBA sprite followed by fringe cleanup.
pub fn smooth_upscale(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    if buffer.format() != PixelFormat::Rgba32 {
        return Err(WolfError::format(format!(
            "Smooth upscale needs RGBA pixels, got {:?}",
            buffer.format()
        )));
    }

    // Transparent pixels carry the key colour so the filter blends towards it.
    let flattened = buffer
        .data()
        .chunks_exact(4)
        .flat_map(|p| {
            if p[3] == 0 {
                [MAGENTA[0], MAGENTA[1], MAGENTA[2], 0xFF]
            } else {
                [p[0], p[1], p[2], 0xFF]
            }
        })
        .collect::<Vec<u8>>();

    let (width, height) = (buffer.width() as u32, buffer.height() as u32);
    let image = RgbaImage::from_raw(width, height, flattened)
        .ok_or_else(|| WolfError::format("Sprite buffer does not match its dimensions"))?;
    let resized = imageops::resize(&image, width * 2, height * 2, FilterType::Triangle);

    let mut out = PixelBuffer::from_raw(
        buffer.width() * 2,
        buffer.height() * 2,
        PixelFormat::Rgba32,
        resized.into_raw(),
    )?;
    clean(&mut out)?;
    Ok(out)
}
