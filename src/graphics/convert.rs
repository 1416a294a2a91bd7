//! Conversions between indexed pixels and the tagged RGB/RGBA buffers.

use super::{Palette, PixelBuffer, PixelFormat};
use crate::binary_utils::{slice_at, u16_be_at};
use crate::error::{Result, WolfError};

pub fn indexed_to_rgb(
    pixels: &[u8],
    width: usize,
    height: usize,
    palette: &Palette,
) -> Result<PixelBuffer> {
    let pixels = slice_at(pixels, 0, width * height)?;
    let mut buffer = PixelBuffer::new(width, height, PixelFormat::Rgb24);
    for (out, &index) in buffer.data_mut().chunks_exact_mut(3).zip(pixels) {
        out.copy_from_slice(&palette.colour(index));
    }
    Ok(buffer)
}

/// Indexed pixels to RGBA where index 0 stays fully transparent black.
pub fn indexed_to_rgba_keyed(
    pixels: &[u8],
    width: usize,
    height: usize,
    palette: &Palette,
) -> Result<PixelBuffer> {
    let pixels = slice_at(pixels, 0, width * height)?;
    let mut buffer = PixelBuffer::new(width, height, PixelFormat::Rgba32);
    for (out, &index) in buffer.data_mut().chunks_exact_mut(4).zip(pixels) {
        if index != 0 {
            let [r, g, b] = palette.colour(index);
            out.copy_from_slice(&[r, g, b, 0xFF]);
        }
    }
    Ok(buffer)
}

/// Big-endian `width, height` followed by indexed pixels, as used by the console screens.
pub fn sized_indexed_to_rgb(data: &[u8], palette: &Palette) -> Result<PixelBuffer> {
    let width = usize::from(u16_be_at(data, 0)?);
    let height = usize::from(u16_be_at(data, 2)?);
    indexed_to_rgb(&data[4..], width, height, palette)
}

pub fn to_rgba(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    match buffer.format() {
        PixelFormat::Rgba32 => Ok(buffer.clone()),
        PixelFormat::Rgb24 => {
            let data = buffer
                .data()
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 0xFF])
                .collect();
            PixelBuffer::from_raw(buffer.width(), buffer.height(), PixelFormat::Rgba32, data)
        }
        PixelFormat::Indexed8 => Err(WolfError::format(
            "Indexed buffers need a palette before conversion",
        )),
    }
}

/// Drop the alpha channel.
pub fn rgba_to_rgb(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    match buffer.format() {
        PixelFormat::Rgb24 => Ok(buffer.clone()),
        PixelFormat::Rgba32 => {
            let data = buffer
                .data()
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect();
            PixelBuffer::from_raw(buffer.width(), buffer.height(), PixelFormat::Rgb24, data)
        }
        PixelFormat::Indexed8 => Err(WolfError::format(
            "Indexed buffers need a palette before conversion",
        )),
    }
}
