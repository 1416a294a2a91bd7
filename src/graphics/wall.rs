//! Walls are stored column-major so the renderer can stream one texture column at a time.

use super::{Palette, PixelBuffer, PixelFormat};
use crate::error::{Result, WolfError};

pub const WALL_SIZE: usize = 64;
pub const CONSOLE_WALL_SIZE: usize = 128;

/// Decode a 64x64 page-file wall: `src[(x << 6) + y]` lands at `(x, y)`.
pub fn decode_page(chunk: &[u8], palette: &Palette, format: PixelFormat) -> Result<PixelBuffer> {
    if chunk.len() < WALL_SIZE * WALL_SIZE {
        return Err(WolfError::format(format!(
            "Wall page has {} bytes, needs {}",
            chunk.len(),
            WALL_SIZE * WALL_SIZE
        )));
    }
    if format == PixelFormat::Indexed8 {
        return Err(WolfError::format("Walls decode to RGB or RGBA"));
    }

    let mut buffer = PixelBuffer::new(WALL_SIZE, WALL_SIZE, format);
    for x in 0..WALL_SIZE {
        for y in 0..WALL_SIZE {
            buffer.put_rgb(x, y, palette.colour(chunk[(x << 6) + y]));
        }
    }
    Ok(buffer)
}

/// Transpose a row-major `width` x `height` index buffer.
pub fn obverse(src: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    if src.len() < width * height {
        return Err(WolfError::format(format!(
            "Wall of {}x{} needs {} bytes, got {}",
            width,
            height,
            width * height,
            src.len()
        )));
    }

    let mut target = vec![0u8; width * height];
    for h in 0..height {
        for w in 0..width {
            target[h + width * w] = src[h * width + w];
        }
    }
    Ok(target)
}

/// Console walls are square, column-major and stored as palette indices.
pub fn decode_square(src: &[u8], size: usize, palette: &Palette) -> Result<PixelBuffer> {
    let indices = obverse(src, size, size)?;
    let mut buffer = PixelBuffer::new(size, size, PixelFormat::Rgb24);
    for (pixel, &index) in buffer.data_mut().chunks_exact_mut(3).zip(&indices) {
        pixel.copy_from_slice(&palette.colour(index));
    }
    Ok(buffer)
}
