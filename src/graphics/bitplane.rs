//! VGA mode-X pictures store each quarter of the columns as a separate plane:
//! plane 0 holds columns 0, 4, 8..., plane 1 holds 1, 5, 9... and so on.

use super::{Palette, PixelBuffer, PixelFormat};
use crate::error::{Result, WolfError};

/// Position of source byte `index` within a `width`x`height` picture.
pub fn plane_position(index: usize, width: usize, height: usize) -> (usize, usize) {
    let size = width * height;
    let line_width = width / 4;
    let plane = index / (size / 4);
    let x = (index % line_width) * 4 + plane;
    let y = (index / line_width) % height;
    (x, y)
}

pub fn decode(
    chunk: &[u8],
    width: usize,
    height: usize,
    palette: &Palette,
    format: PixelFormat,
) -> Result<PixelBuffer> {
    if width == 0 || height == 0 || width % 4 != 0 {
        return Err(WolfError::format(format!(
            "Planar picture must have a non-zero width divisible by 4, got {}x{}",
            width, height
        )));
    }
    if format == PixelFormat::Indexed8 {
        return Err(WolfError::format("Planar pictures decode to RGB or RGBA"));
    }

    let size = width * height;
    if chunk.len() < size {
        return Err(WolfError::format(format!(
            "Planar picture {}x{} needs {} bytes, chunk has {}",
            width,
            height,
            size,
            chunk.len()
        )));
    }

    let mut buffer = PixelBuffer::new(width, height, format);
    for (index, &colour) in chunk[..size].iter().enumerate() {
        let (x, y) = plane_position(index, width, height);
        buffer.put_rgb(x, y, palette.colour(colour));
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planes_interleave_columns() {
        // 8x2: each plane holds 4 bytes (2 per row)
        let chunk: Vec<u8> = (0..16).collect();
        let buffer = decode(&chunk, 8, 2, &Palette::greyscale(), PixelFormat::Rgb24).unwrap();

        let row0: Vec<u8> = buffer.row(0).unwrap().chunks(3).map(|p| p[0]).collect();
        let row1: Vec<u8> = buffer.row(1).unwrap().chunks(3).map(|p| p[0]).collect();
        assert_eq!(row0, vec![0, 4, 8, 12, 1, 5, 9, 13]);
        assert_eq!(row1, vec![2, 6, 10, 14, 3, 7, 11, 15]);
    }

    #[test]
    fn rgba_output_is_opaque() {
        let chunk = [7u8; 4];
        let buffer = decode(&chunk, 4, 1, &Palette::greyscale(), PixelFormat::Rgba32).unwrap();
        assert!(buffer.data().chunks(4).all(|p| p == [7, 7, 7, 255]));
    }

    #[test]
    fn rejects_bad_geometry_and_short_chunks() {
        let palette = Palette::greyscale();
        assert!(decode(&[0; 6], 6, 1, &palette, PixelFormat::Rgb24).is_err());
        assert!(decode(&[0; 4], 4, 0, &palette, PixelFormat::Rgb24).is_err());
        assert!(decode(&[0; 7], 4, 2, &palette, PixelFormat::Rgb24).is_err());
    }
}
