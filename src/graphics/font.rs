//! Proportional bitmap fonts: a header of glyph offsets and widths followed by one byte per
//! glyph pixel. Glyphs are laid out on a sheet in 16 pixel cells.

use std::io::Cursor;

use super::{PixelBuffer, PixelFormat};
use crate::binary_utils::{read_u16_le, read_u8};
use crate::error::{Result, WolfError};

pub const FONT_SHEET_WIDTH: usize = 256;
pub const FONT_SHEET_HEIGHT: usize = 128;
const GLYPH_COUNT: usize = 256;
const GLYPH_CELL: usize = 16;

#[derive(Debug, Clone)]
pub struct FontHeader {
    pub height: u16,
    pub location: Vec<u16>,
    pub width: Vec<u8>,
}

impl FontHeader {
    pub fn parse(chunk: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(chunk);
        let height = read_u16_le(&mut cursor)?;
        let location = (0..GLYPH_COUNT)
            .map(|_| read_u16_le(&mut cursor))
            .collect::<std::io::Result<Vec<_>>>()?;
        let width = (0..GLYPH_COUNT)
            .map(|_| read_u8(&mut cursor))
            .collect::<std::io::Result<Vec<_>>>()?;

        Ok(FontHeader {
            height,
            location,
            width,
        })
    }
}

/// Render every glyph of a font chunk onto a white sheet whose alpha carries the glyph shapes.
pub fn decode(chunk: &[u8], sheet_width: usize, sheet_height: usize) -> Result<PixelBuffer> {
    let header = FontHeader::parse(chunk)?;
    let mut sheet = PixelBuffer::filled(
        sheet_width,
        sheet_height,
        PixelFormat::Rgba32,
        &[0xFF, 0xFF, 0xFF, 0x00],
    )?;

    let height = usize::from(header.height);
    let (mut px, mut py) = (0usize, 0usize);

    for glyph in 0..GLYPH_COUNT {
        let width = usize::from(header.width[glyph]);
        if width == 0 {
            continue;
        }

        if px + width > sheet_width.saturating_sub(1) {
            py += height;
            px = 0;
        }

        let start = usize::from(header.location[glyph]);
        let pixels = chunk.get(start..start + width * height).ok_or_else(|| {
            WolfError::format(format!(
                "Glyph {} at {} runs past the {} byte font",
                glyph,
                start,
                chunk.len()
            ))
        })?;

        for (i, &value) in pixels.iter().enumerate() {
            if value != 0 {
                sheet.put(px + i % width, py + i / width, &[0xFF, 0xFF, 0xFF, 0xFF]);
            }
        }

        px += GLYPH_CELL;
    }

    Ok(sheet)
}
