//! Column-run sprite decoders
//!
//! PC sprites are stored as a list of vertical runs per column, with the pixel bytes shared in
//! one pool. The Macintosh and Jaguar ports use their own variations of the same idea.

use super::{Palette, PixelBuffer, PixelFormat, MAGENTA};
use crate::binary_utils::{i16_le_at, slice_at, u16_be_at, u16_le_at};
use crate::containers::compression::lzss;
use crate::error::{Result, WolfError};

pub const SPRITE_SIZE: usize = 64;
pub const CONSOLE_SPRITE_SIZE: usize = 128;
const MAX_COLUMNS: usize = 64;
const RUN_SIZE: usize = 6;
const MAC_RUN_END: u16 = 0xFFFF;
const JAGUAR_SPRITE_PIXELS: usize = 8;

/// `t_compshape`: visible column span followed by one run-list offset per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteShapeHeader {
    pub left: u16,
    pub right: u16,
    pub column_offsets: [u16; MAX_COLUMNS],
}

impl SpriteShapeHeader {
    pub fn parse(chunk: &[u8]) -> Result<Self> {
        let left = u16_le_at(chunk, 0)?;
        let right = u16_le_at(chunk, 2)?;

        if usize::from(right) >= SPRITE_SIZE || left > right {
            return Err(WolfError::format(format!(
                "Sprite column span {}..={} outside 64 pixel canvas",
                left, right
            )));
        }

        let mut column_offsets = [0u16; MAX_COLUMNS];
        for (i, slot) in column_offsets
            .iter_mut()
            .take(usize::from(right - left) + 1)
            .enumerate()
        {
            *slot = u16_le_at(chunk, 4 + i * 2)?;
        }

        Ok(SpriteShapeHeader {
            left,
            right,
            column_offsets,
        })
    }
}

/// Decode a PC page-file sprite into a 64x64 buffer keyed on magenta.
pub fn decode(chunk: &[u8], palette: &Palette, format: PixelFormat) -> Result<PixelBuffer> {
    let mut buffer = match format {
        PixelFormat::Rgb24 => PixelBuffer::filled(SPRITE_SIZE, SPRITE_SIZE, format, &MAGENTA)?,
        PixelFormat::Rgba32 => PixelBuffer::filled(
            SPRITE_SIZE,
            SPRITE_SIZE,
            format,
            &[MAGENTA[0], MAGENTA[1], MAGENTA[2], 0x00],
        )?,
        PixelFormat::Indexed8 => {
            return Err(WolfError::format("Sprites decode to RGB or RGBA"));
        }
    };

    let header = SpriteShapeHeader::parse(chunk)?;

    for x in header.left..=header.right {
        let mut run = usize::from(header.column_offsets[usize::from(x - header.left)]);

        loop {
            let doubled_bottom = u16_le_at(chunk, run).map_err(|_| bad_run(x, run))?;
            if doubled_bottom == 0 {
                break;
            }
            let data_index = i16_le_at(chunk, run + 2).map_err(|_| bad_run(x, run))?;
            let doubled_top = u16_le_at(chunk, run + 4).map_err(|_| bad_run(x, run))?;

            let top = usize::from(doubled_top / 2);
            let bottom = usize::from(doubled_bottom / 2);
            if bottom > SPRITE_SIZE {
                return Err(WolfError::format(format!(
                    "Sprite column {} runs to row {}",
                    x, bottom
                )));
            }

            for y in top..bottom {
                let index = i64::from(data_index) + y as i64;
                let colour = usize::try_from(index)
                    .ok()
                    .and_then(|i| chunk.get(i))
                    .ok_or_else(|| {
                        WolfError::format(format!(
                            "Sprite column {} reads pixel {} outside {} byte chunk",
                            x,
                            index,
                            chunk.len()
                        ))
                    })?;
                buffer.put_rgb(usize::from(x), y, palette.colour(*colour));
            }

            run += RUN_SIZE;
        }
    }

    Ok(buffer)
}

fn bad_run(column: u16, offset: usize) -> WolfError {
    WolfError::format(format!(
        "Sprite column {} run list at {} is truncated",
        column, offset
    ))
}

/// Macintosh sprite record: little-endian expanded length, then LZSS data.
pub fn decode_mac(record: &[u8], palette: &Palette) -> Result<PixelBuffer> {
    let expanded_length = usize::from(u16_le_at(record, 0)?);
    let shape = lzss::decode(&record[2..], expanded_length)?;
    decode_mac_shape(&shape, palette)
}

/// Expanded Macintosh sprite, centred horizontally on a 128x128 transparent canvas.
pub fn decode_mac_shape(shape: &[u8], palette: &Palette) -> Result<PixelBuffer> {
    let mut buffer = PixelBuffer::new(
        CONSOLE_SPRITE_SIZE,
        CONSOLE_SPRITE_SIZE,
        PixelFormat::Rgba32,
    );

    let width = usize::from(u16_be_at(shape, 0)?);
    let left = (CONSOLE_SPRITE_SIZE / 2) as i64 - (width / 2) as i64;

    for x in 0..width {
        // Offsets are in bytes but runs are word aligned
        let mut run = usize::from(u16_be_at(shape, 2 + x * 2)? / 2) * 2;

        loop {
            let doubled_top = u16_be_at(shape, run)?;
            if doubled_top == MAC_RUN_END {
                break;
            }
            let doubled_bottom = u16_be_at(shape, run + 2)?;
            let pool = usize::from(u16_be_at(shape, run + 4)?);

            for y in usize::from(doubled_top / 2)..usize::from(doubled_bottom / 2) {
                let colour = *shape.get(pool + y).ok_or_else(|| {
                    WolfError::format(format!(
                        "Sprite pixel {} outside {} byte shape",
                        pool + y,
                        shape.len()
                    ))
                })?;
                let px = x as i64 + left;
                if px >= 0 {
                    buffer.put_rgb(px as usize, y, palette.colour(colour));
                }
            }

            run += RUN_SIZE;
        }
    }

    Ok(buffer)
}

/// Macintosh item: big-endian `x, y, w, h`, `w * h` pixels, then a mask where 0 means drawn.
pub fn decode_mac_item(data: &[u8], palette: &Palette) -> Result<PixelBuffer> {
    let x = usize::from(u16_be_at(data, 0)?);
    let y = usize::from(u16_be_at(data, 2)?);
    let width = usize::from(u16_be_at(data, 4)?);
    let height = usize::from(u16_be_at(data, 6)?);

    let area = width * height;
    let pixels = slice_at(data, 8, area)?;
    let mask = slice_at(data, 8 + area, area)?;

    let mut buffer = PixelBuffer::new(
        CONSOLE_SPRITE_SIZE,
        CONSOLE_SPRITE_SIZE,
        PixelFormat::Rgba32,
    );
    for (i, (&colour, &hidden)) in pixels.iter().zip(mask).enumerate() {
        if hidden == 0 {
            buffer.put_rgb(x + i % width, y + i / width, palette.colour(colour));
        }
    }

    Ok(buffer)
}

/// Jaguar sprite lump: byte `x, y, w, h` header, pixels at offset 8, index 0 transparent.
pub fn decode_jaguar(lump: &[u8], palette: &Palette) -> Result<PixelBuffer> {
    let header = slice_at(lump, 0, 4)?;
    let (x, y) = (usize::from(header[0]), usize::from(header[1]));
    let (width, height) = (usize::from(header[2]), usize::from(header[3]));
    let pixels = slice_at(lump, JAGUAR_SPRITE_PIXELS, width * height)?;

    let mut buffer = PixelBuffer::new(
        CONSOLE_SPRITE_SIZE,
        CONSOLE_SPRITE_SIZE,
        PixelFormat::Rgba32,
    );
    for (i, &colour) in pixels.iter().enumerate() {
        if colour != 0 {
            buffer.put_rgb(x + i % width, y + i / width, palette.colour(colour));
        }
    }

    Ok(buffer)
}
