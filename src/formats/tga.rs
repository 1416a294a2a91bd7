//! Truevision TARGA output
//!
//! Uncompressed (type 2) and run-length encoded (type 10) true-colour images with 24 or 32 bits
//! per pixel. Pixels are stored BGR(A) and, unless the top-origin flag is set, bottom row first.
//!
//! The packet boundaries produced by [`write_rle_scanline`] are part of the output contract, so
//! two runs over the same pixels always produce byte-identical files.

use std::io::Cursor;

use crate::binary_utils::{read_bytes, read_u16_le, read_u8, seek_to};
use crate::error::{Result, WolfError};
use crate::graphics::{PixelBuffer, PixelFormat};

pub const TGA_HEADER_SIZE: usize = 18;
const TYPE_RAW: u8 = 2;
const TYPE_RLE: u8 = 10;
const TOP_ORIGIN: u8 = 1 << 5;
const MAX_PACKET: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TgaOptions {
    pub rle: bool,
    /// Keep rows in stored order and flag the image as top-origin.
    pub upside_down: bool,
}

impl Default for TgaOptions {
    fn default() -> Self {
        TgaOptions {
            rle: true,
            upside_down: false,
        }
    }
}

/// Append one scanline of `width` pixels of `bpp` bytes as RLE packets.
///
/// `repeat` counts pixels identical to the packet start beyond the first; `direct` counts
/// literal pixels queued before the one currently examined.
pub fn write_rle_scanline(out: &mut Vec<u8>, pixels: &[u8], width: usize, bpp: usize) -> Result<()> {
    if width == 0 || bpp == 0 || pixels.len() < width * bpp {
        return Err(WolfError::format(format!(
            "Scanline of {} bytes cannot hold {} pixels of {} bytes",
            pixels.len(),
            width,
            bpp
        )));
    }

    let pixel = |i: usize| &pixels[i * bpp..(i + 1) * bpp];
    let run = |from: usize, count: usize| &pixels[from * bpp..(from + count) * bpp];

    let mut repeat = 0usize;
    let mut direct = 0usize;
    let mut from = 0usize;

    for x in 1..width {
        let current = x - 1;
        if pixel(current) != pixel(x) {
            if repeat > 0 {
                out.push(128 + repeat as u8);
                out.extend_from_slice(pixel(from));
                from = x;
                repeat = 0;
                direct = 0;
            } else {
                direct += 1;
            }
        } else if direct > 0 {
            out.push((direct - 1) as u8);
            out.extend_from_slice(run(from, direct));
            from = current;
            direct = 0;
            repeat = 1;
        } else {
            repeat += 1;
        }

        if repeat == MAX_PACKET {
            out.push(255);
            out.extend_from_slice(pixel(from));
            from = x;
            direct = 0;
            repeat = 0;
        } else if direct == MAX_PACKET {
            out.push(127);
            out.extend_from_slice(run(from, MAX_PACKET));
            from = x;
            direct = 0;
            repeat = 0;
        }
    }

    if repeat > 0 {
        out.push(128 + repeat as u8);
        out.extend_from_slice(pixel(from));
    } else {
        out.push(direct as u8);
        out.extend_from_slice(run(from, direct + 1));
    }

    Ok(())
}

pub fn encode(buffer: &PixelBuffer, options: TgaOptions) -> Result<Vec<u8>> {
    if buffer.format() == PixelFormat::Indexed8 {
        return Err(WolfError::format("TGA output needs RGB or RGBA pixels"));
    }
    let (width, height) = (buffer.width(), buffer.height());
    if width == 0 || height == 0 || width > usize::from(u16::MAX) || height > usize::from(u16::MAX)
    {
        return Err(WolfError::format(format!(
            "Cannot write a {}x{} TGA",
            width, height
        )));
    }

    let bpp = buffer.bytes_per_pixel();
    let mut out = Vec::with_capacity(TGA_HEADER_SIZE + width * height * bpp);

    let mut header = [0u8; TGA_HEADER_SIZE];
    header[2] = if options.rle { TYPE_RLE } else { TYPE_RAW };
    header[12..14].copy_from_slice(&(width as u16).to_le_bytes());
    header[14..16].copy_from_slice(&(height as u16).to_le_bytes());
    header[16] = buffer.format().bits_per_pixel();
    if options.upside_down {
        header[17] |= TOP_ORIGIN;
    }
    out.extend_from_slice(&header);

    let mut scanline = vec![0u8; buffer.stride()];
    for y in 0..height {
        let source_row = if options.upside_down { y } else { height - y - 1 };
        let row = buffer.row(source_row).ok_or_else(|| {
            WolfError::format(format!("Row {} missing from {}x{} image", source_row, width, height))
        })?;

        scanline.copy_from_slice(row);
        for pixel in scanline.chunks_exact_mut(bpp) {
            pixel.swap(0, 2);
        }

        if options.rle {
            write_rle_scanline(&mut out, &scanline, width, bpp)?;
        } else {
            out.extend_from_slice(&scanline);
        }
    }

    Ok(out)
}

/// Read back a type 2 or type 10 image into top-to-bottom RGB(A) rows.
pub fn decode(data: &[u8]) -> Result<PixelBuffer> {
    let mut cursor = Cursor::new(data);
    let id_length = read_u8(&mut cursor)?;
    seek_to(&mut cursor, 2)?;
    let image_type = read_u8(&mut cursor)?;
    seek_to(&mut cursor, 12)?;
    let width = usize::from(read_u16_le(&mut cursor)?);
    let height = usize::from(read_u16_le(&mut cursor)?);
    let depth = read_u8(&mut cursor)?;
    let descriptor = read_u8(&mut cursor)?;
    seek_to(&mut cursor, (TGA_HEADER_SIZE + usize::from(id_length)) as u64)?;

    let format = match depth {
        24 => PixelFormat::Rgb24,
        32 => PixelFormat::Rgba32,
        other => {
            return Err(WolfError::format(format!(
                "Unsupported TGA depth {}",
                other
            )))
        }
    };
    let bpp = format.bytes_per_pixel();
    let total = width * height * bpp;

    let mut stored = match image_type {
        TYPE_RAW => read_bytes(&mut cursor, total)?,
        TYPE_RLE => {
            let mut pixels = Vec::with_capacity(total);
            while pixels.len() < total {
                let packet = read_u8(&mut cursor)?;
                let count = usize::from(packet & 0x7F) + 1;
                if packet & 0x80 != 0 {
                    let value = read_bytes(&mut cursor, bpp)?;
                    for _ in 0..count {
                        pixels.extend_from_slice(&value);
                    }
                } else {
                    pixels.extend_from_slice(&read_bytes(&mut cursor, count * bpp)?);
                }
            }
            if pixels.len() != total {
                return Err(WolfError::format("TGA packet crosses the end of the image"));
            }
            pixels
        }
        other => {
            return Err(WolfError::format(format!(
                "Unsupported TGA image type {}",
                other
            )))
        }
    };

    for pixel in stored.chunks_exact_mut(bpp) {
        pixel.swap(0, 2);
    }

    let data = if descriptor & TOP_ORIGIN != 0 {
        stored
    } else {
        let stride = width * bpp;
        stored.chunks_exact(stride).rev().flatten().copied().collect()
    };

    PixelBuffer::from_raw(width, height, format, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rle(pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        write_rle_scanline(&mut out, pixels, pixels.len(), 1).unwrap();
        out
    }

    #[test]
    fn long_runs_split_at_128() {
        let mut pixels = vec![7u8; 130];
        pixels.extend_from_slice(&[1, 2, 3, 4, 5]);
        let out = rle(&pixels);
        assert_eq!(out, vec![255, 7, 129, 7, 4, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn literals_then_repeat() {
        assert_eq!(rle(&[1, 2, 3, 3, 3]), vec![1, 1, 2, 130, 3]);
        assert_eq!(rle(&[9]), vec![0, 9]);
        assert_eq!(rle(&[4, 4]), vec![129, 4]);
    }

    #[test]
    fn long_literal_runs_split_at_128() {
        let pixels: Vec<u8> = (0..=200u8).collect();
        let out = rle(&pixels);
        assert_eq!(out[0], 127);
        assert_eq!(&out[1..129], &pixels[..128]);
        assert_eq!(out[129], 72);
        assert_eq!(out.len(), 1 + 128 + 1 + 73);
    }

    #[test]
    fn header_and_row_order() {
        let buffer =
            PixelBuffer::from_raw(1, 2, PixelFormat::Rgb24, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let raw = encode(
            &buffer,
            TgaOptions {
                rle: false,
                upside_down: false,
            },
        )
        .unwrap();
        assert_eq!(raw[2], 2);
        assert_eq!(&raw[12..17], &[1, 0, 2, 0, 24]);
        assert_eq!(raw[17], 0);
        // Bottom row first, BGR
        assert_eq!(&raw[18..], &[6, 5, 4, 3, 2, 1]);

        let flipped = encode(
            &buffer,
            TgaOptions {
                rle: false,
                upside_down: true,
            },
        )
        .unwrap();
        assert_eq!(flipped[17], 0x20);
        assert_eq!(&flipped[18..], &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn decode_reverses_encode() {
        let data = (0..4 * 3 * 4).map(|i| (i / 8) as u8).collect::<Vec<_>>();
        let buffer = PixelBuffer::from_raw(4, 3, PixelFormat::Rgba32, data).unwrap();
        for upside_down in [false, true] {
            let file = encode(
                &buffer,
                TgaOptions {
                    rle: true,
                    upside_down,
                },
            )
            .unwrap();
            assert_eq!(file[2], 10);
            assert_eq!(decode(&file).unwrap(), buffer);
        }
    }

    #[test]
    fn indexed_buffers_are_rejected() {
        let buffer = PixelBuffer::new(2, 2, PixelFormat::Indexed8);
        assert!(encode(&buffer, TgaOptions::default()).is_err());
    }
}
