//! Atari Jaguar CRY colour: a 4-bit cyan and 4-bit red chroma pair selects a base colour from the
//! hardware tables below, and the low byte scales it by intensity.

use super::{PixelBuffer, PixelFormat, Rgb};
use crate::binary_utils::{slice_at, u16_be_at};
use crate::error::{Result, WolfError};

#[rustfmt::skip]
const RED_LUT: [[u8; 16]; 16] = [
    [  0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0],
    [ 34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  19,   0],
    [ 68,  68,  68,  68,  68,  68,  68,  68,  68,  68,  68,  68,  64,  43,  21,   0],
    [102, 102, 102, 102, 102, 102, 102, 102, 102, 102, 102,  95,  71,  47,  23,   0],
    [135, 135, 135, 135, 135, 135, 135, 135, 135, 135, 130, 104,  78,  52,  26,   0],
    [169, 169, 169, 169, 169, 169, 169, 169, 169, 170, 141, 113,  85,  56,  28,   0],
    [203, 203, 203, 203, 203, 203, 203, 203, 203, 183, 153, 122,  91,  61,  30,   0],
    [237, 237, 237, 237, 237, 237, 237, 237, 230, 197, 164, 131,  98,  65,  32,   0],
    [255, 255, 255, 255, 255, 255, 255, 255, 247, 214, 181, 148,  15,  82,  49,   7],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 235, 204, 173, 143, 112,  81,  51],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 227, 198, 170, 141, 113,  85],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 249, 223, 197, 171, 145, 119],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 248, 224, 200, 177, 153],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 252, 230, 208, 187],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 240, 221],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255],
];

#[rustfmt::skip]
const GREEN_LUT: [[u8; 16]; 16] = [
    [  0,  17,  34,  51,  68,  85, 102, 119, 136, 153, 170, 187, 204, 221, 238, 255],
    [  0,  19,  38,  57,  77,  96, 115, 134, 154, 173, 192, 211, 231, 250, 255, 255],
    [  0,  21,  43,  64,  86, 107, 129, 150, 172, 193, 215, 236, 255, 255, 255, 255],
    [  0,  23,  47,  71,  95, 119, 142, 166, 190, 214, 238, 255, 255, 255, 255, 255],
    [  0,  26,  52,  78, 104, 130, 156, 182, 208, 234, 255, 255, 255, 255, 255, 255],
    [  0,  28,  56,  85, 113, 141, 170, 198, 226, 255, 255, 255, 255, 255, 255, 255],
    [  0,  30,  61,  91, 122, 153, 183, 214, 244, 255, 255, 255, 255, 255, 255, 255],
    [  0,  32,  65,  98, 131, 164, 197, 230, 255, 255, 255, 255, 255, 255, 255, 255],
    [  0,  32,  65,  98, 131, 164, 197, 230, 255, 255, 255, 255, 255, 255, 255, 255],
    [  0,  30,  61,  91, 122, 153, 183, 214, 244, 255, 255, 255, 255, 255, 255, 255],
    [  0,  28,  56,  85, 113, 141, 170, 198, 226, 255, 255, 255, 255, 255, 255, 255],
    [  0,  26,  52,  78, 104, 130, 156, 182, 208, 234, 255, 255, 255, 255, 255, 255],
    [  0,  23,  47,  71,  95, 119, 142, 166, 190, 214, 238, 255, 255, 255, 255, 255],
    [  0,  21,  43,  64,  86, 107, 129, 150, 172, 193, 215, 236, 255, 255, 255, 255],
    [  0,  19,  38,  57,  77,  96, 115, 134, 154, 173, 192, 211, 231, 250, 255, 255],
    [  0,  17,  34,  51,  68,  85, 102, 119, 136, 153, 170, 187, 204, 221, 238, 255],
];

#[rustfmt::skip]
const BLUE_LUT: [[u8; 16]; 16] = [
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 240, 221],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 252, 230, 208, 187],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 248, 224, 200, 177, 153],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 249, 223, 197, 171, 145, 119],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 227, 198, 170, 141, 113,  85],
    [255, 255, 255, 255, 255, 255, 255, 255, 255, 235, 204, 173, 143, 112,  81,  51],
    [255, 255, 255, 255, 255, 255, 255, 255, 247, 214, 181, 148, 115,  82,  49,  17],
    [237, 237, 237, 237, 237, 237, 237, 237, 230, 197, 164, 131,  98,  65,  32,   0],
    [203, 203, 203, 203, 203, 203, 203, 203, 203, 183, 153, 122,  91,  61,  30,   0],
    [169, 169, 169, 169, 169, 169, 169, 169, 169, 170, 141, 113,  85,  56,  28,   0],
    [135, 135, 135, 135, 135, 135, 135, 135, 135, 135, 130, 104,  78,  52,  26,   0],
    [102, 102, 102, 102, 102, 102, 102, 102, 102, 102, 102,  95,  71,  47,  23,   0],
    [ 68,  68,  68,  68,  68,  68,  68,  68,  68,  68,  68,  68,  64,  43,  21,   0],
    [ 34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  34,  19,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0],
];

pub fn cry16_to_rgb(value: u16) -> Rgb {
    let cyan = usize::from(value >> 12);
    let red = usize::from((value >> 8) & 0xF);
    let intensity = u32::from(value & 0xFF);
    let scale = |lut: &[[u8; 16]; 16]| ((u32::from(lut[cyan][red]) * intensity) >> 8) as u8;
    [scale(&RED_LUT), scale(&GREEN_LUT), scale(&BLUE_LUT)]
}

/// Decode `width * height` big-endian CRY16 pixels into RGB.
pub fn decode_cry16(data: &[u8], width: usize, height: usize) -> Result<PixelBuffer> {
    let pixels = slice_at(data, 0, width * height * 2)?;
    let mut buffer = PixelBuffer::new(width, height, PixelFormat::Rgb24);
    for (out, word) in buffer.data_mut().chunks_exact_mut(3).zip(pixels.chunks_exact(2)) {
        out.copy_from_slice(&cry16_to_rgb(u16::from_be_bytes([word[0], word[1]])));
    }
    Ok(buffer)
}

/// Decode indexed pixels through a palette of 256 big-endian CRY16 entries.
pub fn decode_indexed(
    pixels: &[u8],
    width: usize,
    height: usize,
    cry_palette: &[u8],
) -> Result<PixelBuffer> {
    if cry_palette.len() < 512 {
        return Err(WolfError::format(format!(
            "CRY palette needs 512 bytes, got {}",
            cry_palette.len()
        )));
    }
    let pixels = slice_at(pixels, 0, width * height)?;

    let mut buffer = PixelBuffer::new(width, height, PixelFormat::Rgb24);
    for (out, &index) in buffer.data_mut().chunks_exact_mut(3).zip(pixels) {
        let colour = u16_be_at(cry_palette, usize::from(index) * 2)?;
        out.copy_from_slice(&cry16_to_rgb(colour));
    }
    Ok(buffer)
}
