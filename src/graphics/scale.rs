//! Scale2x pixel-art upscaling
//!
//! Each source pixel `E` becomes a block built from its four neighbours:
//!
//! ```text
//!    B          E0 E1
//!  D E F  ->    E2 E3
//!    H
//! ```
//!
//! Edges repeat the border pixel in place of the missing neighbour. The 2x3 and 2x4 variants
//! keep `E0 E1` on top and `E2 E3` at the bottom, with centre rows in between that also look
//! at the corner pixels `A C G I`. 4x applies 2x twice.

use super::{convert, PixelBuffer, PixelFormat};
use crate::error::{Result, WolfError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleFactor {
    X2,
    X2x3,
    X2x4,
    X4,
}

impl ScaleFactor {
    pub fn horizontal(self) -> usize {
        match self {
            ScaleFactor::X4 => 4,
            _ => 2,
        }
    }

    pub fn vertical(self) -> usize {
        match self {
            ScaleFactor::X2 => 2,
            ScaleFactor::X2x3 => 3,
            ScaleFactor::X2x4 | ScaleFactor::X4 => 4,
        }
    }

    fn emitted_rows(self) -> &'static [Emit] {
        match self {
            ScaleFactor::X2 | ScaleFactor::X4 => &[Emit::Upper, Emit::Lower],
            ScaleFactor::X2x3 => &[Emit::Upper, Emit::Centre, Emit::Lower],
            ScaleFactor::X2x4 => &[Emit::Upper, Emit::Centre, Emit::Centre, Emit::Lower],
        }
    }
}

/// Which half of the expanded block an output row carries.
#[derive(Debug, Clone, Copy)]
enum Emit {
    Upper,
    Centre,
    Lower,
}

/// Validate that `factor` can run on a `width` x `height` image of `bpp` byte pixels.
pub fn check(factor: ScaleFactor, bpp: usize, width: usize, height: usize) -> Result<()> {
    if !matches!(bpp, 1 | 2 | 4) {
        return Err(WolfError::format(format!(
            "Scale2x supports 1, 2 or 4 bytes per pixel, got {}",
            bpp
        )));
    }

    let min_height = if factor == ScaleFactor::X4 { 4 } else { 2 };
    if width < 2 || height < min_height {
        return Err(WolfError::format(format!(
            "{:?} needs at least 2x{} pixels, got {}x{}",
            factor, min_height, width, height
        )));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn scale(
    factor: ScaleFactor,
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    bpp: usize,
    width: usize,
    height: usize,
) -> Result<()> {
    check(factor, bpp, width, height)?;

    let row_bytes = width * bpp;
    if src_stride < row_bytes || src.len() < (height - 1) * src_stride + row_bytes {
        return Err(WolfError::format(format!(
            "Source of {} bytes with stride {} cannot hold {}x{} pixels",
            src.len(),
            src_stride,
            width,
            height
        )));
    }

    let out_row_bytes = row_bytes * factor.horizontal();
    let out_rows = height * factor.vertical();
    if dst_stride < out_row_bytes || dst.len() < (out_rows - 1) * dst_stride + out_row_bytes {
        return Err(WolfError::format(format!(
            "Destination of {} bytes with stride {} cannot hold {} rows of {} bytes",
            dst.len(),
            dst_stride,
            out_rows,
            out_row_bytes
        )));
    }

    if factor == ScaleFactor::X4 {
        let mid_stride = row_bytes * 2;
        let mut mid = vec![0u8; mid_stride * height * 2];
        expand(&mut mid, mid_stride, src, src_stride, bpp, width, height, factor.emitted_rows());
        expand(
            dst,
            dst_stride,
            &mid,
            mid_stride,
            bpp,
            width * 2,
            height * 2,
            factor.emitted_rows(),
        );
    } else {
        expand(dst, dst_stride, src, src_stride, bpp, width, height, factor.emitted_rows());
    }

    Ok(())
}

/// Scale a whole buffer. RGB buffers are widened to RGBA for the kernel and narrowed back.
pub fn scale_buffer(factor: ScaleFactor, buffer: &PixelBuffer) -> Result<PixelBuffer> {
    if buffer.format() == PixelFormat::Rgb24 {
        let scaled = scale_buffer(factor, &convert::to_rgba(buffer)?)?;
        return convert::rgba_to_rgb(&scaled);
    }

    let bpp = buffer.bytes_per_pixel();
    let width = buffer.width() * factor.horizontal();
    let height = buffer.height() * factor.vertical();
    let mut out = PixelBuffer::new(width, height, buffer.format());
    let dst_stride = out.stride();
    scale(
        factor,
        out.data_mut(),
        dst_stride,
        buffer.data(),
        buffer.stride(),
        bpp,
        buffer.width(),
        buffer.height(),
    )?;
    Ok(out)
}

fn pixel(row: &[u8], x: usize, bpp: usize) -> &[u8] {
    &row[x * bpp..(x + 1) * bpp]
}

fn row(src: &[u8], stride: usize, y: usize, len: usize) -> &[u8] {
    &src[y * stride..y * stride + len]
}

fn kernel<'a>(b: &'a [u8], d: &'a [u8], e: &'a [u8], f: &'a [u8], h: &'a [u8]) -> [&'a [u8]; 4] {
    if b != h && d != f {
        [
            if d == b { d } else { e },
            if b == f { f } else { e },
            if d == h { d } else { e },
            if h == f { f } else { e },
        ]
    } else {
        [e; 4]
    }
}

/// Centre row of the tall variants. A side neighbour is taken only when it meets `B` or `H`
/// and the corner on the far side of that meeting differs from `E`.
#[allow(clippy::too_many_arguments)]
fn centre_kernel<'a>(
    a: &'a [u8],
    b: &'a [u8],
    c: &'a [u8],
    d: &'a [u8],
    e: &'a [u8],
    f: &'a [u8],
    g: &'a [u8],
    h: &'a [u8],
    i: &'a [u8],
) -> [&'a [u8]; 2] {
    if b != h && d != f {
        [
            if (d == b && e != g) || (d == h && e != a) { d } else { e },
            if (f == b && e != i) || (f == h && e != c) { f } else { e },
        ]
    } else {
        [e; 2]
    }
}

// Bounds were validated by `scale`.
#[allow(clippy::too_many_arguments)]
fn expand(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    bpp: usize,
    width: usize,
    height: usize,
    emitted: &[Emit],
) {
    let row_bytes = width * bpp;

    for y in 0..height {
        let above = row(src, src_stride, y.saturating_sub(1), row_bytes);
        let current = row(src, src_stride, y, row_bytes);
        let below = row(src, src_stride, (y + 1).min(height - 1), row_bytes);

        for x in 0..width {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(width - 1);
            let e = pixel(current, x, bpp);
            let [e0, e1, e2, e3] = kernel(
                pixel(above, x, bpp),
                pixel(current, left, bpp),
                e,
                pixel(current, right, bpp),
                pixel(below, x, bpp),
            );

            for (i, emit) in emitted.iter().enumerate() {
                let [first, second] = match emit {
                    Emit::Upper => [e0, e1],
                    Emit::Centre => centre_kernel(
                        pixel(above, left, bpp),
                        pixel(above, x, bpp),
                        pixel(above, right, bpp),
                        pixel(current, left, bpp),
                        e,
                        pixel(current, right, bpp),
                        pixel(below, left, bpp),
                        pixel(below, x, bpp),
                        pixel(below, right, bpp),
                    ),
                    Emit::Lower => [e2, e3],
                };
                let start = (y * emitted.len() + i) * dst_stride + x * 2 * bpp;
                dst[start..start + bpp].copy_from_slice(first);
                dst[start + bpp..start + 2 * bpp].copy_from_slice(second);
            }
        }
    }
}
