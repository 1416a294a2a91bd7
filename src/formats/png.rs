//! PNG previews, optionally squeezed with oxipng.

use std::fs;
use std::path::Path;

use image::{RgbImage, RgbaImage};
use tracing::warn;

use crate::error::{Result, WolfError};
use crate::graphics::{PixelBuffer, PixelFormat};

pub fn save(buffer: &PixelBuffer, path: &Path, optimise: bool) -> Result<()> {
    let target = if optimise {
        path.with_extension("temp.png")
    } else {
        path.to_path_buf()
    };

    let (width, height) = (buffer.width() as u32, buffer.height() as u32);
    let mismatch = || WolfError::format("Pixel buffer does not match its dimensions");
    match buffer.format() {
        PixelFormat::Rgba32 => RgbaImage::from_raw(width, height, buffer.data().to_vec())
            .ok_or_else(mismatch)?
            .save(&target)?,
        PixelFormat::Rgb24 => RgbImage::from_raw(width, height, buffer.data().to_vec())
            .ok_or_else(mismatch)?
            .save(&target)?,
        PixelFormat::Indexed8 => {
            return Err(WolfError::format("PNG previews need RGB or RGBA pixels"))
        }
    }

    if optimise {
        if let Err(e) = optimise_file(&target, path) {
            warn!(
                "{}: {}. File saved unoptimised.",
                path.display(),
                e
            );
            fs::rename(&target, path)?;
        } else {
            let _ = fs::remove_file(&target);
        }
    }

    Ok(())
}

fn optimise_file(from: &Path, to: &Path) -> Result<()> {
    // Preset 2 is as small as 6 on these images and much faster
    let mut options = oxipng::Options::from_preset(2);
    options.bit_depth_reduction = true;
    options.interlace = None;

    oxipng::optimize(
        &oxipng::InFile::Path(from.to_path_buf()),
        &oxipng::OutFile::Path(Some(to.to_path_buf())),
        &options,
    )
    .map_err(|e| WolfError::Optimise(e.to_string()))
}
