//! RIFF/WAVE PCM output with the canonical 44 byte header.

use crate::error::{Result, WolfError};

pub const WAV_HEADER_SIZE: usize = 44;

/// Digitised sounds in the page file.
pub const PAGE_SOUND_RATE: u32 = 7000;
pub const JAGUAR_SOUND_RATE: u32 = 22050;

/// Wrap PCM `samples` in a WAVE container. `sample_size` is in bytes.
pub fn encode(samples: &[u8], channels: u16, rate: u32, sample_size: u16) -> Result<Vec<u8>> {
    let size = u32::try_from(samples.len())
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| {
            WolfError::format(format!("{} bytes of audio is too long for WAVE", samples.len()))
        })?;

    let mut out = Vec::with_capacity(WAV_HEADER_SIZE + samples.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(size + 36).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    let byte_rate = rate * u32::from(sample_size) * u32::from(channels);
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&sample_size.to_le_bytes());
    out.extend_from_slice(&(sample_size * 8).to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(samples);

    Ok(out)
}
