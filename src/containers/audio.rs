//! Audio container (`AUDIOHED`, `AUDIOT`)
//!
//! The header is a flat table of u32 offsets into the audio file. Chunks are stored
//! uncompressed: PC speaker and AdLib sound effects, digitised sound references, then IMF music.

use std::path::Path;

use tracing::debug;

use super::offset_table::OffsetTable;
use super::read_data_file;
use crate::binary_utils::{u16_le_at, u32_le_at};
use crate::error::{Result, WolfError};

/// Sound common header, instrument and octave block.
pub const ADLIB_HEADER_SIZE: usize = 6 + 16 + 1;
/// IMF playback rate in ticks per second.
pub const IMF_RATE: u32 = 700;

#[derive(Debug)]
pub struct AudioContainer {
    offsets: OffsetTable,
    data: Vec<u8>,
}

impl AudioContainer {
    pub fn open(dir: &Path, extension: &str) -> Result<Self> {
        let head = read_data_file(dir, &format!("AUDIOHED.{}", extension))?;
        let data = read_data_file(dir, &format!("AUDIOT.{}", extension))?;
        Self::from_parts(&head, data)
    }

    pub fn from_parts(head: &[u8], data: Vec<u8>) -> Result<Self> {
        let offsets = OffsetTable::from_u32_le(head)?;
        debug!("Audio container: {} chunks", offsets.chunk_count());
        Ok(AudioContainer { offsets, data })
    }

    pub fn chunk_count(&self) -> usize {
        self.offsets.chunk_count()
    }

    /// Chunk bytes. An empty chunk gives `None`.
    pub fn chunk(&self, id: u32) -> Result<Option<&[u8]>> {
        match self.offsets.resolve(id as usize)? {
            Some(range) if range.length > 0 => range.slice(&self.data).map(Some),
            _ => Ok(None),
        }
    }
}

/// Leading fields of an AdLib sound effect chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdLibSoundHeader {
    /// Number of note bytes after the header.
    pub length: u32,
    pub priority: u16,
    pub block: u8,
}

impl AdLibSoundHeader {
    pub fn parse(chunk: &[u8]) -> Result<Self> {
        if chunk.len() < ADLIB_HEADER_SIZE {
            return Err(WolfError::format(format!(
                "AdLib sound of {} bytes is shorter than its header",
                chunk.len()
            )));
        }
        Ok(AdLibSoundHeader {
            length: u32_le_at(chunk, 0)?,
            priority: u16_le_at(chunk, 4)?,
            block: chunk[ADLIB_HEADER_SIZE - 1],
        })
    }
}

/// Playing time of an IMF music chunk in milliseconds.
///
/// The chunk starts with a u16 byte count of `{register, value, delay}` commands, four bytes
/// each. Chunks whose count is 0 or 1 hold no music.
pub fn imf_duration_ms(chunk: &[u8]) -> Result<Option<u32>> {
    let mut remaining = u16_le_at(chunk, 0)?;
    if remaining <= 1 {
        return Ok(None);
    }

    let mut position = 2;
    let (mut time, mut ticks) = (0u32, 0u32);
    loop {
        while remaining > 0 && time <= ticks {
            let delay = u16_le_at(chunk, position + 2).map_err(|_| {
                WolfError::format(format!(
                    "IMF command at {} past end of {} byte chunk",
                    position,
                    chunk.len()
                ))
            })?;
            time = ticks + u32::from(delay);
            position += 4;
            remaining = remaining.saturating_sub(4);
        }

        ticks += 1;
        if remaining == 0 {
            break;
        }
    }

    Ok(Some(ticks * 1000 / IMF_RATE))
}
