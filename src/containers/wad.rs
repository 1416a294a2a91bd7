//! Atari Jaguar WAD
//!
//! The ROM image carries an id-style WAD at a fixed offset. All positions in the WAD header and
//! lump directory are relative to that offset. Lumps whose first name byte has the high bit set
//! are LZSS compressed; the directory size is then the expanded size.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::compression::JaguarLzssChunk;
use super::{CompressionContainer, ContainerHandler};
use crate::binary_utils::{slice_at, u32_le_at};
use crate::error::{Result, WolfError};

pub const ROM_WAD_OFFSET: usize = 0x20000;
pub const LUMP_NAME_LENGTH: usize = 8;
const WAD_HEADER_SIZE: usize = 12;
const DIRECTORY_ENTRY_SIZE: usize = 16;
const COMPRESSED_FLAG: u8 = 0x80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumpInfo {
    pub position: u32,
    pub size: u32,
    /// Name with the compression flag cleared, cut at the first NUL.
    pub name: String,
    pub compressed: bool,
}

impl LumpInfo {
    fn parse(entry: &[u8]) -> Result<Self> {
        let position = u32_le_at(entry, 0)?;
        let size = u32_le_at(entry, 4)?;

        let mut raw = [0u8; LUMP_NAME_LENGTH];
        raw.copy_from_slice(slice_at(entry, 8, LUMP_NAME_LENGTH)?);
        let compressed = raw[0] & COMPRESSED_FLAG != 0;
        raw[0] &= !COMPRESSED_FLAG;

        let end = raw.iter().position(|&b| b == 0).unwrap_or(LUMP_NAME_LENGTH);
        let name = String::from_utf8_lossy(&raw[..end]).into_owned();

        Ok(LumpInfo {
            position,
            size,
            name,
            compressed,
        })
    }
}

#[derive(Debug)]
pub struct WadFile {
    data: Vec<u8>,
    lumps: Vec<LumpInfo>,
}

impl ContainerHandler for WadFile {
    fn magic_words() -> &'static [&'static [u8]] {
        &[b"IWAD", b"PWAD"]
    }

    fn matches(data: &[u8]) -> bool {
        data.get(ROM_WAD_OFFSET..)
            .map(|wad| Self::magic_words().iter().any(|magic| wad.starts_with(magic)))
            .unwrap_or(false)
    }

    fn deserialise(data: Vec<u8>) -> Result<Self> {
        if !Self::matches(&data) {
            return Err(WolfError::format(format!(
                "No IWAD or PWAD id at ROM offset {:#x}",
                ROM_WAD_OFFSET
            )));
        }

        let header = slice_at(&data, ROM_WAD_OFFSET, WAD_HEADER_SIZE)?;
        let lump_count = u32_le_at(header, 4)? as usize;
        let directory = ROM_WAD_OFFSET + u32_le_at(header, 8)? as usize;

        let entries = lump_count
            .checked_mul(DIRECTORY_ENTRY_SIZE)
            .and_then(|length| data.get(directory..directory.checked_add(length)?))
            .ok_or_else(|| {
                WolfError::format(format!(
                    "WAD directory of {} lumps at {:#x} outside the {} byte ROM",
                    lump_count,
                    directory,
                    data.len()
                ))
            })?;

        let lumps = entries
            .chunks_exact(DIRECTORY_ENTRY_SIZE)
            .map(LumpInfo::parse)
            .collect::<Result<Vec<_>>>()?;
        if lumps.is_empty() {
            return Err(WolfError::format("WAD has no lumps"));
        }

        debug!("WAD: {} lumps, directory at {:#x}", lumps.len(), directory);
        Ok(WadFile { data, lumps })
    }
}

impl WadFile {
    pub fn open(path: &Path) -> Result<Self> {
        Self::deserialise(fs::read(path)?)
    }

    pub fn lump_count(&self) -> usize {
        self.lumps.len()
    }

    pub fn lump(&self, id: usize) -> Result<&LumpInfo> {
        self.lumps.get(id).ok_or_else(|| {
            WolfError::format(format!(
                "Lump {} past end of the {} lump directory",
                id,
                self.lumps.len()
            ))
        })
    }

    /// Case-insensitive lookup. Later lumps win, so patch lumps take precedence.
    pub fn find(&self, name: &str) -> Option<usize> {
        let wanted: String = name.chars().take(LUMP_NAME_LENGTH).collect();
        self.lumps
            .iter()
            .rposition(|lump| lump.name.eq_ignore_ascii_case(&wanted))
    }

    /// Lump bytes, expanded when compressed.
    pub fn read(&self, id: usize) -> Result<Vec<u8>> {
        let lump = self.lump(id)?;
        let start = ROM_WAD_OFFSET + lump.position as usize;
        let size = lump.size as usize;

        if lump.compressed {
            // The stored stream is never longer than the expanded lump, but may run to the end
            // of the ROM.
            let end = start.saturating_add(size).min(self.data.len());
            let compressed = self.data.get(start..end).ok_or_else(|| {
                WolfError::format(format!("Lump {} starts past end of ROM", lump.name))
            })?;
            return JaguarLzssChunk::new(compressed, size).decompress();
        }

        slice_at(&self.data, start, size)
            .map(|bytes| bytes.to_vec())
            .map_err(|_| {
                WolfError::format(format!(
                    "Lump {} ({}+{}) outside the ROM",
                    lump.name, lump.position, lump.size
                ))
            })
    }

    pub fn read_named(&self, name: &str) -> Result<Vec<u8>> {
        let id = self
            .find(name)
            .ok_or_else(|| WolfError::format(format!("Lump {} not found", name)))?;
        self.read(id)
    }
}
