//! Map container (`MAPHEAD`, `GAMEMAPS` / `MAPTEMP`)
//!
//! `MAPHEAD` starts with the RLEW tag, followed by u32 offsets of the map headers in the map
//! file; the first zero offset ends the list. Each map header points at three planes which are
//! copied through untouched.

use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use super::offset_table::ChunkRange;
use super::read_data_file;
use crate::binary_utils::{read_bytes, read_u16_le, read_u32_le, seek_to};
use crate::error::{Result, WolfError};

pub const MAP_NAME_LENGTH: usize = 16;
pub const PLANE_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapHeader {
    pub plane_offsets: [u32; PLANE_COUNT],
    pub plane_lengths: [u16; PLANE_COUNT],
    pub width: u16,
    pub height: u16,
    pub name: String,
    pub signature: [u8; 4],
}

impl MapHeader {
    pub fn parse(data: &[u8], offset: u32) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        seek_to(&mut cursor, u64::from(offset))?;

        let mut plane_offsets = [0u32; PLANE_COUNT];
        for slot in plane_offsets.iter_mut() {
            *slot = read_u32_le(&mut cursor)?;
        }
        let mut plane_lengths = [0u16; PLANE_COUNT];
        for slot in plane_lengths.iter_mut() {
            *slot = read_u16_le(&mut cursor)?;
        }
        let width = read_u16_le(&mut cursor)?;
        let height = read_u16_le(&mut cursor)?;

        // Names are NUL padded but may fill all 16 bytes.
        let raw_name = read_bytes(&mut cursor, MAP_NAME_LENGTH)?;
        let end = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
        let name = String::from_utf8_lossy(&raw_name[..end]).into_owned();

        let mut signature = [0u8; 4];
        signature.copy_from_slice(&read_bytes(&mut cursor, 4)?);

        Ok(MapHeader {
            plane_offsets,
            plane_lengths,
            width,
            height,
            name,
            signature,
        })
    }
}

/// A map header together with its raw plane data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMap {
    pub header: MapHeader,
    pub planes: [Vec<u8>; PLANE_COUNT],
}

#[derive(Debug)]
pub struct MapContainer {
    rlew_tag: u16,
    header_offsets: Vec<u32>,
    data: Vec<u8>,
}

impl MapContainer {
    /// `map_file` is `GAMEMAPS` for most releases and `MAPTEMP` for the first shareware one.
    pub fn open(dir: &Path, map_file: &str, extension: &str) -> Result<Self> {
        let head = read_data_file(dir, &format!("MAPHEAD.{}", extension))?;
        let data = read_data_file(dir, &format!("{}.{}", map_file, extension))?;
        Self::from_parts(&head, data)
    }

    pub fn from_parts(head: &[u8], data: Vec<u8>) -> Result<Self> {
        let mut cursor = Cursor::new(head);
        let rlew_tag = read_u16_le(&mut cursor)
            .map_err(|_| WolfError::format("Map head too short for its RLEW tag"))?;

        let mut header_offsets = Vec::new();
        while let Ok(offset) = read_u32_le(&mut cursor) {
            if offset == 0 {
                break;
            }
            header_offsets.push(offset);
        }

        debug!(
            "Map container: {} maps, RLEW tag {:#06x}",
            header_offsets.len(),
            rlew_tag
        );
        Ok(MapContainer {
            rlew_tag,
            header_offsets,
            data,
        })
    }

    pub fn rlew_tag(&self) -> u16 {
        self.rlew_tag
    }

    pub fn map_count(&self) -> usize {
        self.header_offsets.len()
    }

    pub fn header(&self, index: usize) -> Result<MapHeader> {
        let offset = *self.header_offsets.get(index).ok_or_else(|| {
            WolfError::format(format!(
                "Map {} past end of the {} map head",
                index,
                self.header_offsets.len()
            ))
        })?;
        MapHeader::parse(&self.data, offset)
    }

    pub fn map(&self, index: usize) -> Result<GameMap> {
        let header = self.header(index)?;
        let mut planes: [Vec<u8>; PLANE_COUNT] = Default::default();
        for (plane, (offset, length)) in planes
            .iter_mut()
            .zip(header.plane_offsets.iter().zip(header.plane_lengths))
        {
            let range = ChunkRange {
                offset: *offset,
                length: u32::from(length),
            };
            *plane = range.slice(&self.data)?.to_vec();
        }
        Ok(GameMap { header, planes })
    }
}
