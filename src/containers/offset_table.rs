//! Chunk offset tables
//!
//! Graphics headers pack one 24-bit little-endian offset per chunk, with `0xFFFFFF` marking a
//! sparse (absent) chunk. Audio headers store plain 32-bit offsets. Every table carries one
//! trailing offset past the last chunk, so a chunk's length is always the distance to the next
//! real offset.

use std::io::Cursor;

use crate::binary_utils::{read_u24_le, read_u32_le};
use crate::error::{Result, WolfError};

pub const SPARSE_OFFSET: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub offset: u32,
    pub length: u32,
}

impl ChunkRange {
    pub fn end(&self) -> usize {
        self.offset as usize + self.length as usize
    }

    /// Borrow this range out of the container bytes.
    pub fn slice<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        data.get(self.offset as usize..self.end()).ok_or_else(|| {
            WolfError::format(format!(
                "Chunk range {}..{} outside file of {} bytes",
                self.offset,
                self.end(),
                data.len()
            ))
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct OffsetTable {
    entries: Vec<Option<u32>>,
}

impl OffsetTable {
    pub fn new(entries: Vec<Option<u32>>) -> Self {
        OffsetTable { entries }
    }

    /// Graphics header layout: 3 bytes per entry, `file_size / 3` entries.
    pub fn from_packed24(data: &[u8]) -> Result<Self> {
        let count = data.len() / 3;
        if count == 0 {
            return Err(WolfError::format("Offset table is empty"));
        }

        let mut cursor = Cursor::new(data);
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let value = read_u24_le(&mut cursor)? & SPARSE_OFFSET;
            entries.push(if value == SPARSE_OFFSET {
                None
            } else {
                Some(value)
            });
        }

        Ok(OffsetTable { entries })
    }

    /// Audio header layout: one little-endian u32 per entry.
    pub fn from_u32_le(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(WolfError::format(format!(
                "Offset table too short: {} bytes",
                data.len()
            )));
        }

        let mut cursor = Cursor::new(data);
        let entries = (0..data.len() / 4)
            .map(|_| read_u32_le(&mut cursor).map(Some))
            .collect::<std::io::Result<Vec<_>>>()?;

        Ok(OffsetTable { entries })
    }

    /// Number of table entries, including the trailing terminator.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of addressable chunks (every entry except the terminator).
    pub fn chunk_count(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Raw file offset for a chunk, `None` when sparse.
    pub fn offset(&self, chunk_id: usize) -> Result<Option<u32>> {
        self.entries.get(chunk_id).copied().ok_or_else(|| {
            WolfError::format(format!(
                "Chunk {} past end of offset table ({} entries)",
                chunk_id,
                self.entries.len()
            ))
        })
    }

    /// Resolve a chunk to its byte range, skipping sparse successors.
    pub fn resolve(&self, chunk_id: usize) -> Result<Option<ChunkRange>> {
        let offset = match self.offset(chunk_id)? {
            Some(offset) => offset,
            None => return Ok(None),
        };

        let next = self.entries[chunk_id + 1..]
            .iter()
            .find_map(|entry| *entry)
            .ok_or_else(|| {
                WolfError::format(format!(
                    "Chunk {} has no terminating offset after it",
                    chunk_id
                ))
            })?;

        if next < offset {
            return Err(WolfError::format(format!(
                "Chunk {} ends before it starts ({} < {})",
                chunk_id, next, offset
            )));
        }

        Ok(Some(ChunkRange {
            offset,
            length: next - offset,
        }))
    }
}
