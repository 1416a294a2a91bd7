//! Macintosh MacBinary resource file
//!
//! The Macintosh release ships as one MacBinary file. Resources are addressed by absolute file
//! offset; every block is followed by the big-endian length of the block after it, so runs of
//! walls and sprites are walked as chains.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::binary_utils::{slice_at, u32_be_at};
use crate::error::{Result, WolfError};
use crate::graphics::{Palette, PALETTE_SIZE};

pub const MACBINARY_NAME: &str = "Wolfenstein 3D";
pub const MACBINARY_TYPE_CREATOR: &[u8; 8] = b"APPLWOLF";
pub const DATA_FORK_LENGTH: u32 = 105_754;
pub const RESOURCE_FORK_LENGTH: u32 = 2_424_697;

const NAME_LENGTH_OFFSET: usize = 1;
const TYPE_CREATOR_OFFSET: usize = 65;
const DATA_FORK_OFFSET: usize = 83;
const RESOURCE_FORK_OFFSET: usize = 87;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacBinaryHeader {
    pub name: String,
    pub type_creator: [u8; 8],
    pub data_fork_length: u32,
    pub resource_fork_length: u32,
}

impl MacBinaryHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let name_length = usize::from(*data.get(NAME_LENGTH_OFFSET).ok_or_else(|| {
            WolfError::format("File too short for a MacBinary header")
        })?);
        if !(1..=31).contains(&name_length) {
            return Err(WolfError::format(format!(
                "MacBinary name length {} outside 1..=31",
                name_length
            )));
        }

        // The stored name carries one trailing byte that is not part of the title.
        let name_bytes = slice_at(data, NAME_LENGTH_OFFSET + 1, name_length)?;
        let name = String::from_utf8_lossy(&name_bytes[..name_length - 1]).into_owned();

        let mut type_creator = [0u8; 8];
        type_creator.copy_from_slice(slice_at(data, TYPE_CREATOR_OFFSET, 8)?);

        Ok(MacBinaryHeader {
            name,
            type_creator,
            data_fork_length: u32_be_at(data, DATA_FORK_OFFSET)?,
            resource_fork_length: u32_be_at(data, RESOURCE_FORK_OFFSET)?,
        })
    }

    pub fn is_wolfenstein(&self) -> bool {
        self.name == MACBINARY_NAME
            && &self.type_creator == MACBINARY_TYPE_CREATOR
            && self.data_fork_length == DATA_FORK_LENGTH
            && self.resource_fork_length == RESOURCE_FORK_LENGTH
    }
}

/// One resource block and the length of the block that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceBlock<'a> {
    pub data: &'a [u8],
    pub next_length: u32,
}

#[derive(Debug)]
pub struct MacResourceFile {
    header: MacBinaryHeader,
    data: Vec<u8>,
}

impl MacResourceFile {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_bytes(fs::read(path)?)
    }

    /// Rejects anything that is not the known Wolfenstein 3D MacBinary release.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let header = MacBinaryHeader::parse(&data)?;
        if !header.is_wolfenstein() {
            return Err(WolfError::format(format!(
                "Unknown MacBinary file \"{}\" ({} data, {} resource bytes)",
                header.name, header.data_fork_length, header.resource_fork_length
            )));
        }
        debug!("MacBinary header: {:?}", header);
        Ok(MacResourceFile { header, data })
    }

    pub fn header(&self) -> &MacBinaryHeader {
        &self.header
    }

    pub fn block(&self, offset: u32, length: u32) -> Result<ResourceBlock<'_>> {
        let start = offset as usize;
        let data = slice_at(&self.data, start, length as usize).map_err(|_| {
            WolfError::format(format!(
                "Resource block {}+{} outside the {} byte file",
                offset,
                length,
                self.data.len()
            ))
        })?;
        let next_length = u32_be_at(&self.data, start + length as usize).map_err(|_| {
            WolfError::format(format!(
                "Resource block at {} has no trailing length",
                offset
            ))
        })?;
        Ok(ResourceBlock { data, next_length })
    }

    /// Raw 8-bit RGB palette resource.
    pub fn palette(&self, offset: u32) -> Result<Palette> {
        let block = self.block(offset, PALETTE_SIZE as u32)?;
        Palette::from_bytes(block.data)
    }

    /// Walk `count` chained blocks starting at `offset`.
    pub fn chain(&self, offset: u32, length: u32, count: usize) -> ResourceChain<'_> {
        ResourceChain {
            file: self,
            offset,
            length,
            remaining: count,
        }
    }
}

/// Iterator over chained blocks. It stops after the first error, since the next offset is
/// unknown without the failed block's trailer.
pub struct ResourceChain<'a> {
    file: &'a MacResourceFile,
    offset: u32,
    length: u32,
    remaining: usize,
}

impl<'a> Iterator for ResourceChain<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.file.block(self.offset, self.length) {
            Ok(block) => {
                self.remaining -= 1;
                self.offset += self.length + 4;
                self.length = block.next_length;
                Some(Ok(block.data))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}
