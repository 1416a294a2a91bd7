//! Page file (`VSWAP`, called `GFXTILES` by some games)
//!
//! A u16 page count, sprite start and sound start, then one u32 offset and one u16 length per
//! page. Pages below the sprite start are walls, pages up to the sound start are sprites and
//! the rest hold digitised sound split into 4KB pages.

use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use super::offset_table::ChunkRange;
use super::read_data_file;
use crate::binary_utils::{read_u16_le, read_u32_le};
use crate::error::{Result, WolfError};
use crate::graphics::{sprite, wall, Palette, PixelBuffer, PixelFormat};

pub const PAGE_SIZE: usize = 4096;
/// Longest sound the engine can buffer.
pub const MAX_SOUND_LENGTH: usize = 20 * PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    pub offset: u32,
    pub length: u16,
}

/// A digitised sound assembled from consecutive pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitisedSound {
    /// Index relative to the first sound page.
    pub index: u32,
    pub samples: Vec<u8>,
}

#[derive(Debug)]
pub struct PageFile {
    data: Vec<u8>,
    pages: Vec<PageEntry>,
    sprite_start: u32,
    sound_start: u32,
}

impl PageFile {
    /// Read the page file `name` (`VSWAP.WL6`, `GFXTILES.CO7`...) from `dir`.
    pub fn open(dir: &Path, name: &str) -> Result<Self> {
        let data = read_data_file(dir, name)?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut cursor = Cursor::new(data.as_slice());
        let count = read_u16_le(&mut cursor)?;
        let sprite_start = u32::from(read_u16_le(&mut cursor)?);
        let sound_start = u32::from(read_u16_le(&mut cursor)?);

        if sprite_start > sound_start || sound_start > u32::from(count) {
            return Err(WolfError::format(format!(
                "Page file ranges out of order: sprites at {}, sounds at {}, {} pages",
                sprite_start, sound_start, count
            )));
        }

        let offsets = (0..count)
            .map(|_| read_u32_le(&mut cursor))
            .collect::<std::io::Result<Vec<_>>>()?;
        let lengths = (0..count)
            .map(|_| read_u16_le(&mut cursor))
            .collect::<std::io::Result<Vec<_>>>()?;

        let pages = offsets
            .into_iter()
            .zip(lengths)
            .map(|(offset, length)| PageEntry { offset, length })
            .collect();

        debug!(
            "Page file: {} pages, sprites from {}, sounds from {}",
            count, sprite_start, sound_start
        );

        Ok(PageFile {
            data,
            pages,
            sprite_start,
            sound_start,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn sprite_start(&self) -> u32 {
        self.sprite_start
    }

    pub fn sound_start(&self) -> u32 {
        self.sound_start
    }

    /// Raw page bytes. A zero-length page is empty and gives `None`.
    pub fn page(&self, index: u32) -> Result<Option<&[u8]>> {
        let entry = self.pages.get(index as usize).ok_or_else(|| {
            WolfError::format(format!(
                "Page {} past end of the {} page file",
                index,
                self.pages.len()
            ))
        })?;
        if entry.length == 0 {
            return Ok(None);
        }
        let range = ChunkRange {
            offset: entry.offset,
            length: u32::from(entry.length),
        };
        range.slice(&self.data).map(Some)
    }

    pub fn wall(&self, index: u32, palette: &Palette, format: PixelFormat) -> Result<Option<PixelBuffer>> {
        if index >= self.sprite_start {
            return Err(WolfError::format(format!("Page {} is not a wall", index)));
        }
        match self.page(index)? {
            Some(page) => wall::decode_page(page, palette, format).map(Some),
            None => Ok(None),
        }
    }

    pub fn sprite(
        &self,
        index: u32,
        palette: &Palette,
        format: PixelFormat,
    ) -> Result<Option<PixelBuffer>> {
        if index < self.sprite_start || index >= self.sound_start {
            return Err(WolfError::format(format!("Page {} is not a sprite", index)));
        }
        match self.page(index)? {
            Some(page) => sprite::decode(page, palette, format).map(Some),
            None => Ok(None),
        }
    }

    /// Join sound pages until a short page ends each sound.
    ///
    /// Each sound is named after the page that completes it. A sound longer than
    /// [`MAX_SOUND_LENGTH`] gives an error in its slot, and the sounds after it are still
    /// assembled. A trailing run of full pages with no short page after it is dropped.
    pub fn sounds(&self) -> Result<Vec<Result<DigitisedSound>>> {
        let mut sounds = Vec::new();
        let mut buffer = Vec::new();
        let mut overflowed = false;

        for index in self.sound_start..self.page_count() {
            let page = match self.page(index)? {
                Some(page) => page,
                None => continue,
            };

            if !overflowed && buffer.len() + page.len() > MAX_SOUND_LENGTH {
                overflowed = true;
                buffer.clear();
            }
            if !overflowed {
                buffer.extend_from_slice(page);
            }

            if page.len() < PAGE_SIZE {
                let relative = index - self.sound_start;
                if overflowed {
                    sounds.push(Err(WolfError::format(format!(
                        "Sound {} is longer than {} bytes",
                        relative, MAX_SOUND_LENGTH
                    ))));
                    overflowed = false;
                } else {
                    sounds.push(Ok(DigitisedSound {
                        index: relative,
                        samples: std::mem::take(&mut buffer),
                    }));
                }
            }
        }

        Ok(sounds)
    }
}
