//! VGA graphics container (`VGADICT`, `VGAHEAD`, `VGAGRAPH`)
//!
//! The dictionary holds the Huffman tree, the header a packed 24-bit offset per chunk and the
//! graph file the compressed chunks themselves. Chunk 0 expands to the picture size table,
//! chunks `1..start_pics` are fonts and everything from `start_pics` on is a picture or a
//! text script.

use std::path::Path;

use tracing::debug;

use super::compression::{HuffmanChunk, HuffmanTable};
use super::offset_table::OffsetTable;
use super::{read_data_file, CompressionContainer};
use crate::error::{Result, WolfError};
use crate::graphics::{bitplane, font, Palette, PixelBuffer, PixelFormat};

pub const DEFAULT_START_PICS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicSize {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug)]
pub struct GraphicsContainer {
    table: HuffmanTable,
    offsets: OffsetTable,
    graph: Vec<u8>,
    pics: Vec<PicSize>,
    start_pics: u32,
}

impl GraphicsContainer {
    /// Load the three graphics files with the given extension from `dir`.
    pub fn open(dir: &Path, extension: &str, start_pics: u32) -> Result<Self> {
        let dict = read_data_file(dir, &format!("VGADICT.{}", extension))?;
        let head = read_data_file(dir, &format!("VGAHEAD.{}", extension))?;
        let graph = read_data_file(dir, &format!("VGAGRAPH.{}", extension))?;
        Self::from_parts(&dict, &head, graph, start_pics)
    }

    pub fn from_parts(dict: &[u8], head: &[u8], graph: Vec<u8>, start_pics: u32) -> Result<Self> {
        let table = HuffmanTable::from_bytes(dict)?;
        let offsets = OffsetTable::from_packed24(head)?;

        let mut container = GraphicsContainer {
            table,
            offsets,
            graph,
            pics: Vec::new(),
            start_pics,
        };

        let pic_table = container
            .chunk(0)?
            .ok_or_else(|| WolfError::format("Picture table chunk is sparse"))?;
        container.pics = pic_table
            .chunks_exact(4)
            .map(|entry| PicSize {
                width: u16::from_le_bytes([entry[0], entry[1]]),
                height: u16::from_le_bytes([entry[2], entry[3]]),
            })
            .collect();

        debug!(
            "Graphics container: {} chunks, {} pictures",
            container.offsets.chunk_count(),
            container.pics.len()
        );
        Ok(container)
    }

    pub fn chunk_count(&self) -> usize {
        self.offsets.chunk_count()
    }

    pub fn start_pics(&self) -> u32 {
        self.start_pics
    }

    /// Expanded chunk bytes, `None` for a sparse chunk.
    pub fn chunk(&self, id: u32) -> Result<Option<Vec<u8>>> {
        let range = match self.offsets.resolve(id as usize)? {
            Some(range) => range,
            None => return Ok(None),
        };
        let compressed = range.slice(&self.graph)?;
        HuffmanChunk::new(compressed, &self.table).decompress().map(Some)
    }

    pub fn pic_size(&self, id: u32) -> Result<PicSize> {
        if id < self.start_pics {
            return Err(WolfError::NotAnImage(id));
        }
        let index = (id - self.start_pics) as usize;
        self.pics.get(index).copied().ok_or_else(|| {
            WolfError::format(format!(
                "Picture {} past end of the {} entry picture table",
                id,
                self.pics.len()
            ))
        })
    }

    /// Decode a planar picture chunk. Sparse chunks give `None`.
    pub fn decode_picture(
        &self,
        id: u32,
        palette: &Palette,
        format: PixelFormat,
    ) -> Result<Option<PixelBuffer>> {
        let size = self.pic_size(id)?;
        let chunk = match self.chunk(id)? {
            Some(chunk) => chunk,
            None => return Ok(None),
        };
        bitplane::decode(
            &chunk,
            usize::from(size.width),
            usize::from(size.height),
            palette,
            format,
        )
        .map(Some)
    }

    pub fn decode_font(&self, id: u32, sheet_width: usize, sheet_height: usize) -> Result<PixelBuffer> {
        let chunk = self
            .chunk(id)?
            .ok_or_else(|| WolfError::format(format!("Font chunk {} is sparse", id)))?;
        font::decode(&chunk, sheet_width, sheet_height)
    }

    /// Raw text of a help or end-screen script chunk.
    pub fn script(&self, id: u32) -> Result<Vec<u8>> {
        self.chunk(id)?
            .ok_or_else(|| WolfError::format(format!("Script chunk {} is sparse", id)))
    }
}
