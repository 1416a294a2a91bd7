//! Graphics chunks are compressed with a static 255-node Huffman tree shipped in the
//! dictionary file (VGADICT.*). Each chunk starts with its expanded length.

use std::io::Cursor;

use crate::binary_utils::{read_u16_le, read_u32_le};
use crate::containers::CompressionContainer;
use crate::error::{Result, WolfError};

pub const HUFFMAN_NODE_COUNT: usize = 255;
pub const HUFFMAN_ROOT: usize = 254;
pub const HUFFMAN_DICTIONARY_SIZE: usize = HUFFMAN_NODE_COUNT * 4;
const EXPANDED_LENGTH_PREFIX: usize = 4;

/// One tree node. Values below 256 are literal bytes, anything else addresses node `value - 256`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffNode {
    pub bit0: u16,
    pub bit1: u16,
}

#[derive(Debug, Clone)]
pub struct HuffmanTable {
    nodes: Box<[HuffNode; HUFFMAN_NODE_COUNT]>,
}

impl HuffmanTable {
    pub fn from_nodes(nodes: [HuffNode; HUFFMAN_NODE_COUNT]) -> Self {
        HuffmanTable {
            nodes: Box::new(nodes),
        }
    }

    /// Parse a dictionary file. Extra trailing bytes are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HUFFMAN_DICTIONARY_SIZE {
            return Err(WolfError::format(format!(
                "Huffman dictionary too short: {} < {}",
                data.len(),
                HUFFMAN_DICTIONARY_SIZE
            )));
        }

        let mut cursor = Cursor::new(data);
        let mut nodes = [HuffNode::default(); HUFFMAN_NODE_COUNT];
        for node in nodes.iter_mut() {
            node.bit0 = read_u16_le(&mut cursor)?;
            node.bit1 = read_u16_le(&mut cursor)?;
        }

        Ok(Self::from_nodes(nodes))
    }

    pub fn node(&self, index: usize) -> Option<&HuffNode> {
        self.nodes.get(index)
    }
}

/// Expand `source` into exactly `expected_length` bytes.
///
/// Bits are consumed least-significant first. Decoding stops as soon as the last byte is emitted,
/// so trailing bits and bytes are never touched. Every bit read advances the cursor, which bounds
/// the walk at `8 * source.len()` steps even for a table that never reaches a literal.
pub fn expand(source: &[u8], expected_length: usize, table: &HuffmanTable) -> Result<Vec<u8>> {
    // Every emitted byte costs at least one bit
    let mut output = Vec::with_capacity(expected_length.min(source.len().saturating_mul(8)));
    let mut node = HUFFMAN_ROOT;
    let mut bit_pos = 0usize;

    while output.len() < expected_length {
        let byte = *source.get(bit_pos / 8).ok_or_else(|| {
            WolfError::overrun(
                "huffman",
                format!(
                    "input exhausted after {} of {} bytes",
                    output.len(),
                    expected_length
                ),
            )
        })?;
        let bit = (byte >> (bit_pos % 8)) & 1;
        bit_pos += 1;

        let entry = table.node(node).ok_or_else(|| {
            WolfError::overrun("huffman", format!("node {} outside table", node))
        })?;
        let value = if bit == 1 { entry.bit1 } else { entry.bit0 };

        if value < 256 {
            output.push(value as u8);
            node = HUFFMAN_ROOT;
        } else {
            node = usize::from(value - 256);
        }
    }

    Ok(output)
}

/// A graphics chunk as stored on disk: u32 expanded length followed by the bitstream.
pub struct HuffmanChunk<'a> {
    pub compressed: &'a [u8],
    pub table: &'a HuffmanTable,
}

impl<'a> HuffmanChunk<'a> {
    pub fn new(compressed: &'a [u8], table: &'a HuffmanTable) -> Self {
        HuffmanChunk { compressed, table }
    }

    /// The prefix is sometimes described as two u16 halves, low word first. Read as one
    /// little-endian u32 it is the same value.
    pub fn expanded_length(&self) -> Result<usize> {
        let mut cursor = Cursor::new(self.compressed);
        let length = read_u32_le(&mut cursor).map_err(|_| {
            WolfError::format(format!(
                "Chunk of {} bytes has no length prefix",
                self.compressed.len()
            ))
        })?;
        Ok(length as usize)
    }
}

impl CompressionContainer for HuffmanChunk<'_> {
    fn decompress(&self) -> Result<Vec<u8>> {
        let length = self.expanded_length()?;
        expand(
            &self.compressed[EXPANDED_LENGTH_PREFIX..],
            length,
            self.table,
        )
    }
}
