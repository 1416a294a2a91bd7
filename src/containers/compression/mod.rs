pub mod huffman;
pub mod lzss;

pub use huffman::{HuffNode, HuffmanChunk, HuffmanTable};
pub use lzss::{JaguarLzssChunk, LzssChunk};
