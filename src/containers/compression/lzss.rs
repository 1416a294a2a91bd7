//! Two LZSS dialects: the Macintosh resource fork packs every block with a 4KB-window
//! scheme, the Jaguar WAD uses a 12-bit distance and a stop token.

use crate::containers::CompressionContainer;
use crate::error::{Result, WolfError};

const LZSS_WINDOW_SIZE: u32 = 0x1000;
const LZSS_MIN_MATCH: usize = 3;
const BUCKET_MARKER: u32 = 0x100;
const JAGUAR_LENGTH_SHIFT: u8 = 4;

fn next_byte(src: &[u8], pos: &mut usize, codec: &'static str) -> Result<u8> {
    let byte = *src.get(*pos).ok_or_else(|| {
        WolfError::overrun(
            codec,
            format!("source exhausted at byte {} of {}", pos, src.len()),
        )
    })?;
    *pos += 1;
    Ok(byte)
}

/// Decode a Macintosh LZSS stream into exactly `output_length` bytes.
pub fn decode(src: &[u8], output_length: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(output_length.min(src.len().saturating_mul(9)));
    if output_length == 0 {
        return Ok(output);
    }

    let mut pos = 0usize;
    // The marker bit falls out after eight shifts, which is the signal to refill
    let mut bucket = u32::from(next_byte(src, &mut pos, "lzss")?) | BUCKET_MARKER;

    while output.len() < output_length {
        if bucket & 1 != 0 {
            output.push(next_byte(src, &mut pos, "lzss")?);
        } else {
            let low = next_byte(src, &mut pos, "lzss")?;
            let high = next_byte(src, &mut pos, "lzss")?;
            let run = u32::from(low) | (u32::from(high) << 8);

            let distance = (LZSS_WINDOW_SIZE - (run & 0xFFF)) as usize;
            let count = ((run >> 12) & 0xF) as usize + LZSS_MIN_MATCH;
            let count = count.min(output_length - output.len());

            if distance > output.len() {
                return Err(WolfError::overrun(
                    "lzss",
                    format!(
                        "distance {} exceeds output {}",
                        distance,
                        output.len()
                    ),
                ));
            }

            // Byte-by-byte so a run can overlap the bytes it is producing
            let start = output.len() - distance;
            for i in 0..count {
                let byte = output[start + i];
                output.push(byte);
            }
        }

        bucket >>= 1;
        if bucket == 1 && output.len() < output_length {
            bucket = u32::from(next_byte(src, &mut pos, "lzss")?) | BUCKET_MARKER;
        }
    }

    Ok(output)
}

/// Decode a Jaguar WAD lump. Stops at the length-1 sentinel and zero-fills any shortfall up to
/// `output_length`.
pub fn decode_jaguar(src: &[u8], output_length: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(output_length);
    let mut pos = 0usize;
    let mut tokens = 0u8;
    let mut id_byte = 0u8;

    loop {
        if tokens == 0 {
            id_byte = next_byte(src, &mut pos, "jaguar lzss")?;
        }
        tokens = (tokens + 1) & 0x7;

        if id_byte & 1 != 0 {
            let first = next_byte(src, &mut pos, "jaguar lzss")?;
            let second = next_byte(src, &mut pos, "jaguar lzss")?;

            let distance =
                (usize::from(first) << JAGUAR_LENGTH_SHIFT) | usize::from(second >> JAGUAR_LENGTH_SHIFT);
            let count = usize::from(second & 0xF) + 1;
            if count == 1 {
                break;
            }

            if distance == 0 || distance > output.len() {
                return Err(WolfError::overrun(
                    "jaguar lzss",
                    format!(
                        "distance {} invalid for output {}",
                        distance,
                        output.len()
                    ),
                ));
            }
            if output.len() + count > output_length {
                return Err(WolfError::overrun(
                    "jaguar lzss",
                    format!(
                        "run of {} overflows {} byte lump",
                        count, output_length
                    ),
                ));
            }

            let start = output.len() - distance;
            for i in 0..count {
                let byte = output[start + i];
                output.push(byte);
            }
        } else {
            let byte = next_byte(src, &mut pos, "jaguar lzss")?;
            if output.len() >= output_length {
                return Err(WolfError::overrun(
                    "jaguar lzss",
                    format!("literal past end of {} byte lump", output_length),
                ));
            }
            output.push(byte);
        }

        id_byte >>= 1;
    }

    output.resize(output_length, 0);
    Ok(output)
}

/// Macintosh resource block with its expanded length already read from the block header.
pub struct LzssChunk<'a> {
    pub compressed: &'a [u8],
    pub expanded_length: usize,
}

impl<'a> LzssChunk<'a> {
    pub fn new(compressed: &'a [u8], expanded_length: usize) -> Self {
        LzssChunk {
            compressed,
            expanded_length,
        }
    }
}

impl CompressionContainer for LzssChunk<'_> {
    fn decompress(&self) -> Result<Vec<u8>> {
        decode(self.compressed, self.expanded_length)
    }
}

/// Compressed WAD lump. The lump directory size is the decompressed size.
pub struct JaguarLzssChunk<'a> {
    pub compressed: &'a [u8],
    pub lump_size: usize,
}

impl<'a> JaguarLzssChunk<'a> {
    pub fn new(compressed: &'a [u8], lump_size: usize) -> Self {
        JaguarLzssChunk {
            compressed,
            lump_size,
        }
    }
}

impl CompressionContainer for JaguarLzssChunk<'_> {
    fn decompress(&self) -> Result<Vec<u8>> {
        decode_jaguar(self.compressed, self.lump_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_only() {
        // 0xFF control byte: eight literals
        let src = [0xFF, b'w', b'o', b'l', b'f'];
        assert_eq!(decode(&src, 4).unwrap(), b"wolf");
    }

    #[test]
    fn overlapping_back_reference_repeats_pattern() {
        // literal 'a', literal 'b', then copy 6 from distance 2
        // run = (6 - 3) << 12 | (0x1000 - 2) = 0x3FFE
        let src = [0b0000_0011, b'a', b'b', 0xFE, 0x3F];
        assert_eq!(decode(&src, 8).unwrap(), b"abababab");
    }

    #[test]
    fn run_is_clamped_to_remaining_output() {
        // distance 1, length 18, only 4 bytes wanted after the literal
        let src = [0b0000_0001, b'z', 0xFF, 0xFF];
        assert_eq!(decode(&src, 5).unwrap(), b"zzzzz");
    }

    #[test]
    fn control_byte_is_refilled_after_eight_tokens() {
        let mut src = vec![0xFF];
        src.extend_from_slice(b"12345678");
        src.push(0x01);
        src.push(b'9');
        assert_eq!(decode(&src, 9).unwrap(), b"123456789");
    }

    #[test]
    fn zero_length_reads_nothing() {
        assert!(decode(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn reaching_before_output_start_is_an_overrun() {
        // back-reference as first token
        let src = [0x00, 0xFE, 0x0F];
        let err = decode(&src, 3).unwrap_err();
        assert!(matches!(err, WolfError::DecodeOverrun { codec: "lzss", .. }));
    }

    #[test]
    fn truncated_source_is_an_overrun() {
        let src = [0xFF, b'a'];
        assert!(decode(&src, 2).unwrap_err().is_format());
    }

    #[test]
    fn jaguar_sentinel_stops_and_zero_fills() {
        // literals 'x','y'; back-ref distance 2 length 3; then sentinel
        // id byte bits (lsb first): 0, 0, 1, 1
        let src = [0b0000_1100, b'x', b'y', 0x00, 0x22, 0x00, 0x00];
        let out = decode_jaguar(&src, 8).unwrap();
        assert_eq!(out, b"xyxyx\0\0\0");
    }

    #[test]
    fn jaguar_zero_distance_is_rejected() {
        let src = [0b0000_0010, b'q', 0x00, 0x05];
        assert!(decode_jaguar(&src, 8).is_err());
    }

    #[test]
    fn jaguar_output_overflow_is_rejected() {
        let src = [0x00, b'a', b'b', b'c'];
        let err = decode_jaguar(&src, 2).unwrap_err();
        assert!(matches!(err, WolfError::DecodeOverrun { .. }));
    }

    #[test]
    fn chunks_decompress_through_the_trait() {
        let mac = [0xFF, b'o', b'k'];
        assert_eq!(LzssChunk::new(&mac, 2).decompress().unwrap(), b"ok");
        let jag = [0b0000_0010, b'k', 0x00, 0x00];
        assert_eq!(JaguarLzssChunk::new(&jag, 2).decompress().unwrap(), b"k\0");
    }
}
