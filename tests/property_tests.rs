use proptest::prelude::*;

use wolf_extractor::containers::compression::huffman::{
    expand, HuffNode, HuffmanTable, HUFFMAN_NODE_COUNT, HUFFMAN_ROOT,
};
use wolf_extractor::containers::compression::lzss;
use wolf_extractor::formats::tga::{self, TgaOptions, TGA_HEADER_SIZE};
use wolf_extractor::graphics::scale::{scale_buffer, ScaleFactor};
use wolf_extractor::graphics::{bitplane, Palette, PixelBuffer, PixelFormat};

/// Complete tree of depth 8: the code for byte `v` is its bits, most significant first.
fn byte_table() -> HuffmanTable {
    let mut nodes = [HuffNode::default(); HUFFMAN_NODE_COUNT];
    for (node, entry) in nodes.iter_mut().enumerate() {
        let heap = HUFFMAN_ROOT - node;
        let child = |c: usize| {
            if c >= HUFFMAN_NODE_COUNT {
                (c - HUFFMAN_NODE_COUNT) as u16
            } else {
                (HUFFMAN_ROOT - c) as u16 + 256
            }
        };
        entry.bit0 = child(2 * heap + 1);
        entry.bit1 = child(2 * heap + 2);
    }
    HuffmanTable::from_nodes(nodes)
}

/// Pack code bits least significant bit first, as the expander reads them.
fn pack_bits(bits: impl Iterator<Item = u8>) -> Vec<u8> {
    let bits: Vec<u8> = bits.collect();
    bits.chunks(8)
        .map(|group| group.iter().enumerate().fold(0u8, |acc, (i, &b)| acc | b << i))
        .collect()
}

/// Greedy Macintosh LZSS encoder: literals flagged 1, matches of 3..=18 within 4095 bytes.
fn lzss_encode(input: &[u8]) -> Vec<u8> {
    let mut tokens: Vec<(bool, Vec<u8>)> = Vec::new();
    let mut pos = 0;
    while pos < input.len() {
        let mut best = (0usize, 0usize);
        for distance in 1..=pos.min(0xFFF) {
            let start = pos - distance;
            let mut length = 0;
            while length < 18 && pos + length < input.len() && input[start + length] == input[pos + length]
            {
                length += 1;
            }
            if length > best.1 {
                best = (distance, length);
            }
        }

        if best.1 >= 3 {
            let run = ((best.1 as u32 - 3) << 12) | (0x1000 - best.0 as u32);
            tokens.push((false, vec![run as u8, (run >> 8) as u8]));
            pos += best.1;
        } else {
            tokens.push((true, vec![input[pos]]));
            pos += 1;
        }
    }

    let mut out = Vec::new();
    for group in tokens.chunks(8) {
        let flags = group
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, (literal, _))| acc | (u8::from(*literal) << i));
        out.push(flags);
        for (_, bytes) in group {
            out.extend_from_slice(bytes);
        }
    }
    out
}

proptest! {
    #[test]
    fn huffman_byte_tree_round_trips(values in prop::collection::vec(any::<u8>(), 0..256)) {
        let packed = pack_bits(values.iter().flat_map(|v| (0..8).rev().map(move |i| (v >> i) & 1)));
        let expanded = expand(&packed, values.len(), &byte_table()).unwrap();
        prop_assert_eq!(expanded, values);
    }

    #[test]
    fn huffman_two_literal_root(
        choices in prop::collection::vec(any::<bool>(), 0..200),
        zero in any::<u8>(),
        one in any::<u8>(),
    ) {
        let mut nodes = [HuffNode::default(); HUFFMAN_NODE_COUNT];
        nodes[HUFFMAN_ROOT] = HuffNode { bit0: u16::from(zero), bit1: u16::from(one) };
        let table = HuffmanTable::from_nodes(nodes);

        let packed = pack_bits(choices.iter().map(|&c| u8::from(c)));
        let expected: Vec<u8> = choices.iter().map(|&c| if c { one } else { zero }).collect();
        prop_assert_eq!(expand(&packed, choices.len(), &table).unwrap(), expected);
    }

    #[test]
    fn lzss_encoder_round_trips(
        input in prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c', 0u8]), 1..400)
    ) {
        let encoded = lzss_encode(&input);
        prop_assert_eq!(lzss::decode(&encoded, input.len()).unwrap(), input);
    }

    #[test]
    fn bitplanes_land_on_interleaved_columns(quarter in 1usize..6, height in 1usize..6, seed in any::<u8>()) {
        let width = quarter * 4;
        let chunk: Vec<u8> = (0..width * height).map(|i| (i as u8).wrapping_add(seed)).collect();
        let picture = bitplane::decode(&chunk, width, height, &Palette::greyscale(), PixelFormat::Rgb24).unwrap();

        // Plane p holds columns p, p + 4, p + 8... row by row
        let plane_size = width * height / 4;
        for (i, &value) in chunk.iter().enumerate() {
            let plane = i / plane_size;
            let within = i % plane_size;
            let x = (within % quarter) * 4 + plane;
            let y = within / quarter;
            prop_assert_eq!(picture.pixel(x, y).unwrap()[0], value);
        }
    }

    #[test]
    fn flat_regions_stay_flat(
        colour in any::<[u8; 4]>(),
        width in 2usize..9,
        height in 4usize..9,
        factor in prop::sample::select(vec![
            ScaleFactor::X2,
            ScaleFactor::X2x3,
            ScaleFactor::X2x4,
            ScaleFactor::X4,
        ]),
    ) {
        let source = PixelBuffer::filled(width, height, PixelFormat::Rgba32, &colour).unwrap();
        let scaled = scale_buffer(factor, &source).unwrap();
        prop_assert_eq!(scaled.width(), width * factor.horizontal());
        prop_assert_eq!(scaled.height(), height * factor.vertical());
        prop_assert!(scaled.data().chunks_exact(4).all(|p| p == colour));
    }

    #[test]
    fn tga_rle_reads_back(
        width in 1usize..40,
        height in 1usize..6,
        seed in prop::collection::vec(0u8..3, 1..8),
    ) {
        // Few distinct values so both packet kinds appear
        let data: Vec<u8> = (0..width * height * 3).map(|i| seed[(i / 3) % seed.len()] * 50).collect();
        let buffer = PixelBuffer::from_raw(width, height, PixelFormat::Rgb24, data).unwrap();
        let encoded = tga::encode(&buffer, TgaOptions::default()).unwrap();
        prop_assert_eq!(tga::decode(&encoded).unwrap(), buffer);
    }
}

#[test]
fn lzss_overlapping_back_reference() {
    // 'x', 'y', then 7 bytes from distance 2
    let run: u32 = ((7 - 3) << 12) | (0x1000 - 2);
    let src = [0b0000_0011, b'x', b'y', run as u8, (run >> 8) as u8];
    assert_eq!(lzss::decode(&src, 9).unwrap(), b"xyxyxyxyx");
}

#[test]
fn jaguar_sentinel_stops_and_zero_fills() {
    // two literals, then a length-1 reference
    let src = [0b0000_0100, b'x', b'y', 0x00, 0x00, b'z'];
    assert_eq!(lzss::decode_jaguar(&src, 5).unwrap(), b"xy\0\0\0");
}

#[test]
fn scale2x_keeps_corners_sharp() {
    // A single dark pixel in a light field keeps its own colour in all four output cells
    let mut source = PixelBuffer::filled(3, 3, PixelFormat::Rgba32, &[255, 255, 255, 255]).unwrap();
    source.put(1, 1, &[0, 0, 0, 255]);
    let scaled = scale_buffer(ScaleFactor::X2, &source).unwrap();
    for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
        assert_eq!(scaled.pixel(x, y), Some(&[0, 0, 0, 255][..]));
    }
    assert_eq!(scaled.pixel(0, 0), Some(&[255, 255, 255, 255][..]));
}

#[test]
fn tga_long_runs_pack_as_documented() {
    let mut data = vec![9u8; 130 * 3];
    for i in 1..=5u8 {
        data.extend_from_slice(&[i, i, i]);
    }
    let buffer = PixelBuffer::from_raw(135, 1, PixelFormat::Rgb24, data).unwrap();
    let encoded = tga::encode(&buffer, TgaOptions::default()).unwrap();

    let body = &encoded[TGA_HEADER_SIZE..];
    assert_eq!(&body[..4], &[0xFF, 9, 9, 9]);
    assert_eq!(&body[4..8], &[0x81, 9, 9, 9]);
    assert_eq!(body[8], 0x04);
    assert_eq!(body.len(), 9 + 5 * 3);
    assert_eq!(tga::decode(&encoded).unwrap(), buffer);
}
