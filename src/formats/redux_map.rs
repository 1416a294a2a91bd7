//! Converted map layout
//!
//! All values little-endian:
//!
//! | Field | Size |
//! |---|---|
//! | signature | 4 |
//! | RLEW tag | u16 |
//! | width, height | u16, u16 |
//! | ceiling, floor colour (`0xRRGGBB`) | u32, u32 |
//! | plane lengths | 3 x u16 |
//! | plane offsets | 3 x u32 |
//! | name length, music path length | u16, u16 |
//! | par time | f32 |
//! | par time string | 5 |
//! | name, music path | variable |
//! | planes | variable |

use crate::binary_utils::write_u32;
use crate::error::{Result, WolfError};

pub const PAR_STRING_LENGTH: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ReduxMap {
    pub signature: [u8; 4],
    pub rlew_tag: u16,
    pub width: u16,
    pub height: u16,
    pub ceiling: u32,
    pub floor: u32,
    pub name: String,
    pub music_path: String,
    pub par_time: f32,
    pub par_string: String,
    pub planes: [Vec<u8>; 3],
}

impl ReduxMap {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.rlew_tag.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.ceiling.to_le_bytes());
        out.extend_from_slice(&self.floor.to_le_bytes());

        for plane in &self.planes {
            out.extend_from_slice(&length_u16(plane.len(), "plane")?.to_le_bytes());
        }

        let offsets_at = out.len();
        out.extend_from_slice(&[0u8; 12]);

        out.extend_from_slice(&length_u16(self.name.len(), "name")?.to_le_bytes());
        out.extend_from_slice(&length_u16(self.music_path.len(), "music path")?.to_le_bytes());
        out.extend_from_slice(&self.par_time.to_le_bytes());

        let mut par_string = [0u8; PAR_STRING_LENGTH];
        for (slot, byte) in par_string.iter_mut().zip(self.par_string.bytes()) {
            *slot = byte;
        }
        out.extend_from_slice(&par_string);

        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(self.music_path.as_bytes());

        let mut offsets = [0u32; 3];
        for (offset, plane) in offsets.iter_mut().zip(&self.planes) {
            *offset = out.len() as u32;
            out.extend_from_slice(plane);
        }
        for (i, offset) in offsets.iter().enumerate() {
            write_u32(&mut out, *offset, offsets_at + i * 4);
        }

        Ok(out)
    }
}

fn length_u16(length: usize, what: &str) -> Result<u16> {
    u16::try_from(length)
        .map_err(|_| WolfError::format(format!("Map {} of {} bytes is too long", what, length)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReduxMap {
        ReduxMap {
            signature: *b"!ID!",
            rlew_tag: 0xABCD,
            width: 64,
            height: 64,
            ceiling: 0x383838,
            floor: 0x707070,
            name: "Wolf1 Map1".to_string(),
            music_path: "music/GETTHEM.ogg".to_string(),
            par_time: 1.5,
            par_string: "01:30".to_string(),
            planes: [vec![1, 2], vec![3], vec![]],
        }
    }

    #[test]
    fn header_fields_are_little_endian() {
        let bytes = sample().encode().unwrap();
        assert_eq!(&bytes[0..4], b"!ID!");
        assert_eq!(&bytes[4..6], &[0xCD, 0xAB]);
        assert_eq!(&bytes[10..14], &0x383838u32.to_le_bytes());
        assert_eq!(&bytes[18..24], &[2, 0, 1, 0, 0, 0]);
        assert_eq!(&bytes[36..38], &10u16.to_le_bytes());
        assert_eq!(&bytes[38..40], &17u16.to_le_bytes());
        assert_eq!(&bytes[40..44], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[44..49], b"01:30");
        assert_eq!(&bytes[49..59], b"Wolf1 Map1");
    }

    #[test]
    fn plane_offsets_are_backfilled() {
        let bytes = sample().encode().unwrap();
        let offset = |i: usize| {
            u32::from_le_bytes([bytes[24 + i * 4], bytes[25 + i * 4], bytes[26 + i * 4], bytes[27 + i * 4]])
                as usize
        };
        let planes_start = 49 + 10 + 17;
        assert_eq!(offset(0), planes_start);
        assert_eq!(offset(1), planes_start + 2);
        assert_eq!(offset(2), planes_start + 3);
        assert_eq!(&bytes[planes_start..], &[1, 2, 3]);
    }
}
