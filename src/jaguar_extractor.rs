//! Atari Jaguar ROM extractor
//!
//! Assets are addressed by lump number in the ROM's WAD and written under the lump's own name.

use std::ops::RangeInclusive;

use tracing::info;

use crate::binary_utils::{slice_at, u16_be_at};
use crate::containers::wad::WadFile;
use crate::error::Result;
use crate::formats::wav::{self, JAGUAR_SOUND_RATE};
use crate::graphics::{
    convert::indexed_to_rgba_keyed,
    cry, sprite,
    wall::{self, CONSOLE_WALL_SIZE},
    Palette, PixelBuffer,
};
use crate::output::{per_asset, AssetKind, OutputSink};

const DIR_MAPS: &str = "jag_maps";
const DIR_SPRITES: &str = "jag_sprites";
const DIR_WALLS: &str = "jag_walls";
const DIR_HUD: &str = "jag_hud";
const DIR_LABELS: &str = "jag_labels";
const DIR_SCREENS: &str = "jag_screens";
const DIR_SOUNDS: &str = "jag_sounds";
const DIR_MUSIC: &str = "jag_music";

const GAME_PALETTE: &str = "RGBPALS";
const BRIEF_PALETTE: &str = "BRIEFPAL";

const MAPS: RangeInclusive<usize> = 0..=29;
const SPRITES: RangeInclusive<usize> = 31..=184;
const WALLS: RangeInclusive<usize> = 186..=221;
const LABELS: RangeInclusive<usize> = 224..=272;
const HUD_WEAPONS: RangeInclusive<usize> = 274..=297;
const HUD_STATUS: RangeInclusive<usize> = 299..=353;
const SCREENS: RangeInclusive<usize> = 356..=358;
const BRIEF_SCREEN: usize = 359;
const TITLE_SCREEN: usize = 362;
const SOUNDS: RangeInclusive<usize> = 367..=390;
const MUSIC: RangeInclusive<usize> = 392..=407;
/// Sits inside the music range but holds the music label, not a song.
const MUSIC_LABEL: usize = 394;

/// Labels and screens carry `w, h` up front and their pixels from here.
const LABEL_PIXELS: usize = 16;
const TITLE_PIXELS: usize = 24;

/// Lump name made safe for use as a file stem.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

fn dimensions(lump: &[u8]) -> Result<(usize, usize)> {
    Ok((usize::from(u16_be_at(lump, 0)?), usize::from(u16_be_at(lump, 2)?)))
}

fn decode_label(lump: &[u8], palette: &Palette) -> Result<PixelBuffer> {
    let (width, height) = dimensions(lump)?;
    indexed_to_rgba_keyed(slice_at(lump, LABEL_PIXELS, width * height)?, width, height, palette)
}

pub struct JaguarExtractor<'a> {
    wad: &'a WadFile,
}

impl<'a> JaguarExtractor<'a> {
    pub fn new(wad: &'a WadFile) -> Self {
        JaguarExtractor { wad }
    }

    fn palette(&self) -> Result<Palette> {
        Palette::from_bytes(&self.wad.read_named(GAME_PALETTE)?)
    }

    fn stem(&self, id: usize) -> Result<String> {
        Ok(file_stem(&self.wad.lump(id)?.name))
    }

    pub fn extract_all(&self, sink: &mut OutputSink) {
        info!("Extracting Jaguar data from {} lumps", self.wad.lump_count());
        let stages: [(&str, fn(&Self, &mut OutputSink) -> Result<()>); 8] = [
            ("maps", Self::extract_maps),
            ("sprites", Self::extract_sprites),
            ("walls", Self::extract_walls),
            ("HUD", Self::extract_hud),
            ("labels", Self::extract_labels),
            ("screens", Self::extract_screens),
            ("sounds", Self::extract_sounds),
            ("music", Self::extract_music),
        ];
        for (name, stage) in stages {
            if let Err(e) = stage(self, sink) {
                sink.container_failed(&format!("Jaguar {}", name), &e);
            }
        }
    }

    /// Copy lumps out unchanged as `dir/<name>.<extension>`.
    fn dump(
        &self,
        sink: &mut OutputSink,
        phase: &str,
        ids: impl Iterator<Item = usize> + Clone,
        dir: &str,
        extension: &str,
        kind: AssetKind,
    ) -> Result<()> {
        sink.begin_phase(phase, ids.clone().count());
        for id in ids {
            let result = self.wad.read(id).and_then(|bytes| {
                sink.write_bytes(
                    dir,
                    &format!("{}.{}", self.stem(id)?, extension),
                    &bytes,
                    kind,
                    &format!("lump {}", id),
                )
            });
            per_asset(sink, &format!("lump {}", id), result)?;
            sink.step();
        }
        Ok(())
    }

    /// Decode each lump with `decode` and write it as `dir/<name>`.
    fn images(
        &self,
        sink: &mut OutputSink,
        phase: &str,
        ids: impl Iterator<Item = usize> + Clone,
        dir: &str,
        kind: AssetKind,
        decode: impl Fn(&[u8]) -> Result<PixelBuffer>,
    ) -> Result<()> {
        sink.begin_phase(phase, ids.clone().count());
        for id in ids {
            let result = self
                .wad
                .read(id)
                .and_then(|lump| decode(&lump))
                .and_then(|image| {
                    sink.write_image(dir, &self.stem(id)?, &image, kind, &format!("lump {}", id))
                });
            per_asset(sink, &format!("lump {}", id), result)?;
            sink.step();
        }
        Ok(())
    }

    pub fn extract_maps(&self, sink: &mut OutputSink) -> Result<()> {
        self.dump(sink, "maps", MAPS, DIR_MAPS, "map", AssetKind::Map)
    }

    pub fn extract_sprites(&self, sink: &mut OutputSink) -> Result<()> {
        let palette = self.palette()?;
        self.images(sink, "sprites", SPRITES, DIR_SPRITES, AssetKind::Sprite, |lump| {
            sprite::decode_jaguar(lump, &palette)
        })
    }

    pub fn extract_walls(&self, sink: &mut OutputSink) -> Result<()> {
        let palette = self.palette()?;
        self.images(sink, "walls", WALLS, DIR_WALLS, AssetKind::Wall, |lump| {
            wall::decode_square(lump, CONSOLE_WALL_SIZE, &palette)
        })
    }

    /// Weapon frames, then numbers, ammo and faces. The map icon lump between them is skipped.
    pub fn extract_hud(&self, sink: &mut OutputSink) -> Result<()> {
        let palette = self.palette()?;
        self.images(
            sink,
            "hud",
            HUD_WEAPONS.chain(HUD_STATUS),
            DIR_HUD,
            AssetKind::Hud,
            |lump| sprite::decode_jaguar(lump, &palette),
        )
    }

    pub fn extract_labels(&self, sink: &mut OutputSink) -> Result<()> {
        let palette = self.palette()?;
        self.images(sink, "labels", LABELS, DIR_LABELS, AssetKind::Label, |lump| {
            decode_label(lump, &palette)
        })
    }

    /// The briefing and title screens are stored as CRY colour; the rest use the label layout.
    pub fn extract_screens(&self, sink: &mut OutputSink) -> Result<()> {
        let brief_palette = self.wad.read_named(BRIEF_PALETTE)?;
        self.images(
            sink,
            "brief screen",
            std::iter::once(BRIEF_SCREEN),
            DIR_SCREENS,
            AssetKind::Screen,
            |lump| {
                let (width, height) = dimensions(lump)?;
                let pixels = slice_at(lump, LABEL_PIXELS, width * height)?;
                cry::decode_indexed(pixels, width, height, &brief_palette)
            },
        )?;

        let palette = self.palette()?;
        self.images(sink, "screens", SCREENS, DIR_SCREENS, AssetKind::Screen, |lump| {
            decode_label(lump, &palette)
        })?;

        self.images(
            sink,
            "title screen",
            std::iter::once(TITLE_SCREEN),
            DIR_SCREENS,
            AssetKind::Screen,
            |lump| {
                let (width, height) = dimensions(lump)?;
                let words = lump.get(TITLE_PIXELS..).unwrap_or_default();
                cry::decode_cry16(words, width, height)
            },
        )
    }

    pub fn extract_sounds(&self, sink: &mut OutputSink) -> Result<()> {
        sink.begin_phase("sounds", SOUNDS.count());
        for id in SOUNDS {
            let result = self
                .wad
                .read(id)
                .and_then(|samples| wav::encode(&samples, 1, JAGUAR_SOUND_RATE, 1))
                .and_then(|wav| {
                    sink.write_bytes(
                        DIR_SOUNDS,
                        &format!("{}.wav", self.stem(id)?),
                        &wav,
                        AssetKind::DigitisedSound,
                        &format!("lump {}", id),
                    )
                });
            per_asset(sink, &format!("lump {}", id), result)?;
            sink.step();
        }
        Ok(())
    }

    pub fn extract_music(&self, sink: &mut OutputSink) -> Result<()> {
        self.dump(
            sink,
            "music",
            MUSIC.filter(|&id| id != MUSIC_LABEL),
            DIR_MUSIC,
            "mid",
            AssetKind::Midi,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::wad::tests::{plain, rom, TestLump};
    use crate::containers::ContainerHandler;
    use crate::graphics::PALETTE_SIZE;
    use crate::output::OutputOptions;

    fn label(width: u16, height: u16, colour: u8) -> Vec<u8> {
        let mut lump = width.to_be_bytes().to_vec();
        lump.extend_from_slice(&height.to_be_bytes());
        lump.resize(LABEL_PIXELS, 0);
        lump.extend(std::iter::repeat(colour).take(usize::from(width) * usize::from(height)));
        lump
    }

    fn lump_bytes(id: usize) -> Vec<u8> {
        match id {
            id if SPRITES.contains(&id) || HUD_WEAPONS.contains(&id) || HUD_STATUS.contains(&id) => {
                vec![1, 2, 1, 1, 0, 0, 0, 0, 9]
            }
            id if WALLS.contains(&id) => vec![4; CONSOLE_WALL_SIZE * CONSOLE_WALL_SIZE],
            id if LABELS.contains(&id) || SCREENS.contains(&id) || id == BRIEF_SCREEN => {
                label(2, 1, 3)
            }
            TITLE_SCREEN => {
                let mut lump = label(1, 1, 0);
                lump.resize(TITLE_PIXELS, 0);
                lump.extend_from_slice(&[0x00, 0xFF]);
                lump
            }
            id => vec![id as u8; 3],
        }
    }

    fn sample_rom() -> Vec<u8> {
        let mut lumps: Vec<TestLump> =
            (0..=*MUSIC.end()).map(|id| plain(&format!("L{}", id), lump_bytes(id))).collect();
        let palette: Vec<u8> = (0..PALETTE_SIZE).map(|i| (i / 3) as u8).collect();
        lumps.push(plain(GAME_PALETTE, palette));
        lumps.push(plain(BRIEF_PALETTE, vec![0; 512]));
        rom(&lumps)
    }

    fn find<'s>(sink: &'s OutputSink, path: &str) -> Option<&'s crate::output::ManifestEntry> {
        sink.entries().iter().find(|e| e.path == path)
    }

    #[test]
    fn every_range_lands_in_its_directory() {
        let wad = WadFile::deserialise(sample_rom()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OutputSink::new(dir.path(), "jaguar", OutputOptions::default()).unwrap();

        JaguarExtractor::new(&wad).extract_all(&mut sink);
        let summary = sink.summary();
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.aborted_containers, 0);

        for path in [
            "jag_maps/L0.map",
            "jag_maps/L29.map",
            "jag_sprites/L31.tga",
            "jag_sprites/L184.tga",
            "jag_walls/L186.tga",
            "jag_hud/L274.tga",
            "jag_hud/L353.tga",
            "jag_labels/L224.tga",
            "jag_screens/L356.tga",
            "jag_screens/L359.tga",
            "jag_screens/L362.tga",
            "jag_sounds/L367.wav",
            "jag_music/L392.mid",
            "jag_music/L407.mid",
        ] {
            assert!(find(&sink, path).is_some(), "missing {}", path);
        }
        assert!(find(&sink, "jag_hud/L298.tga").is_none());
        assert!(find(&sink, "jag_music/L394.mid").is_none());
        assert!(find(&sink, "jag_maps/L30.map").is_none());

        let counted = |dir: &str| {
            sink.entries()
                .iter()
                .filter(|e| e.path.starts_with(dir))
                .count()
        };
        assert_eq!(counted("jag_maps/"), 30);
        assert_eq!(counted("jag_hud/"), 24 + 55);
        assert_eq!(counted("jag_music/"), 15);
    }

    #[test]
    fn images_keep_their_stored_sizes() {
        let wad = WadFile::deserialise(sample_rom()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OutputSink::new(dir.path(), "jaguar", OutputOptions::default()).unwrap();
        let extractor = JaguarExtractor::new(&wad);
        extractor.extract_walls(&mut sink).unwrap();
        extractor.extract_labels(&mut sink).unwrap();
        extractor.extract_sounds(&mut sink).unwrap();

        let wall = find(&sink, "jag_walls/L200.tga").unwrap();
        assert_eq!(wall.width, Some(CONSOLE_WALL_SIZE));
        let label = find(&sink, "jag_labels/L230.tga").unwrap();
        assert_eq!((label.width, label.height), (Some(2), Some(1)));

        let sound = find(&sink, "jag_sounds/L370.wav").unwrap();
        assert_eq!(sound.size, 44 + 3);
        let wav = std::fs::read(dir.path().join("jag_sounds/L370.wav")).unwrap();
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 22050);
    }

    #[test]
    fn a_missing_palette_aborts_only_the_image_stages() {
        let mut lumps: Vec<TestLump> =
            (0..=*MUSIC.end()).map(|id| plain(&format!("L{}", id), lump_bytes(id))).collect();
        lumps.push(plain(BRIEF_PALETTE, vec![0; 512]));
        let wad = WadFile::deserialise(rom(&lumps)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OutputSink::new(dir.path(), "jaguar", OutputOptions::default()).unwrap();

        JaguarExtractor::new(&wad).extract_all(&mut sink);
        // sprites, walls, HUD, labels and the palette screens
        assert_eq!(sink.summary().aborted_containers, 5);
        assert!(find(&sink, "jag_maps/L3.map").is_some());
        assert!(find(&sink, "jag_screens/L359.tga").is_some());
        assert!(find(&sink, "jag_music/L400.mid").is_some());
    }

    #[test]
    fn lump_names_cannot_escape_the_directory() {
        assert_eq!(file_stem("A/B\\C"), "A_B_C");
        assert_eq!(file_stem("WALL01"), "WALL01");
    }
}
