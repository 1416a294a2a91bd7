//! Macintosh release extractor
//!
//! Every resource sits at a fixed offset in the MacBinary file. Screens and the item bundle are
//! single LZSS blocks with a big-endian expanded length in front; walls, sprites and MIDI songs
//! are chains where each block is followed by the length of the next.

use tracing::info;

use crate::binary_utils::{slice_at, u32_be_at};
use crate::containers::{compression::LzssChunk, CompressionContainer};
use crate::containers::mac::MacResourceFile;
use crate::error::{Result, WolfError};
use crate::graphics::{
    convert::{indexed_to_rgb, sized_indexed_to_rgb},
    sprite,
    wall::{self, CONSOLE_WALL_SIZE},
};
use crate::output::{per_asset, AssetKind, OutputSink};

const DIR_PICS: &str = "pics";
const DIR_SPRITES: &str = "sprites";
const DIR_WALLS: &str = "walls";
const DIR_MIDI: &str = "midi";

const BJ_MARKER_SIZE: usize = 16;
const BJ_IMAGE_COUNT: usize = 3;
const ITEM_COUNT: usize = 47;
const WEAPON_ITEMS: std::ops::Range<usize> = 12..36;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub offset: u32,
    pub length: u32,
}

/// `count` chained blocks, numbered from `first` in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    pub offset: u32,
    pub length: u32,
    pub count: usize,
    pub first: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub name: &'static str,
    pub palette: u32,
    pub block: Block,
}

/// Where each resource lives in the file.
#[derive(Debug, Clone, Copy)]
pub struct MacLayout {
    pub game_palette: u32,
    pub intermission_palette: u32,
    pub screens: &'static [Screen],
    pub bj_intermission: Block,
    pub bj_automap: Block,
    pub walls: Chain,
    pub sprites: &'static [Chain],
    pub items: Block,
    pub midi: Chain,
}

const MAC_PALETTE: u32 = 898_370;
const ID_PALETTE: u32 = 899_142;
const GAME_PALETTE: u32 = 946_811;
const INTERMISSION_PALETTE: u32 = 997_211;
const YUMMY_PALETTE: u32 = 1_011_345;
const TITLE_PALETTE: u32 = 2_235_007;

/// The one known Macintosh release.
pub const WOLF3D_MAC: MacLayout = MacLayout {
    game_palette: GAME_PALETTE,
    intermission_palette: INTERMISSION_PALETTE,
    screens: &[
        Screen {
            name: "macplaypic",
            palette: MAC_PALETTE,
            block: Block { offset: 899_914, length: 46_893 },
        },
        // Same image as above under the id palette
        Screen {
            name: "idpic",
            palette: ID_PALETTE,
            block: Block { offset: 899_914, length: 46_893 },
        },
        Screen {
            name: "intermissionpic",
            palette: INTERMISSION_PALETTE,
            block: Block { offset: 947_583, length: 49_624 },
        },
        Screen {
            name: "getpsychedpic",
            palette: GAME_PALETTE,
            block: Block { offset: 997_983, length: 3_256 },
        },
        Screen {
            name: "yummypic",
            palette: YUMMY_PALETTE,
            block: Block { offset: 1_002_299, length: 9_042 },
        },
        Screen {
            name: "titlepic",
            palette: TITLE_PALETTE,
            block: Block { offset: 2_067_971, length: 167_032 },
        },
    ],
    bj_intermission: Block { offset: 1_018_931, length: 20_766 },
    bj_automap: Block { offset: 2_391_746, length: 1_281 },
    walls: Chain { offset: 702_256, length: 6_277, count: 35, first: 0 },
    sprites: &[
        Chain { offset: 106_345, length: 524, count: 163, first: 0 },
        Chain { offset: 579_104, length: 868, count: 8, first: 163 },
        Chain { offset: 2_356_530, length: 7_153, count: 4, first: 171 },
    ],
    items: Block { offset: 634_799, length: 67_453 },
    midi: Chain { offset: 1_899_536, length: 8_215, count: 8, first: 0 },
};

/// Expand a block that starts with its big-endian expanded length.
fn expand_sized(block: &[u8]) -> Result<Vec<u8>> {
    let expanded_length = u32_be_at(block, 0)? as usize;
    LzssChunk::new(&block[4..], expanded_length).decompress()
}

pub struct MacExtractor<'a> {
    file: &'a MacResourceFile,
    layout: MacLayout,
}

impl<'a> MacExtractor<'a> {
    pub fn new(file: &'a MacResourceFile) -> Self {
        Self::with_layout(file, WOLF3D_MAC)
    }

    pub fn with_layout(file: &'a MacResourceFile, layout: MacLayout) -> Self {
        MacExtractor { file, layout }
    }

    /// Run every stage in release order. A failing stage is counted and the rest still run.
    pub fn extract_all(&self, sink: &mut OutputSink) {
        info!("Extracting Macintosh data");
        let stages: [(&str, fn(&Self, &mut OutputSink) -> Result<()>); 5] = [
            ("MIDI", Self::extract_midi),
            ("screens", Self::extract_screens),
            ("walls", Self::extract_walls),
            ("sprites", Self::extract_sprites),
            ("items", Self::extract_items),
        ];
        for (name, stage) in stages {
            if let Err(e) = stage(self, sink) {
                sink.container_failed(&format!("Macintosh {}", name), &e);
            }
        }
    }

    pub fn extract_midi(&self, sink: &mut OutputSink) -> Result<()> {
        let midi = self.layout.midi;
        sink.begin_phase("midi", midi.count);
        for (i, block) in self.file.chain(midi.offset, midi.length, midi.count).enumerate() {
            let block = block?;
            let index = midi.first + i;
            let result = sink.write_bytes(
                DIR_MIDI,
                &format!("{}.mid", index),
                block,
                AssetKind::Midi,
                &format!("MIDI block {}", index),
            );
            per_asset(sink, &format!("MIDI {}", index), result)?;
            sink.step();
        }
        Ok(())
    }

    /// Full-screen pictures, the BJ intermission images and the automap marker.
    pub fn extract_screens(&self, sink: &mut OutputSink) -> Result<()> {
        sink.begin_phase("screens", self.layout.screens.len() + BJ_IMAGE_COUNT + 1);

        for screen in self.layout.screens {
            let palette = self.file.palette(screen.palette)?;
            let block = self.file.block(screen.block.offset, screen.block.length)?;
            let result = expand_sized(block.data)
                .and_then(|pixels| sized_indexed_to_rgb(&pixels, &palette))
                .and_then(|image| {
                    sink.write_image(
                        DIR_PICS,
                        screen.name,
                        &image,
                        AssetKind::Screen,
                        &format!("resource {}", screen.block.offset),
                    )
                });
            per_asset(sink, screen.name, result)?;
            sink.step();
        }

        let palette = self.file.palette(self.layout.intermission_palette)?;
        let bj = self.layout.bj_intermission;
        let expanded = expand_sized(self.file.block(bj.offset, bj.length)?.data)?;
        for i in 0..BJ_IMAGE_COUNT {
            let result = u32_be_at(&expanded, i * 4)
                .map_err(WolfError::from)
                .and_then(|start| {
                    let image = expanded.get(start as usize..).ok_or_else(|| {
                        WolfError::format(format!(
                            "BJ image {} at {} outside the {} byte block",
                            i,
                            start,
                            expanded.len()
                        ))
                    })?;
                    sized_indexed_to_rgb(image, &palette)
                })
                .and_then(|image| {
                    sink.write_image(
                        DIR_PICS,
                        &format!("bj{}", i),
                        &image,
                        AssetKind::Screen,
                        &format!("resource {} image {}", bj.offset, i),
                    )
                });
            per_asset(sink, &format!("BJ image {}", i), result)?;
            sink.step();
        }

        let palette = self.file.palette(self.layout.game_palette)?;
        let marker = self.layout.bj_automap;
        let block = self.file.block(marker.offset, marker.length)?;
        let result = indexed_to_rgb(block.data, BJ_MARKER_SIZE, BJ_MARKER_SIZE, &palette).and_then(
            |image| {
                sink.write_image(
                    DIR_PICS,
                    "bjautomap",
                    &image,
                    AssetKind::Screen,
                    &format!("resource {}", marker.offset),
                )
            },
        );
        per_asset(sink, "BJ automap marker", result)?;
        sink.step();

        Ok(())
    }

    pub fn extract_walls(&self, sink: &mut OutputSink) -> Result<()> {
        let palette = self.file.palette(self.layout.game_palette)?;
        let walls = self.layout.walls;
        sink.begin_phase("walls", walls.count);

        for (i, block) in self.file.chain(walls.offset, walls.length, walls.count).enumerate() {
            let block = block?;
            let index = walls.first + i;
            let result = LzssChunk::new(block, CONSOLE_WALL_SIZE * CONSOLE_WALL_SIZE)
                .decompress()
                .and_then(|pixels| wall::decode_square(&pixels, CONSOLE_WALL_SIZE, &palette))
                .and_then(|image| {
                    sink.write_image(
                        DIR_WALLS,
                        &format!("{:03}", index),
                        &image,
                        AssetKind::Wall,
                        &format!("wall block {}", index),
                    )
                });
            per_asset(sink, &format!("wall {}", index), result)?;
            sink.step();
        }
        Ok(())
    }

    pub fn extract_sprites(&self, sink: &mut OutputSink) -> Result<()> {
        let palette = self.file.palette(self.layout.game_palette)?;
        let total = self.layout.sprites.iter().map(|chain| chain.count).sum();
        sink.begin_phase("sprites", total);

        for chain in self.layout.sprites {
            for (i, block) in self.file.chain(chain.offset, chain.length, chain.count).enumerate() {
                let block = block?;
                let index = chain.first + i;
                let result = sprite::decode_mac(block, &palette).and_then(|image| {
                    sink.write_image(
                        DIR_SPRITES,
                        &format!("{:03}", index),
                        &image,
                        AssetKind::Sprite,
                        &format!("sprite block {}", index),
                    )
                });
                per_asset(sink, &format!("sprite {}", index), result)?;
                sink.step();
            }
        }
        Ok(())
    }

    /// Status bar items and weapon frames, all packed in one block behind an offset table.
    pub fn extract_items(&self, sink: &mut OutputSink) -> Result<()> {
        let palette = self.file.palette(self.layout.game_palette)?;
        let items = self.layout.items;
        let expanded = expand_sized(self.file.block(items.offset, items.length)?.data)?;

        let shapes = (0..ITEM_COUNT)
            .map(|i| -> Result<&[u8]> {
                let start = u32_be_at(&expanded, i * 4)? as usize;
                // Checked for at least a size header here; decoders check the rest
                slice_at(&expanded, start, 4)?;
                Ok(&expanded[start..])
            })
            .collect::<Result<Vec<&[u8]>>>()?;

        sink.begin_phase("items", ITEM_COUNT);
        for (i, shape) in shapes.iter().enumerate() {
            let source = format!("item block {}", i);
            let result = if WEAPON_ITEMS.contains(&i) {
                sprite::decode_mac_item(shape, &palette).and_then(|image| {
                    sink.write_image(
                        DIR_PICS,
                        &format!("weapon{:02}", i - WEAPON_ITEMS.start),
                        &image,
                        AssetKind::Item,
                        &source,
                    )
                })
            } else {
                sized_indexed_to_rgb(shape, &palette).and_then(|image| {
                    sink.write_image(DIR_PICS, &format!("{:02}", i), &image, AssetKind::Item, &source)
                })
            };
            per_asset(sink, &format!("item {}", i), result)?;
            sink.step();
        }
        Ok(())
    }
}
