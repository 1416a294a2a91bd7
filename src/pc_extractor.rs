use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    containers::{
        audio::{self, AudioContainer},
        graphics::GraphicsContainer,
        maps::MapContainer,
        page_file::PageFile,
    },
    error::{Result, WolfError},
    formats::{
        redux_map::ReduxMap,
        wav::{self, PAGE_SOUND_RATE},
    },
    graphics::{
        font::{FONT_SHEET_HEIGHT, FONT_SHEET_WIDTH},
        Palette, PixelFormat,
    },
    output::{per_asset, AssetKind, OutputSink},
    profile::{GameProfile, Stage},
    version::{self, GameVersion},
};

const DIR_PICS: &str = "pics";
const DIR_WALLS: &str = "walls";
const DIR_SCRIPTS: &str = "gscripts";
const DIR_MUSIC: &str = "music";
const DIR_MAPS: &str = "maps";

/// Palette index of the floor colour in every converted map.
const FLOOR_COLOUR: u8 = 0x19;

/// Extracts one DOS title: graphics, page file, maps and audio, as far as its profile has them.
pub struct PcExtractor<'a> {
    dir: PathBuf,
    profile: &'a GameProfile,
    version: GameVersion,
    palette: Option<&'a Palette>,
}

impl<'a> PcExtractor<'a> {
    pub fn new(
        dir: &Path,
        profile: &'a GameProfile,
        version: GameVersion,
        palette: Option<&'a Palette>,
    ) -> Self {
        PcExtractor {
            dir: dir.to_path_buf(),
            profile,
            version,
            palette,
        }
    }

    fn extension(&self) -> &str {
        &self.profile.extension
    }

    /// Run every stage the profile lists. A stage whose container is unreadable is logged and
    /// counted, and the remaining stages still run.
    pub fn extract_all(&self, sink: &mut OutputSink) {
        info!(
            "Extracting {} data ({:?})",
            self.extension(),
            self.version
        );

        let stages: [(Stage, &str, fn(&Self, &mut OutputSink) -> Result<()>); 4] = [
            (Stage::Graphics, "VGAGRAPH", Self::extract_graphics),
            (Stage::PageData, self.profile.page_file.as_str(), Self::extract_page_data),
            (Stage::Maps, self.profile.map_file.as_str(), Self::extract_maps),
            (Stage::Audio, "AUDIOT", Self::extract_audio),
        ];
        for (kind, container, stage) in stages {
            if !self.profile.runs(kind) {
                continue;
            }
            if let Err(e) = stage(self, sink) {
                let name = format!("{}.{}", container, self.extension());
                sink.container_failed(&name, &e);
            }
        }
    }

    /// Fonts, scripts and pictures from the VGA graphics files.
    pub fn extract_graphics(&self, sink: &mut OutputSink) -> Result<()> {
        let graphics = GraphicsContainer::open(&self.dir, self.extension(), self.profile.start_pics)?;
        let source = format!("VGAGRAPH.{}", self.extension());
        info!("Decoding graphics: {} chunks", graphics.chunk_count());

        sink.begin_phase("fonts", self.profile.fonts().len());
        for id in self.profile.fonts() {
            let result = graphics
                .decode_font(id, FONT_SHEET_WIDTH, FONT_SHEET_HEIGHT)
                .and_then(|font| {
                    sink.write_image(
                        DIR_PICS,
                        &format!("font{}", id),
                        &font,
                        AssetKind::Font,
                        &format!("{} chunk {}", source, id),
                    )
                });
            per_asset(sink, &format!("font {}", id), result)?;
            sink.step();
        }

        let scripts = self.profile.scripts();
        sink.begin_phase("scripts", scripts.len());
        for id in scripts {
            let result = graphics.script(id).and_then(|text| {
                sink.write_bytes(
                    DIR_SCRIPTS,
                    &format!("{:03}.txt", id),
                    &text,
                    AssetKind::Script,
                    &format!("{} chunk {}", source, id),
                )
            });
            per_asset(sink, &format!("script {}", id), result)?;
            sink.step();
        }

        let Some(palette) = self.palette else {
            warn!("No palette given; skipping {} pictures", self.extension());
            return Ok(());
        };

        let raw_names = sink.options().raw_names;
        sink.begin_phase("pictures", self.profile.pictures().len());
        for id in self.profile.pictures() {
            let own = self.picture_palette(&graphics, id);
            let result = graphics
                .decode_picture(id, own.as_ref().unwrap_or(palette), PixelFormat::Rgb24)
                .and_then(|picture| match picture {
                    Some(picture) => sink.write_image(
                        DIR_PICS,
                        &self.profile.pic_name(id, raw_names),
                        &picture,
                        AssetKind::Picture,
                        &format!("{} chunk {}", source, id),
                    ),
                    None => Ok(()),
                });
            per_asset(sink, &format!("picture {}", id), result)?;
            sink.step();
        }

        Ok(())
    }

    /// Palette stored in the graphics file for picture `id`, scaled up from 6-bit values. An
    /// unreadable palette chunk falls back to the game palette.
    fn picture_palette(&self, graphics: &GraphicsContainer, id: u32) -> Option<Palette> {
        let chunk = self.profile.palette_chunk(id)?;
        let palette = graphics.chunk(chunk).and_then(|data| {
            let data = data.ok_or_else(|| WolfError::format(format!("chunk {} is sparse", chunk)))?;
            Palette::from_vga(&data)
        });
        match palette {
            Ok(palette) => {
                debug!("Picture {} uses the palette in chunk {}", id, chunk);
                Some(palette)
            }
            Err(e) => {
                warn!("Palette for picture {}: {}. Using the game palette.", id, e);
                None
            }
        }
    }

    /// Walls, sprites and digitised sounds from the page file.
    pub fn extract_page_data(&self, sink: &mut OutputSink) -> Result<()> {
        let source = self.profile.page_file_name(self.extension());
        let pages = PageFile::open(&self.dir, &source)?;
        info!(
            "Decoding page file: {} walls, {} sprites, {} sound pages",
            pages.sprite_start(),
            pages.sound_start() - pages.sprite_start(),
            pages.page_count() - pages.sound_start()
        );

        let options = sink.options().clone();
        match self.palette {
            Some(palette) => {
                sink.begin_phase("walls", pages.sprite_start() as usize);
                for page in 0..pages.sprite_start() {
                    let index = if options.raw_names {
                        page
                    } else {
                        version::wall_index(self.version, page)
                    };
                    let result = pages
                        .wall(page, palette, PixelFormat::Rgb24)
                        .and_then(|wall| match wall {
                            Some(wall) => sink.write_image(
                                DIR_WALLS,
                                &format!("{:03}", index),
                                &options.scale.apply_wall(wall)?,
                                AssetKind::Wall,
                                &format!("{} page {}", source, page),
                            ),
                            None => Ok(()),
                        });
                    per_asset(sink, &format!("wall {}", page), result)?;
                    sink.step();
                }

                let sprites = pages.sprite_start()..pages.sound_start();
                sink.begin_phase("sprites", sprites.len());
                for page in sprites {
                    let relative = page - pages.sprite_start();
                    let index = if options.raw_names {
                        relative
                    } else {
                        version::sprite_index(self.version, relative)
                    };
                    let result = pages
                        .sprite(page, palette, PixelFormat::Rgba32)
                        .and_then(|sprite| match sprite {
                            Some(sprite) => sink.write_image(
                                &self.profile.sprite_dir,
                                &format!("{:03}", index),
                                &options.scale.apply_sprite(sprite)?,
                                AssetKind::Sprite,
                                &format!("{} page {}", source, page),
                            ),
                            None => Ok(()),
                        });
                    per_asset(sink, &format!("sprite {}", page), result)?;
                    sink.step();
                }
            }
            None => warn!("No palette given; skipping {} walls and sprites", self.extension()),
        }

        let sounds = pages.sounds()?;
        sink.begin_phase("digitised sounds", sounds.len());
        for sound in sounds {
            // An over-long sound is counted as failed without giving up on the page file
            let sound = match sound {
                Ok(sound) => sound,
                Err(e) => {
                    sink.asset_failed("digitised sound", &e);
                    sink.step();
                    continue;
                }
            };
            let result = wav::encode(&sound.samples, 1, PAGE_SOUND_RATE, 1).and_then(|wav| {
                sink.write_bytes(
                    &self.profile.sound_dir,
                    &format!("{:03}.wav", sound.index),
                    &wav,
                    AssetKind::DigitisedSound,
                    &format!("{} sound {}", source, sound.index),
                )
            });
            per_asset(sink, &format!("sound {}", sound.index), result)?;
            sink.step();
        }

        Ok(())
    }

    /// Convert every map to the redux layout. Raw-name runs keep the maps untouched and skip
    /// this stage.
    pub fn extract_maps(&self, sink: &mut OutputSink) -> Result<()> {
        if sink.options().raw_names {
            return Ok(());
        }

        let maps = MapContainer::open(&self.dir, &self.profile.map_file, self.extension())?;
        let source = format!("{}.{}", self.profile.map_file, self.extension());
        if self.palette.is_none() {
            warn!("No palette given; map ceiling and floor colours are written as 0");
        }
        let colour = |index: u8| self.palette.map(|p| p.packed_rgb(index)).unwrap_or(0);

        sink.begin_phase("maps", maps.map_count());
        for index in 0..maps.map_count() {
            let result = maps.map(index).and_then(|map| {
                let par = self.profile.par_time(index);
                let redux = ReduxMap {
                    signature: map.header.signature,
                    rlew_tag: maps.rlew_tag(),
                    width: map.header.width,
                    height: map.header.height,
                    ceiling: colour(self.profile.ceiling_index(index)),
                    floor: colour(FLOOR_COLOUR),
                    name: map.header.name,
                    music_path: format!("{}/{}.ogg", DIR_MUSIC, self.profile.song(index)),
                    par_time: par.minutes,
                    par_string: par.display,
                    planes: map.planes,
                };
                sink.write_bytes(
                    DIR_MAPS,
                    &self.profile.map_file_name(index),
                    &redux.encode()?,
                    AssetKind::Map,
                    &format!("{} map {}", source, index),
                )
            });
            per_asset(sink, &format!("map {}", index), result)?;
            sink.step();
        }

        Ok(())
    }

    /// AdLib sound effects and IMF music, dumped as stored.
    pub fn extract_audio(&self, sink: &mut OutputSink) -> Result<()> {
        let audio = AudioContainer::open(&self.dir, self.extension())?;
        let source = format!("AUDIOT.{}", self.extension());
        let sounds = self.profile.sound_range;
        let music = self.profile.music_range;

        sink.begin_phase("adlib sounds", sounds.range().len());
        for id in sounds.range() {
            let result = audio.chunk(id).and_then(|chunk| match chunk {
                Some(chunk) => {
                    audio::AdLibSoundHeader::parse(chunk)?;
                    sink.write_bytes(
                        &self.profile.adlib_dir,
                        &format!("{:03}.adl", id - sounds.start),
                        chunk,
                        AssetKind::AdLibSound,
                        &format!("{} chunk {}", source, id),
                    )
                }
                None => Ok(()),
            });
            per_asset(sink, &format!("AdLib sound {}", id), result)?;
            sink.step();
        }

        sink.begin_phase("music", music.range().len());
        for id in music.range() {
            let result = audio.chunk(id).and_then(|chunk| {
                let Some(chunk) = chunk else {
                    return Ok(());
                };
                match audio::imf_duration_ms(chunk)? {
                    Some(duration) => {
                        info!("Music {} plays for {} ms", self.profile.music_name(id), duration);
                        sink.write_bytes(
                            DIR_MUSIC,
                            &format!("{}.imf", self.profile.music_name(id)),
                            chunk,
                            AssetKind::Music,
                            &format!("{} chunk {}", source, id),
                        )
                    }
                    None => Ok(()),
                }
            });
            per_asset(sink, &format!("music {}", id), result)?;
            sink.step();
        }

        Ok(())
    }
}
