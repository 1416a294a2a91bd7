//! Per-title chunk layout and naming tables
//!
//! Each PC title places its pictures, scripts, sounds and music at different chunk numbers and
//! names its maps and music differently. The built-in tables ship as JSON next to this module and
//! a user-supplied JSON file with the same shape replaces them.
//!
//! Other games on the engine reuse the same containers but not every one of them: a profile lists
//! the stages that apply, the page file's base name and any pictures drawn with a palette that
//! is stored in a graphics chunk.

use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WolfError};
use crate::title::Title;
use crate::version::GameVersion;

const WL6: &str = include_str!("profiles/wl6.json");
const WL1_V10: &str = include_str!("profiles/wl1_v10.json");
const WL1_V11: &str = include_str!("profiles/wl1_v11.json");
const WL1_V14: &str = include_str!("profiles/wl1_v14.json");
const SOD: &str = include_str!("profiles/sod.json");
const SDM: &str = include_str!("profiles/sdm.json");
const BS6: &str = include_str!("profiles/bs6.json");
const BS1: &str = include_str!("profiles/bs1.json");
const VSI: &str = include_str!("profiles/vsi.json");
const CO7: &str = include_str!("profiles/co7.json");
const DMO: &str = include_str!("profiles/dmo.json");
const N3D: &str = include_str!("profiles/n3d.json");
const BC: &str = include_str!("profiles/bc.json");

const UNKNOWN_PAR: &str = "??:??";

/// Half-open chunk range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpan {
    pub start: u32,
    pub end: u32,
}

impl ChunkSpan {
    pub fn range(&self) -> Range<u32> {
        self.start..self.end
    }
}

/// One pass over one set of data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Graphics,
    PageData,
    Maps,
    Audio,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Graphics, Stage::PageData, Stage::Maps, Stage::Audio];
}

/// Pictures drawn with the 6-bit palette held in graphics chunk `palette_chunk` instead of the
/// game palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPalette {
    pub palette_chunk: u32,
    pub pics: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParTime {
    pub minutes: f32,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameProfile {
    pub title: Title,
    pub extension: String,
    /// First picture chunk; lower chunks hold the picture table and fonts.
    pub start_pics: u32,
    pub pic_start: u32,
    pub pic_end: u32,
    pub font_count: u32,
    pub help_script: Option<u32>,
    pub script_range: Option<ChunkSpan>,
    pub sound_range: ChunkSpan,
    pub music_range: ChunkSpan,
    pub sprite_dir: String,
    pub sound_dir: String,
    pub adlib_dir: String,
    /// `GAMEMAPS` or `MAPTEMP`.
    pub map_file: String,
    /// Output name with a `{:02}` placeholder for the map number.
    pub map_name_format: String,
    pub ceiling_colours: Vec<u16>,
    pub songs: Vec<String>,
    pub par_times: Vec<ParTime>,
    /// Names for the music chunks. Without them music is numbered.
    pub song_titles: Option<Vec<String>>,
    pub pic_names: BTreeMap<u32, String>,
    /// Base name of the page file, `VSWAP` unless the game renamed it.
    #[serde(default = "default_page_file")]
    pub page_file: String,
    #[serde(default = "default_stages")]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub chunk_palettes: Vec<ChunkPalette>,
}

fn default_page_file() -> String {
    "VSWAP".to_string()
}

fn default_stages() -> Vec<Stage> {
    Stage::ALL.to_vec()
}

impl GameProfile {
    /// Built-in profile for a PC title. The shareware layout changed between releases.
    pub fn builtin(title: Title, version: GameVersion) -> Result<Self> {
        let source = match (title, version) {
            (Title::Wl6, _) => WL6,
            (Title::Wl1, GameVersion::Wl1V10) => WL1_V10,
            (Title::Wl1, GameVersion::Wl1V11) => WL1_V11,
            (Title::Wl1, _) => WL1_V14,
            (Title::Sod, _) => SOD,
            (Title::Sdm, _) => SDM,
            (Title::Sd1 | Title::Sd2 | Title::Sd3, _) => return Self::mission_pack(title),
            (Title::Bs6, _) => BS6,
            (Title::Bs1, _) => BS1,
            (Title::Vsi, _) => VSI,
            (Title::Co7, _) => CO7,
            (Title::Dmo, _) => DMO,
            (Title::N3d, _) => N3D,
            (Title::Bc, _) => BC,
            (Title::Mac, _) | (Title::Jaguar, _) => {
                return Err(WolfError::format(format!(
                    "{:?} has no chunk profile",
                    title
                )))
            }
        };
        let profile: GameProfile = serde_json::from_str(source)?;
        debug!("Using built-in {:?} profile for {:?}", title, version);
        Ok(profile)
    }

    /// Mission packs carry new maps and a new page file for the full Spear of Destiny and use
    /// its tables.
    fn mission_pack(title: Title) -> Result<Self> {
        let mut profile: GameProfile = serde_json::from_str(SOD)?;
        profile.title = title;
        profile.extension = title.extension().to_string();
        profile.stages = vec![Stage::PageData, Stage::Maps];
        debug!("Using Spear of Destiny tables for {:?}", title);
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let profile: GameProfile = serde_json::from_str(&text)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_pics == 0 || self.pic_start < self.start_pics {
            return Err(WolfError::format(format!(
                "Pictures must start after the picture table: start_pics {}, pic_start {}",
                self.start_pics, self.pic_start
            )));
        }
        for (name, span) in [
            ("pictures", Some(ChunkSpan { start: self.pic_start, end: self.pic_end })),
            ("scripts", self.script_range),
            ("sounds", Some(self.sound_range)),
            ("music", Some(self.music_range)),
        ] {
            if let Some(span) = span {
                if span.end < span.start {
                    return Err(WolfError::format(format!(
                        "Profile {} range {}..{} is reversed",
                        name, span.start, span.end
                    )));
                }
            }
        }
        if self.stages.is_empty() {
            return Err(WolfError::format("Profile has no stages"));
        }
        for set in &self.chunk_palettes {
            if let Some(pic) = set.pics.iter().find(|&&pic| pic < self.start_pics) {
                return Err(WolfError::format(format!(
                    "Picture {} drawn with chunk {} is below the first picture {}",
                    pic, set.palette_chunk, self.start_pics
                )));
            }
        }
        if !self.map_name_format.contains("{:02}") {
            return Err(WolfError::format(format!(
                "Map name format \"{}\" has no {{:02}} placeholder",
                self.map_name_format
            )));
        }
        Ok(())
    }

    /// Font chunks, immediately after the picture table chunk.
    pub fn fonts(&self) -> Range<u32> {
        1..1 + self.font_count
    }

    pub fn pictures(&self) -> Range<u32> {
        self.pic_start..self.pic_end
    }

    pub fn runs(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Page file name for data files with `extension`.
    pub fn page_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.page_file, extension)
    }

    /// Graphics chunk holding the palette for picture `id`, if it does not use the game palette.
    pub fn palette_chunk(&self, id: u32) -> Option<u32> {
        self.chunk_palettes
            .iter()
            .find(|set| set.pics.contains(&id))
            .map(|set| set.palette_chunk)
    }

    /// Help script followed by the end-screen scripts.
    pub fn scripts(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.help_script.into_iter().collect();
        if let Some(span) = self.script_range {
            ids.extend(span.range());
        }
        ids
    }

    /// `pics/<name>` stem of picture `id`, numbered when the table has no name for it.
    pub fn pic_name(&self, id: u32, raw_names: bool) -> String {
        match self.pic_names.get(&id) {
            Some(name) if !raw_names => name.clone(),
            _ => format!("{:03}", id),
        }
    }

    pub fn map_file_name(&self, index: usize) -> String {
        self.map_name_format
            .replacen("{:02}", &format!("{:02}", index), 1)
    }

    /// Music chunk `id` file stem.
    pub fn music_name(&self, id: u32) -> String {
        let index = id.saturating_sub(self.music_range.start);
        self.song_titles
            .as_ref()
            .and_then(|titles| titles.get(index as usize))
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    /// Ceiling colour palette index of map `index`. Maps past the table use the first entry.
    pub fn ceiling_index(&self, index: usize) -> u8 {
        self.ceiling_colours
            .get(index)
            .or_else(|| self.ceiling_colours.first())
            .map(|colour| (colour & 0xFF) as u8)
            .unwrap_or(0)
    }

    pub fn song(&self, index: usize) -> &str {
        self.songs
            .get(index)
            .or_else(|| self.songs.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Par time of map `index`; unknown past the end of the table.
    pub fn par_time(&self, index: usize) -> ParTime {
        self.par_times.get(index).cloned().unwrap_or_else(|| ParTime {
            minutes: 0.0,
            display: UNKNOWN_PAR.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_parse_and_validate() {
        for (title, version) in [
            (Title::Wl6, GameVersion::ActivisionWl6V14),
            (Title::Wl1, GameVersion::Wl1V10),
            (Title::Wl1, GameVersion::Wl1V11),
            (Title::Wl1, GameVersion::Wl1V14),
            (Title::Sod, GameVersion::SpearOfDestiny),
            (Title::Sdm, GameVersion::SpearOfDestinyDemo),
            (Title::Sd1, GameVersion::SpearOfDestiny),
            (Title::Sd3, GameVersion::SpearOfDestiny),
            (Title::Bs6, GameVersion::Unknown),
            (Title::Bs1, GameVersion::Unknown),
            (Title::Vsi, GameVersion::Unknown),
            (Title::Co7, GameVersion::Unknown),
            (Title::Dmo, GameVersion::Unknown),
            (Title::N3d, GameVersion::Unknown),
            (Title::Bc, GameVersion::Unknown),
        ] {
            let profile = GameProfile::builtin(title, version).unwrap();
            assert_eq!(profile.title, title);
            assert_eq!(profile.extension, title.extension());
            profile.validate().unwrap();
        }
        assert!(GameProfile::builtin(Title::Mac, GameVersion::Unknown).is_err());
    }

    #[test]
    fn wolfenstein_tables_cover_sixty_maps() {
        let profile = GameProfile::builtin(Title::Wl6, GameVersion::Unknown).unwrap();
        assert_eq!(profile.pictures(), 3..135);
        assert_eq!(profile.fonts(), 1..3);
        assert_eq!(profile.scripts(), vec![138, 143, 144, 145, 146, 147, 148]);
        assert_eq!(profile.ceiling_colours.len(), 60);
        assert_eq!(profile.songs.len(), 60);
        assert_eq!(profile.par_times.len(), 60);
        assert_eq!(profile.ceiling_index(9), 0xBF);
        assert_eq!(profile.song(59), "FUNKYOU");
        assert_eq!(profile.par_time(0).display, "01:30");
        assert_eq!(profile.par_time(8).display, "??:??");
        assert_eq!(profile.par_time(99).minutes, 0.0);
        assert_eq!(profile.map_file_name(7), "w07.map");
        assert_eq!(profile.music_name(261), "CORNER");
        assert_eq!(profile.music_name(270), "P.O.W");
    }

    #[test]
    fn shareware_layout_follows_the_release() {
        let v10 = GameProfile::builtin(Title::Wl1, GameVersion::Wl1V10).unwrap();
        assert_eq!(v10.pic_end, 139);
        assert_eq!(v10.map_file, "MAPTEMP");
        assert_eq!(v10.music_range.start, 219);
        let v14 = GameProfile::builtin(Title::Wl1, GameVersion::Unknown).unwrap();
        assert_eq!(v14.pic_end, 147);
        assert!(v14.scripts().is_empty());
    }

    #[test]
    fn mission_packs_use_spear_tables() {
        let profile = GameProfile::builtin(Title::Sd2, GameVersion::SpearOfDestiny).unwrap();
        let sod = GameProfile::builtin(Title::Sod, GameVersion::SpearOfDestiny).unwrap();
        assert_eq!(profile.extension, "SD2");
        assert_eq!(profile.stages, vec![Stage::PageData, Stage::Maps]);
        assert!(!profile.runs(Stage::Graphics));
        assert_eq!(profile.ceiling_colours, sod.ceiling_colours);
        assert_eq!(profile.sprite_dir, "sodsprites");
        assert_eq!(profile.page_file_name("SD2"), "VSWAP.SD2");
        assert!(sod.runs(Stage::Audio));
    }

    #[test]
    fn other_engine_games_follow_their_layouts() {
        let bs6 = GameProfile::builtin(Title::Bs6, GameVersion::Unknown).unwrap();
        assert_eq!(bs6.fonts(), 1..6);
        assert_eq!(bs6.pictures(), 6..165);
        assert_eq!(bs6.scripts().first(), Some(&181));
        assert_eq!(bs6.scripts().len(), 42);
        assert_eq!(bs6.palette_chunk(29), Some(168));
        assert_eq!(bs6.palette_chunk(30), Some(167));
        assert_eq!(bs6.palette_chunk(31), None);
        assert!(bs6.runs(Stage::Audio));
        assert!(!bs6.runs(Stage::Maps));

        let vsi = GameProfile::builtin(Title::Vsi, GameVersion::Unknown).unwrap();
        assert_eq!(vsi.palette_chunk(144), Some(203));

        let co7 = GameProfile::builtin(Title::Co7, GameVersion::Unknown).unwrap();
        assert_eq!(co7.fonts(), 1..4);
        assert_eq!(co7.pictures(), 4..59);
        assert_eq!(co7.page_file_name("CO7"), "GFXTILES.CO7");
        assert!(!co7.runs(Stage::Audio));

        let n3d = GameProfile::builtin(Title::N3d, GameVersion::Unknown).unwrap();
        assert_eq!(n3d.scripts(), vec![130]);
        assert_eq!(n3d.palette_chunk(82), Some(127));
        assert_eq!(n3d.page_file, "VSWAP");
    }

    #[test]
    fn profiles_without_the_new_fields_keep_the_defaults() {
        let mut value = serde_json::to_value(
            GameProfile::builtin(Title::Wl6, GameVersion::Unknown).unwrap(),
        )
        .unwrap();
        let fields = value.as_object_mut().unwrap();
        fields.remove("page_file");
        fields.remove("stages");
        fields.remove("chunk_palettes");
        let profile: GameProfile = serde_json::from_value(value).unwrap();
        assert_eq!(profile.page_file, "VSWAP");
        assert_eq!(profile.stages, Stage::ALL.to_vec());
        assert!(profile.chunk_palettes.is_empty());
    }

    #[test]
    fn stage_lists_and_palette_pictures_are_validated() {
        let mut profile = GameProfile::builtin(Title::Bs1, GameVersion::Unknown).unwrap();
        profile.chunk_palettes[0].pics.push(2);
        assert!(profile.validate().unwrap_err().is_format());

        let mut profile = GameProfile::builtin(Title::Bs1, GameVersion::Unknown).unwrap();
        profile.stages.clear();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn pictures_without_names_are_numbered() {
        let profile = GameProfile::builtin(Title::Wl6, GameVersion::Unknown).unwrap();
        assert_eq!(profile.pic_name(3, false), "H_BJPIC");
        assert_eq!(profile.pic_name(3, true), "003");
        assert_eq!(profile.pic_name(2000, false), "2000");
    }

    #[test]
    fn demo_music_is_numbered() {
        let profile = GameProfile::builtin(Title::Sdm, GameVersion::Unknown).unwrap();
        assert_eq!(profile.music_name(245), "2");
        assert_eq!(profile.map_file_name(3), "s03.map");
    }

    #[test]
    fn overrides_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = GameProfile::builtin(Title::Wl6, GameVersion::Unknown).unwrap();
        profile.map_name_format = "level.map".to_string();
        let path = dir.path().join("broken.json");
        fs::write(&path, serde_json::to_string(&profile).unwrap()).unwrap();
        assert!(GameProfile::load(&path).unwrap_err().is_format());

        profile.map_name_format = "e{:02}.map".to_string();
        fs::write(&path, serde_json::to_string(&profile).unwrap()).unwrap();
        assert_eq!(GameProfile::load(&path).unwrap().map_file_name(1), "e01.map");
    }
}
