use std::fs;
use std::path::Path;

use serde_json::Value;
use tempfile::TempDir;

use wolf_extractor::containers::offset_table::{OffsetTable, SPARSE_OFFSET};
use wolf_extractor::formats::tga;
use wolf_extractor::graphics::{bitplane, Palette, PixelFormat};
use wolf_extractor::output::{OutputOptions, ScaleMode, MANIFEST_FILE};
use wolf_extractor::profile::{ChunkPalette, ChunkSpan, GameProfile};
use wolf_extractor::runner::{extract_title, RunConfig};
use wolf_extractor::title::{self, DetectedTitle, Title};
use wolf_extractor::version::GameVersion;

/// Complete tree of depth 8: the code for byte `v` is its bits, most significant first.
fn byte_dictionary() -> Vec<u8> {
    let node_number = |heap: usize| (254 - heap) as u16 + 256;
    let mut data = Vec::new();
    for node in 0..255usize {
        let heap = 254 - node;
        let child = |c: usize| if c >= 255 { (c - 255) as u16 } else { node_number(c) };
        data.extend_from_slice(&child(2 * heap + 1).to_le_bytes());
        data.extend_from_slice(&child(2 * heap + 2).to_le_bytes());
    }
    data
}

fn compress(values: &[u8]) -> Vec<u8> {
    let mut out = (values.len() as u32).to_le_bytes().to_vec();
    let bits: Vec<u8> = values
        .iter()
        .flat_map(|v| (0..8).rev().map(move |i| (v >> i) & 1))
        .collect();
    for group in bits.chunks(8) {
        out.push(group.iter().enumerate().fold(0u8, |acc, (i, &b)| acc | b << i));
    }
    out
}

fn packed(values: &[u32]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| v.to_le_bytes()[..3].to_vec())
        .collect()
}

/// Chunk 0 the picture table, 1 a font, 2 sparse, 3 a 4x2 picture, 4 sparse, 5 the help text,
/// 6 a 6-bit palette where every entry is (1, 2, 3).
fn write_graphics(dir: &Path, extension: &str) {
    let mut font = vec![0u8; 2 + 256 * 2 + 256];
    font[0..2].copy_from_slice(&1u16.to_le_bytes());
    let location = font.len() as u16;
    font[2 + 65 * 2..4 + 65 * 2].copy_from_slice(&location.to_le_bytes());
    font[2 + 512 + 65] = 2;
    font.extend_from_slice(&[1, 1]);

    let mut graph = compress(&[4, 0, 2, 0, 4, 0, 1, 0]);
    let font_at = graph.len() as u32;
    graph.extend(compress(&font));
    let pic_at = graph.len() as u32;
    graph.extend(compress(&[10, 20, 30, 40, 50, 60, 70, 80]));
    let script_at = graph.len() as u32;
    graph.extend(compress(b"^P1\n^E"));
    let palette_at = graph.len() as u32;
    graph.extend(compress(&[1, 2, 3].repeat(256)));
    let end = graph.len() as u32;

    let head = packed(&[0, font_at, SPARSE_OFFSET, pic_at, SPARSE_OFFSET, script_at, palette_at, end]);
    fs::write(dir.join(format!("VGADICT.{}", extension)), byte_dictionary()).unwrap();
    fs::write(dir.join(format!("VGAHEAD.{}", extension)), head).unwrap();
    fs::write(dir.join(format!("VGAGRAPH.{}", extension)), graph).unwrap();
}

/// Page file with one wall and one sprite, followed by the given sound pages.
fn write_pages(dir: &Path, name: &str, sounds: &[Vec<u8>]) {
    let wall = vec![7u8; 4096];

    let mut sprite = Vec::new();
    sprite.extend_from_slice(&10u16.to_le_bytes());
    sprite.extend_from_slice(&10u16.to_le_bytes());
    sprite.extend_from_slice(&6u16.to_le_bytes());
    sprite.extend_from_slice(&10u16.to_le_bytes());
    sprite.extend_from_slice(&(12i16).to_le_bytes());
    sprite.extend_from_slice(&4u16.to_le_bytes());
    sprite.extend_from_slice(&0u16.to_le_bytes());
    sprite.extend_from_slice(&[30, 31, 32]);

    let mut pages = vec![wall, sprite];
    pages.extend_from_slice(sounds);

    let mut data = Vec::new();
    data.extend_from_slice(&(pages.len() as u16).to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&2u16.to_le_bytes());
    let mut offset = 6 + pages.len() * 6;
    let mut lengths = Vec::new();
    for page in &pages {
        data.extend_from_slice(&(offset as u32).to_le_bytes());
        lengths.extend_from_slice(&(page.len() as u16).to_le_bytes());
        offset += page.len();
    }
    data.extend(lengths);
    for page in &pages {
        data.extend_from_slice(page);
    }
    fs::write(dir.join(name), data).unwrap();
}

/// One wall, one sprite, one short sound.
fn write_page_file(dir: &Path) {
    write_pages(dir, "VSWAP.WL6", &[vec![0x80u8; 100]]);
}

fn write_maps(dir: &Path, extension: &str) {
    let mut data = b"TED5v1.0".to_vec();
    data.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
    let header_at = data.len() as u32;
    for offset in [8u32, 10, 12] {
        data.extend_from_slice(&offset.to_le_bytes());
    }
    for length in [2u16, 2, 2] {
        data.extend_from_slice(&length.to_le_bytes());
    }
    data.extend_from_slice(&64u16.to_le_bytes());
    data.extend_from_slice(&64u16.to_le_bytes());
    let mut name = [0u8; 16];
    name[..10].copy_from_slice(b"Wolf1 Map1");
    data.extend_from_slice(&name);
    data.extend_from_slice(b"!ID!");

    let mut head = 0xABCDu16.to_le_bytes().to_vec();
    head.extend_from_slice(&header_at.to_le_bytes());
    head.extend_from_slice(&0u32.to_le_bytes());
    fs::write(dir.join(format!("MAPHEAD.{}", extension)), head).unwrap();
    fs::write(dir.join(format!("GAMEMAPS.{}", extension)), data).unwrap();
}

/// Chunk 0 an AdLib sound, 1 empty, 2 one IMF command, 3 empty.
fn write_audio(dir: &Path) {
    let mut data = vec![0u8; 30];
    data[0..4].copy_from_slice(&7u32.to_le_bytes());
    data.extend_from_slice(&[4, 0, 0x20, 0x01, 10, 0]);

    let head: Vec<u8> = [0u32, 30, 30, 36, 36]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    fs::write(dir.join("AUDIOHED.WL6"), head).unwrap();
    fs::write(dir.join("AUDIOT.WL6"), data).unwrap();
}

fn game_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_graphics(dir.path(), "WL6");
    write_page_file(dir.path());
    write_maps(dir.path(), "WL6");
    write_audio(dir.path());
    dir
}

fn small_profile() -> GameProfile {
    let mut profile = GameProfile::builtin(Title::Wl6, GameVersion::Unknown).unwrap();
    profile.pic_start = 3;
    profile.pic_end = 5;
    profile.font_count = 1;
    profile.help_script = Some(5);
    profile.script_range = None;
    profile.sound_range = ChunkSpan { start: 0, end: 2 };
    profile.music_range = ChunkSpan { start: 2, end: 4 };
    profile
}

fn config(output: &Path, palette: Option<Palette>, raw_names: bool) -> RunConfig {
    RunConfig {
        output: output.to_path_buf(),
        options: OutputOptions {
            scale: ScaleMode::None,
            raw_names,
            ..OutputOptions::default()
        },
        palette,
        profile: Some(small_profile()),
    }
}

fn detected(dir: &Path) -> DetectedTitle {
    DetectedTitle {
        title: Title::Wl6,
        file: dir.join("VSWAP.WL6"),
    }
}

fn manifest_paths(root: &Path) -> Vec<String> {
    let text = fs::read_to_string(root.join(MANIFEST_FILE)).unwrap();
    let manifest: Value = serde_json::from_str(&text).unwrap();
    manifest["assets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|asset| asset["path"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn sparse_chunks_resolve_to_the_next_offset() {
    let table = OffsetTable::new(vec![Some(0), None, Some(10), None, Some(100)]);
    assert_eq!(table.chunk_count(), 4);

    let first = table.resolve(0).unwrap().unwrap();
    assert_eq!((first.offset, first.length), (0, 10));
    assert!(table.resolve(1).unwrap().is_none());
    let third = table.resolve(2).unwrap().unwrap();
    assert_eq!((third.offset, third.length), (10, 90));
    assert!(table.resolve(5).is_err());
}

#[test]
fn planar_pictures_spread_planes_over_columns() {
    let picture = bitplane::decode(&[10, 20, 30, 40], 4, 1, &Palette::greyscale(), PixelFormat::Rgb24)
        .unwrap();
    assert_eq!(picture.data(), &[10, 10, 10, 20, 20, 20, 30, 30, 30, 40, 40, 40]);
}

#[test]
fn data_files_are_detected_by_extension() {
    let dir = game_dir();
    let found = title::scan(dir.path()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, Title::Wl6);
}

#[test]
fn a_full_pc_title_is_extracted() {
    let dir = game_dir();
    let out = tempfile::tempdir().unwrap();
    let palette = Palette::greyscale();

    let summary = extract_title(
        &detected(dir.path()),
        dir.path(),
        &config(out.path(), Some(palette.clone()), false),
    )
    .unwrap();
    assert!(summary.is_clean(), "{:?}", summary);
    assert_eq!(summary.written, 9);

    let root = out.path().join("wl6");
    let mut paths = manifest_paths(&root);
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "gscripts/005.txt",
            "lsfx/000.adl",
            "maps/w00.map",
            "music/CORNER.imf",
            "pics/H_BJPIC.tga",
            "pics/font1.tga",
            "sfx/000.wav",
            "sprites/000.tga",
            "walls/000.tga",
        ]
    );
    for path in &paths {
        assert!(root.join(path).is_file(), "{} missing", path);
    }

    assert_eq!(fs::read(root.join("gscripts/005.txt")).unwrap(), b"^P1\n^E");
    assert_eq!(&fs::read(root.join("sfx/000.wav")).unwrap()[..4], b"RIFF");

    let map = fs::read(root.join("maps/w00.map")).unwrap();
    assert_eq!(&map[..4], b"!ID!");
    assert_eq!(u16::from_le_bytes([map[4], map[5]]), 0xABCD);
    let ceiling = u32::from_le_bytes([map[10], map[11], map[12], map[13]]);
    let floor = u32::from_le_bytes([map[14], map[15], map[16], map[17]]);
    assert_eq!(ceiling, palette.packed_rgb(small_profile().ceiling_index(0)));
    assert_eq!(floor, 0x19_19_19);
}

#[test]
fn without_a_palette_only_images_are_skipped() {
    let dir = game_dir();
    let out = tempfile::tempdir().unwrap();

    let summary = extract_title(&detected(dir.path()), dir.path(), &config(out.path(), None, false))
        .unwrap();
    assert!(summary.is_clean());

    let paths = manifest_paths(&out.path().join("wl6"));
    assert!(paths.iter().any(|p| p == "pics/font1.tga"));
    assert!(paths.iter().any(|p| p == "sfx/000.wav"));
    assert!(!paths.iter().any(|p| p.starts_with("walls/") || p.starts_with("sprites/")));
    assert!(!paths.iter().any(|p| p == "pics/H_BJPIC.tga"));

    let map = fs::read(out.path().join("wl6/maps/w00.map")).unwrap();
    assert_eq!(&map[10..18], &[0u8; 8]);
}

#[test]
fn raw_names_keep_chunk_numbers_and_skip_maps() {
    let dir = game_dir();
    let out = tempfile::tempdir().unwrap();

    extract_title(
        &detected(dir.path()),
        dir.path(),
        &config(out.path(), Some(Palette::greyscale()), true),
    )
    .unwrap();

    let root = out.path().join("wl6");
    assert!(root.join("pics/003.tga").is_file());
    assert!(!root.join("pics/H_BJPIC.tga").exists());
    assert!(!root.join("maps").exists());
}

#[test]
fn a_missing_container_aborts_only_its_stage() {
    let dir = game_dir();
    fs::remove_file(dir.path().join("AUDIOT.WL6")).unwrap();
    let out = tempfile::tempdir().unwrap();

    let summary = extract_title(
        &detected(dir.path()),
        dir.path(),
        &config(out.path(), Some(Palette::greyscale()), false),
    )
    .unwrap();
    assert_eq!(summary.aborted_containers, 1);
    assert_eq!(summary.written, 7);
    assert!(out.path().join("wl6/maps/w00.map").is_file());
}

#[test]
fn an_over_long_sound_does_not_stop_the_page_file() {
    let dir = game_dir();
    let mut sounds = vec![vec![0x80u8; 100]];
    sounds.extend(vec![vec![0x70u8; 4096]; 21]);
    sounds.push(vec![0x60u8; 10]);
    sounds.push(vec![0x50u8; 20]);
    write_pages(dir.path(), "VSWAP.WL6", &sounds);
    let out = tempfile::tempdir().unwrap();

    let summary = extract_title(
        &detected(dir.path()),
        dir.path(),
        &config(out.path(), Some(Palette::greyscale()), false),
    )
    .unwrap();
    assert_eq!(summary.aborted_containers, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.written, 10);

    let root = out.path().join("wl6");
    assert!(root.join("sfx/000.wav").is_file());
    assert!(!root.join("sfx/022.wav").exists());
    assert!(root.join("sfx/023.wav").is_file());
    assert!(root.join("walls/000.tga").is_file());
}

#[test]
fn a_mission_pack_gives_maps_and_page_data_only() {
    let dir = tempfile::tempdir().unwrap();
    write_pages(dir.path(), "VSWAP.SD1", &[vec![0x80u8; 100]]);
    write_maps(dir.path(), "SD1");
    let out = tempfile::tempdir().unwrap();

    let found = title::scan(dir.path()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, Title::Sd1);

    let mut config = config(out.path(), Some(Palette::greyscale()), false);
    config.profile = None;
    let summary = extract_title(&found[0], dir.path(), &config).unwrap();
    assert!(summary.is_clean(), "{:?}", summary);
    assert_eq!(summary.written, 4);

    let mut paths = manifest_paths(&out.path().join("sd1"));
    paths.sort();
    assert_eq!(
        paths,
        vec!["maps/s00.map", "sodsfx/000.wav", "sodsprites/000.tga", "walls/000.tga"]
    );
}

#[test]
fn renamed_page_files_and_chunk_palettes_are_used() {
    let dir = tempfile::tempdir().unwrap();
    write_graphics(dir.path(), "N3D");
    write_pages(dir.path(), "GFXTILES.N3D", &[vec![0x80u8; 100]]);
    let out = tempfile::tempdir().unwrap();

    let mut profile = GameProfile::builtin(Title::N3d, GameVersion::Unknown).unwrap();
    profile.pic_end = 5;
    profile.font_count = 1;
    profile.script_range = Some(ChunkSpan { start: 5, end: 6 });
    profile.page_file = "GFXTILES".to_string();
    profile.chunk_palettes = vec![ChunkPalette { palette_chunk: 6, pics: vec![3] }];

    let mut config = config(out.path(), Some(Palette::greyscale()), false);
    config.profile = Some(profile);
    let detected = DetectedTitle {
        title: Title::N3d,
        file: dir.path().join("GFXTILES.N3D"),
    };
    let summary = extract_title(&detected, dir.path(), &config).unwrap();
    assert!(summary.is_clean(), "{:?}", summary);

    let root = out.path().join("n3d");
    let mut paths = manifest_paths(&root);
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "gscripts/005.txt",
            "pics/003.tga",
            "pics/font1.tga",
            "sfx/000.wav",
            "sprites/000.tga",
            "walls/000.tga",
        ]
    );

    let picture = tga::decode(&fs::read(root.join("pics/003.tga")).unwrap()).unwrap();
    assert_eq!(picture.pixel(0, 0), Some(&[4, 8, 12][..]));
    assert_eq!(picture.pixel(3, 1), Some(&[4, 8, 12][..]));
}

#[test]
fn progress_is_written_when_asked_for() {
    let dir = game_dir();
    let out = tempfile::tempdir().unwrap();
    let progress = out.path().join("progress.json");

    let mut config = config(out.path(), Some(Palette::greyscale()), false);
    config.options.progress = Some(progress.clone());
    extract_title(&detected(dir.path()), dir.path(), &config).unwrap();

    let report: Value = serde_json::from_str(&fs::read_to_string(progress).unwrap()).unwrap();
    assert_eq!(report["title"], "wl6");
}
