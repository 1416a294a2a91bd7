//! Locating game data by file extension.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Title {
    Wl6,
    Wl1,
    Sod,
    Sdm,
    /// Spear of Destiny mission packs: maps and page file only.
    Sd1,
    Sd2,
    Sd3,
    Mac,
    Jaguar,
    /// Blake Stone: Aliens of Gold.
    Bs6,
    /// Blake Stone: Aliens of Gold shareware.
    Bs1,
    /// Blake Stone: Planet Strike.
    Vsi,
    /// Corridor 7: Alien Invasion.
    Co7,
    /// Corridor 7 shareware.
    Dmo,
    /// Super 3D Noah's Ark.
    N3d,
    /// Operation Body Count.
    Bc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Pc,
    Macintosh,
    Jaguar,
}

impl Title {
    /// Extraction order when several titles share a directory.
    pub const ALL: [Title; 16] = [
        Title::Wl6,
        Title::Wl1,
        Title::Mac,
        Title::Jaguar,
        Title::Sod,
        Title::Sd1,
        Title::Sd2,
        Title::Sd3,
        Title::Sdm,
        Title::Bs6,
        Title::Bs1,
        Title::Vsi,
        Title::Co7,
        Title::Dmo,
        Title::N3d,
        Title::Bc,
    ];

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Title::Wl6 => &["WL6"],
            Title::Wl1 => &["WL1"],
            Title::Sod => &["SOD"],
            Title::Sdm => &["SDM"],
            Title::Sd1 => &["SD1"],
            Title::Sd2 => &["SD2"],
            Title::Sd3 => &["SD3"],
            Title::Bs6 => &["BS6"],
            Title::Bs1 => &["BS1"],
            Title::Vsi => &["VSI"],
            Title::Co7 => &["CO7"],
            Title::Dmo => &["DMO"],
            Title::N3d => &["N3D"],
            Title::Bc => &["BC"],
            Title::Mac => &["REZ"],
            Title::Jaguar => &["JAG", "J64"],
        }
    }

    /// Lower-case name used for output directories and `--title`.
    pub fn name(self) -> &'static str {
        match self {
            Title::Wl6 => "wl6",
            Title::Wl1 => "wl1",
            Title::Sod => "sod",
            Title::Sdm => "sdm",
            Title::Sd1 => "sd1",
            Title::Sd2 => "sd2",
            Title::Sd3 => "sd3",
            Title::Bs6 => "bs6",
            Title::Bs1 => "bs1",
            Title::Vsi => "vsi",
            Title::Co7 => "co7",
            Title::Dmo => "dmo",
            Title::N3d => "n3d",
            Title::Bc => "bc",
            Title::Mac => "mac",
            Title::Jaguar => "jaguar",
        }
    }

    /// Extension used for the PC data files.
    pub fn extension(self) -> &'static str {
        self.extensions()[0]
    }

    pub fn platform(self) -> Platform {
        match self {
            Title::Mac => Platform::Macintosh,
            Title::Jaguar => Platform::Jaguar,
            _ => Platform::Pc,
        }
    }

    /// Parse a `--title` value: any of the extensions, or `mac` / `jaguar`.
    pub fn from_name(name: &str) -> Option<Title> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "mac" | "macintosh" => return Some(Title::Mac),
            "jaguar" | "jag" => return Some(Title::Jaguar),
            _ => {}
        }
        Title::ALL.into_iter().find(|title| {
            title
                .extensions()
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(&lower))
        })
    }
}

/// A title found in the input directory with the first file that carries its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTitle {
    pub title: Title,
    pub file: PathBuf,
}

/// Find every known title in `dir`. Extensions match case-insensitively.
pub fn scan(dir: &Path) -> Result<Vec<DetectedTitle>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let found = Title::ALL
        .into_iter()
        .filter_map(|title| {
            files
                .iter()
                .find(|path| has_extension(path, title.extensions()))
                .map(|file| DetectedTitle {
                    title,
                    file: file.clone(),
                })
        })
        .collect();

    Ok(found)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
