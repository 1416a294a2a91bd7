pub mod audio;
pub mod compression;
pub mod graphics;
pub mod mac;
pub mod maps;
pub mod offset_table;
pub mod page_file;
pub mod wad;

use std::{fs, path::Path};

use crate::error::{Result, WolfError};

/// A compressed chunk that knows how to expand itself.
pub trait CompressionContainer {
    fn decompress(&self) -> Result<Vec<u8>>;
}

/// A container file identified by a magic word at a known offset.
pub trait ContainerHandler: Sized {
    fn magic_words() -> &'static [&'static [u8]];

    fn matches(data: &[u8]) -> bool {
        Self::magic_words().iter().any(|magic| data.starts_with(magic))
    }

    fn deserialise(data: Vec<u8>) -> Result<Self>;
}

/// Open `name` inside `dir`, trying the name as given, then upper case, then lower case.
///
/// The DOS releases ship upper-case names but unpacked copies are frequently lower-cased.
pub fn read_data_file(dir: &Path, name: &str) -> Result<Vec<u8>> {
    for candidate in [
        name.to_string(),
        name.to_ascii_uppercase(),
        name.to_ascii_lowercase(),
    ] {
        let path = dir.join(&candidate);
        if path.is_file() {
            return Ok(fs::read(path)?);
        }
    }
    Err(WolfError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} not found in {}", name, dir.display()),
    )))
}
