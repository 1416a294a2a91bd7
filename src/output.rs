//! Output sink
//!
//! Every extractor writes through [`OutputSink`]. It owns the output directory, encodes images as
//! TGA (and optionally PNG), records each written file in `manifest.json` with an xxHash64
//! digest, keeps the failure counts and refreshes the progress file.

use std::fs::{self, File};
use std::hash::Hasher;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, warn};
use twox_hash::XxHash64;

use crate::error::{Result, WolfError};
use crate::formats::{png, tga};
use crate::graphics::fringe::smooth_upscale;
use crate::graphics::scale::{scale_buffer, ScaleFactor};
use crate::graphics::{convert, PixelBuffer};
use crate::progress::{write_progress, Progress};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Upscaling applied to page-file walls and sprites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ScaleMode {
    None,
    #[default]
    #[value(name = "scale2x")]
    Scale2x,
    /// Filtered 2x with the magenta fringe removed. Walls have no transparency, so they fall back
    /// to Scale2x.
    Smooth,
}

impl ScaleMode {
    pub fn apply_wall(self, wall: PixelBuffer) -> Result<PixelBuffer> {
        match self {
            ScaleMode::None => Ok(wall),
            ScaleMode::Scale2x | ScaleMode::Smooth => scale_buffer(ScaleFactor::X2, &wall),
        }
    }

    pub fn apply_sprite(self, sprite: PixelBuffer) -> Result<PixelBuffer> {
        match self {
            ScaleMode::None => Ok(sprite),
            ScaleMode::Scale2x => scale_buffer(ScaleFactor::X2, &sprite),
            ScaleMode::Smooth => smooth_upscale(&convert::to_rgba(&sprite)?),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Font,
    Picture,
    Script,
    Wall,
    Sprite,
    DigitisedSound,
    AdLibSound,
    Music,
    Map,
    Screen,
    Item,
    Hud,
    Label,
    Midi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Path relative to the output root, `/` separated.
    pub path: String,
    pub kind: AssetKind,
    /// Container and chunk the asset came from, for example `VSWAP.WL6 page 12`.
    pub source: String,
    pub size: u64,
    /// xxHash64 of the file bytes, lower-case hex.
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
}

/// Counts reported at the end of a run. Any failure makes the process exit non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub written: usize,
    pub failed: usize,
    pub aborted_containers: usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.written += other.written;
        self.failed += other.failed;
        self.aborted_containers += other.aborted_containers;
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.aborted_containers == 0
    }
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    title: &'a str,
    summary: RunSummary,
    assets: &'a [ManifestEntry],
}

#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub png: bool,
    pub optimise_png: bool,
    pub scale: ScaleMode,
    pub raw_names: bool,
    pub progress: Option<PathBuf>,
}

pub struct OutputSink {
    root: PathBuf,
    title: String,
    options: OutputOptions,
    entries: Vec<ManifestEntry>,
    summary: RunSummary,
    phase: String,
    phase_total: usize,
    phase_current: usize,
}

impl OutputSink {
    /// Create `root` and an empty manifest for `title`.
    pub fn new(root: &Path, title: &str, options: OutputOptions) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(OutputSink {
            root: root.to_path_buf(),
            title: title.to_string(),
            options,
            entries: Vec::new(),
            summary: RunSummary::default(),
            phase: String::new(),
            phase_total: 0,
            phase_current: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &OutputOptions {
        &self.options
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Start a named phase of `total` steps.
    pub fn begin_phase(&mut self, phase: &str, total: usize) {
        self.phase = phase.to_string();
        self.phase_total = total;
        self.phase_current = 0;
        self.report("running");
    }

    /// Advance the current phase by one step.
    pub fn step(&mut self) {
        self.phase_current += 1;
        self.report("running");
    }

    fn report(&self, status: &str) {
        let Some(path) = &self.options.progress else {
            return;
        };
        let progress = Progress {
            title: &self.title,
            phase: &self.phase,
            current: self.phase_current,
            total: self.phase_total,
            failed: self.summary.failed,
            status,
        };
        if let Err(e) = write_progress(path, &progress) {
            warn!("Could not update {}: {}", path.display(), e);
        }
    }

    /// Encode `image` as `dir/stem.tga`, plus `dir/stem.png` when previews are on.
    pub fn write_image(
        &mut self,
        dir: &str,
        stem: &str,
        image: &PixelBuffer,
        kind: AssetKind,
        source: &str,
    ) -> Result<()> {
        let bytes = tga::encode(image, tga::TgaOptions::default())?;
        let file_name = format!("{}.tga", stem);
        self.store(dir, &file_name, &bytes, kind, source, Some(image))?;

        if self.options.png {
            let path = self.root.join(dir).join(format!("{}.png", stem));
            png::save(image, &path, self.options.optimise_png)?;
        }
        Ok(())
    }

    /// Write `bytes` verbatim as `dir/file_name`.
    pub fn write_bytes(
        &mut self,
        dir: &str,
        file_name: &str,
        bytes: &[u8],
        kind: AssetKind,
        source: &str,
    ) -> Result<()> {
        self.store(dir, file_name, bytes, kind, source, None)
    }

    fn store(
        &mut self,
        dir: &str,
        file_name: &str,
        bytes: &[u8],
        kind: AssetKind,
        source: &str,
        image: Option<&PixelBuffer>,
    ) -> Result<()> {
        let directory = self.root.join(dir);
        fs::create_dir_all(&directory)?;
        let path = directory.join(file_name);
        fs::write(&path, bytes)?;

        let mut hasher = XxHash64::default();
        hasher.write(bytes);

        self.entries.push(ManifestEntry {
            path: format!("{}/{}", dir, file_name),
            kind,
            source: source.to_string(),
            size: bytes.len() as u64,
            hash: format!("{:016x}", hasher.finish()),
            width: image.map(PixelBuffer::width),
            height: image.map(PixelBuffer::height),
        });
        self.summary.written += 1;
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Log and count a failed asset. Extraction carries on with the next one.
    pub fn asset_failed(&mut self, what: &str, err: &WolfError) {
        warn!("{}: {}", what, err);
        self.summary.failed += 1;
    }

    /// Log and count a container that could not be read any further.
    pub fn container_failed(&mut self, container: &str, err: &WolfError) {
        error!("{}: {}. Skipping the rest of it.", container, err);
        self.summary.aborted_containers += 1;
    }

    /// Write `manifest.json` and hand back the run counts.
    pub fn finish(self) -> Result<RunSummary> {
        let manifest = Manifest {
            title: &self.title,
            summary: self.summary,
            assets: &self.entries,
        };
        let file = File::create(self.root.join(MANIFEST_FILE))?;
        serde_json::to_writer_pretty(file, &manifest)?;
        self.report(if self.summary.is_clean() { "done" } else { "failed" });
        Ok(self.summary)
    }
}

/// Run one asset, counting a failure instead of propagating it. Format errors are returned so
/// the caller can abandon the container.
pub fn per_asset(sink: &mut OutputSink, what: &str, result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_format() => Err(e),
        Err(e) => {
            sink.asset_failed(what, &e);
            Ok(())
        }
    }
}
