//! Run the right extractor for each detected title.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::containers::{mac::MacResourceFile, wad::WadFile};
use crate::error::Result;
use crate::graphics::Palette;
use crate::jaguar_extractor::JaguarExtractor;
use crate::mac_extractor::MacExtractor;
use crate::output::{OutputOptions, OutputSink, RunSummary};
use crate::pc_extractor::PcExtractor;
use crate::profile::GameProfile;
use crate::title::{DetectedTitle, Platform};
use crate::version;

/// Settings shared by every title of one run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub output: PathBuf,
    pub options: OutputOptions,
    pub palette: Option<Palette>,
    pub profile: Option<GameProfile>,
}

/// Extract one title into `<output>/<title name>` and write its manifest.
pub fn extract_title(detected: &DetectedTitle, input: &Path, config: &RunConfig) -> Result<RunSummary> {
    let title = detected.title;
    let root = config.output.join(title.name());
    info!("{:?}: {} -> {}", title, detected.file.display(), root.display());

    let mut sink = OutputSink::new(&root, title.name(), config.options.clone())?;
    match title.platform() {
        Platform::Pc => {
            let version = version::detect(input, title);
            let profile = match &config.profile {
                Some(profile) if profile.title == title => profile.clone(),
                Some(profile) => {
                    warn!(
                        "Profile is for {:?}; using the built-in {:?} profile",
                        profile.title, title
                    );
                    GameProfile::builtin(title, version)?
                }
                None => GameProfile::builtin(title, version)?,
            };
            PcExtractor::new(input, &profile, version, config.palette.as_ref()).extract_all(&mut sink);
        }
        Platform::Macintosh => {
            let file = MacResourceFile::open(&detected.file)?;
            MacExtractor::new(&file).extract_all(&mut sink);
        }
        Platform::Jaguar => {
            let wad = WadFile::open(&detected.file)?;
            JaguarExtractor::new(&wad).extract_all(&mut sink);
        }
    }

    let summary = sink.finish()?;
    info!(
        "{:?}: {} written, {} failed, {} containers aborted",
        title, summary.written, summary.failed, summary.aborted_containers
    );
    Ok(summary)
}
