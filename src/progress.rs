use std::{fs, path::Path};

use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// Snapshot written to the `--progress` file after every asset.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Progress<'a> {
    pub title: &'a str,
    pub phase: &'a str,
    pub current: usize,
    pub total: usize,
    pub failed: usize,
    pub status: &'a str,
}

pub fn write_progress(path: &Path, progress: &Progress<'_>) -> Result<()> {
    let json = serde_json::to_string(progress)?;
    fs::write(path, json)?;
    debug!(
        "{} {}: {}/{}",
        progress.title, progress.phase, progress.current, progress.total
    );
    Ok(())
}
