//! Error handling for the extractor
//!
//! Every decoder and container returns [`Result`]. Callers decide per variant whether to skip
//! the current asset (`Io`, `NotAnImage`) or abandon the whole container (`Format`,
//! `DecodeOverrun`).

use std::io;

use thiserror::Error;

/// Error type for decoding and extraction
#[derive(Debug, Error)]
pub enum WolfError {
    /// File missing, unreadable or unwritable
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad signature, table size mismatch, chunk id out of range
    #[error("Invalid data format: {0}")]
    Format(String),

    /// A compressed stream tried to read or write outside its buffers
    #[error("{codec} decode overrun: {detail}")]
    DecodeOverrun { codec: &'static str, detail: String },

    /// Chunk id below the first picture of a graphics container
    #[error("Chunk {0} is not a picture")]
    NotAnImage(u32),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// PNG optimisation failed; the unoptimised file is kept
    #[error("PNG optimisation failed: {0}")]
    Optimise(String),
}

impl WolfError {
    pub fn format(msg: impl Into<String>) -> Self {
        WolfError::Format(msg.into())
    }

    pub fn overrun(codec: &'static str, detail: impl Into<String>) -> Self {
        WolfError::DecodeOverrun {
            codec,
            detail: detail.into(),
        }
    }

    /// Overruns are malformed input, so they abort a container exactly like format errors.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            WolfError::Format(_) | WolfError::DecodeOverrun { .. }
        )
    }
}

/// Result type alias for extractor operations
pub type Result<T> = std::result::Result<T, WolfError>;
