//! Watermark error types.
//!
//! Only structurally invalid requests surface to callers. Discovery and
//! simulation failures are logged and absorbed where they happen.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or applying a watermark.
#[derive(Error, Debug)]
pub enum WatermarkError {
    /// The render request cannot produce a layer (empty text, bad size, ...)
    #[error("Invalid watermark request: {0}")]
    InvalidRequest(String),

    /// A font file or embedded font could not be parsed
    #[error("Failed to load font {}: {reason}", .path.display())]
    FontLoad { path: PathBuf, reason: String },

    /// A font discovery source could not be enumerated
    #[error("Font discovery source '{source_name}' unavailable: {reason}")]
    Discovery { source_name: String, reason: String },

    /// The affine simulation path rejected its input
    #[error("Style simulation failed: {0}")]
    Simulation(String),

    /// Settings file is malformed or fails validation
    #[error("Watermark configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
