use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the segmentation and quantification pipeline.
///
/// Empty results (no cells, degenerate regions) are not errors; they are
/// reported through the pipeline diagnostics instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid parameter: {}", violations.join("; "))]
    InvalidParameter { violations: Vec<String> },

    #[error("Input image has zero area")]
    EmptyInput,

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Expected {expected} samples for the given dimensions, got {actual}")]
    SampleCount { expected: usize, actual: usize },

    #[error("Sample {index} is not a finite non-negative intensity: {value}")]
    InvalidSample { index: usize, value: f32 },

    #[error("Channel {channel} out of range for a {channels}-channel image")]
    ChannelOutOfRange { channel: usize, channels: usize },

    #[error("Failed to read config '{path}': {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported config file '{path}': {source}")]
    ConfigExtension {
        path: PathBuf,
        source: common::FileExtensionError,
    },

    #[error("Failed to parse config: {0}")]
    ConfigFormat(#[from] common::SerdeFormatError),
}

pub type Result<T> = std::result::Result<T, Error>;
