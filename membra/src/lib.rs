//! Membra - cell-edge intensity quantification for IHC microscopy images.
//!
//! This library segments stained cells and measures the signal along their
//! membranes:
//! - Spot and outline detection by Gaussian smoothing at two scales
//! - Background thresholding of the outline response
//! - Seeded watershed flooding of the outline response into a label map
//! - Per-cell statistics of the raw signal along each outline
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use membra::{CellSegmenter, IhcImage};
//!
//! let image = IhcImage::from_interleaved_u8(width, height, 3, &samples)?;
//! let signal = image.signal(1)?;
//!
//! let output = CellSegmenter::new().run(&signal)?;
//! println!("Found {} cells", output.cells.len());
//! ```

pub(crate) mod config;
pub(crate) mod convolution;
pub(crate) mod detection;
pub(crate) mod edge_intensity;
mod error;
pub(crate) mod grid;
mod ihc_image;
pub(crate) mod pipeline;
pub(crate) mod segmentation;
pub(crate) mod threshold_mask;

#[cfg(test)]
pub mod testing;

pub mod prelude;

// ============================================================================
// Core types
// ============================================================================

pub use error::{Error, Result};
pub use grid::{BitMask, Plane};
pub use ihc_image::IhcImage;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{Config, Connectivity, MAX_SIGMA, Normalization, SeedPolarity};

// ============================================================================
// Pipeline stages
// ============================================================================

pub use convolution::{gaussian_kernel_1d, gaussian_smooth};
pub use detection::{detect_outlines, detect_spots};
pub use edge_intensity::{
    AggregateDiagnostics, CellRecord, aggregate, aggregate_with_diagnostics, mean_edge_intensity,
};
pub use segmentation::{
    LabelMap, SegmentParams, Segmentation, filter_regions, segment, segment_within,
};
pub use threshold_mask::{threshold, threshold_with};

// ============================================================================
// Pipeline
// ============================================================================

pub use pipeline::{CellSegmenter, Diagnostics, PipelineOutput, QcArtifacts, run};
