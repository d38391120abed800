//! Pipeline orchestration: detection, thresholding, segmentation and
//! edge-intensity aggregation for one signal channel.
//!
//! Each stage consumes its input completely before the next one starts, and
//! all intermediate arrays are local values owned by one invocation. Nothing
//! is shared between invocations, so [`CellSegmenter::run_all`] can process
//! images in parallel without synchronization.

mod qc;

#[cfg(test)]
mod tests;

use rayon::prelude::*;

pub use qc::QcArtifacts;

use crate::config::{Config, Connectivity, Normalization, SeedPolarity};
use crate::detection::{detect_outlines, detect_spots};
use crate::edge_intensity::{CellRecord, aggregate_with_diagnostics, mean_edge_intensity};
use crate::error::{Error, Result};
use crate::grid::Plane;
use crate::segmentation::{SegmentParams, filter_regions, segment_within};
use crate::threshold_mask::threshold_with;

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Detected cells ordered by ascending label.
    pub cells: Vec<CellRecord>,
    /// Counters from every stage.
    pub diagnostics: Diagnostics,
    /// Intermediate arrays for QC export.
    pub artifacts: QcArtifacts,
}

impl PipelineOutput {
    /// Average intensity over all cell outlines, `None` without cells.
    pub fn mean_edge_intensity(&self) -> Option<f64> {
        mean_edge_intensity(&self.cells)
    }
}

/// Diagnostic counts from the segmentation pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Pixels in the thresholded outline mask.
    pub foreground_pixels: usize,
    /// Seed clusters found in the spot response.
    pub seeds: usize,
    /// Regions removed by `min_cell_area`.
    pub rejected_small: usize,
    /// Regions removed by `min_region_intensity`.
    pub rejected_dim: usize,
    /// Regions without outline pixels.
    pub degenerate_regions: usize,
    /// Final number of cell records.
    pub cells: usize,
}

/// Cell segmenter with builder-style configuration.
///
/// # Example
///
/// ```rust,ignore
/// use membra::CellSegmenter;
///
/// let segmenter = CellSegmenter::new()
///     .with_spot_sigma(6.0)
///     .with_outline_sigma(3.0)
///     .with_threshold(0.01);
/// let output = segmenter.run(&signal)?;
/// for cell in &output.cells {
///     println!("{}: {:.2}", cell.label, cell.mean_intensity);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellSegmenter {
    config: Config,
}

impl CellSegmenter {
    /// Create a segmenter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a segmenter from an existing configuration.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn with_spot_sigma(mut self, sigma: f32) -> Self {
        self.config.spot_sigma = sigma;
        self
    }

    pub fn with_outline_sigma(mut self, sigma: f32) -> Self {
        self.config.outline_sigma = sigma;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.config.threshold = threshold;
        self
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.config.normalization = normalization;
        self
    }

    pub fn with_seed_polarity(mut self, polarity: SeedPolarity) -> Self {
        self.config.seed_polarity = polarity;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.config.connectivity = connectivity;
        self
    }

    pub fn with_min_region_intensity(mut self, min: f32) -> Self {
        self.config.min_region_intensity = Some(min);
        self
    }

    pub fn with_min_cell_area(mut self, area: usize) -> Self {
        self.config.min_cell_area = area;
        self
    }

    /// Segment one signal channel and quantify its cell edges.
    pub fn run(&self, signal: &Plane<f32>) -> Result<PipelineOutput> {
        let config = &self.config;
        config.validate()?;
        if signal.is_empty() {
            return Err(Error::EmptyInput);
        }
        if let Some((index, &value)) = signal
            .pixels()
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v >= 0.0))
        {
            return Err(Error::InvalidSample { index, value });
        }

        tracing::debug!(
            "Segmenting {}x{} image: spot_sigma={:.2}, outline_sigma={:.2}, threshold={:.4}",
            signal.width(),
            signal.height(),
            config.spot_sigma,
            config.outline_sigma,
            config.threshold
        );
        log_signal_stats(signal);

        // Step 1: Spot and outline responses
        let spot_response = detect_spots(signal, config.spot_sigma)?;
        let outline_response = detect_outlines(signal, config.outline_sigma)?;

        // Step 2: Background threshold on the outline response
        let outline_mask = threshold_with(&outline_response, config.threshold, config.normalization)?;

        let mut diagnostics = Diagnostics {
            foreground_pixels: outline_mask.count_ones(),
            ..Default::default()
        };

        // Step 3: Seeded watershed on the outline response
        let params = SegmentParams {
            polarity: config.seed_polarity,
            connectivity: config.connectivity,
        };
        let segmentation = segment_within(
            &spot_response,
            &outline_response,
            &outline_mask,
            signal,
            params,
        )?;
        diagnostics.seeds = segmentation.seeds.num_labels();

        let mut labels = segmentation.labels;
        let (rejected_small, rejected_dim) = filter_regions(
            &mut labels,
            signal,
            config.min_cell_area,
            config.min_region_intensity,
        )?;
        diagnostics.rejected_small = rejected_small;
        diagnostics.rejected_dim = rejected_dim;

        // Step 4: Edge intensity per cell
        let (cells, aggregate) = aggregate_with_diagnostics(&labels, signal)?;
        diagnostics.degenerate_regions = aggregate.degenerate_regions;
        diagnostics.cells = cells.len();

        if cells.is_empty() {
            tracing::debug!("No cells detected");
        } else {
            tracing::debug!("Detected {} cells", cells.len());
        }

        Ok(PipelineOutput {
            cells,
            diagnostics,
            artifacts: QcArtifacts::new(
                spot_response,
                outline_response,
                outline_mask,
                segmentation.seeds,
                labels,
            ),
        })
    }

    /// Run every image independently in parallel; one result per image in
    /// input order. A failing image does not affect the others.
    pub fn run_all(&self, signals: &[Plane<f32>]) -> Vec<Result<PipelineOutput>> {
        signals
            .par_iter()
            .enumerate()
            .map(|(i, signal)| {
                let result = self.run(signal);
                if let Err(e) = &result {
                    tracing::warn!("Image {} failed: {}", i, e);
                }
                result
            })
            .collect()
    }
}

fn log_signal_stats(signal: &Plane<f32>) {
    let (min, max, sum) = signal.pixels().iter().fold(
        (f32::INFINITY, f32::NEG_INFINITY, 0.0f64),
        |(min, max, sum), &v| (min.min(v), max.max(v), sum + v as f64),
    );
    tracing::debug!(
        "Signal intensity: min={:.3}, max={:.3}, mean={:.3}",
        min,
        max,
        sum / signal.len() as f64
    );
}

/// Run the pipeline with the given detection parameters and defaults for
/// everything else.
pub fn run(
    signal: &Plane<f32>,
    spot_sigma: f32,
    outline_sigma: f32,
    threshold: f32,
) -> Result<PipelineOutput> {
    CellSegmenter::new()
        .with_spot_sigma(spot_sigma)
        .with_outline_sigma(outline_sigma)
        .with_threshold(threshold)
        .run(signal)
}
