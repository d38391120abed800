//! Configuration for the segmentation and quantification pipeline.
//!
//! This module defines the flat [`Config`] struct and the enums it uses. All
//! parameters are grouped by comments into logical sections. Defaults match
//! the batch driver: spot sigma 6, outline sigma 3, threshold 0.01.

use std::path::Path;

use common::FileFormat;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest accepted Gaussian sigma, in pixels. Kernels have `2 * ceil(3σ) + 1`
/// taps, so this bounds the per-pixel smoothing cost.
pub const MAX_SIGMA: f32 = 1000.0;

// ============================================================================
// Enums
// ============================================================================

/// Pixel connectivity used for seed plateaus, region growth and boundaries
/// between cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Only horizontal and vertical neighbours.
    #[default]
    Four,
    /// Horizontal, vertical and diagonal neighbours.
    Eight,
}

/// Reference used to turn the threshold fraction into a response cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Foreground where `(v - min) / (max - min) > threshold`.
    #[default]
    DynamicRange,
    /// Foreground where `v / max > threshold`.
    Maximum,
}

/// Which extrema of the spot response seed cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolarity {
    /// Bright cell interiors: local maxima seed regions.
    #[default]
    Maxima,
    /// Dark interiors bounded by bright membrane: local minima seed regions.
    Minima,
}

impl SeedPolarity {
    /// Whether `candidate` beats `current` as an extremum.
    #[inline]
    pub(crate) fn dominates(self, candidate: f32, current: f32) -> bool {
        match self {
            SeedPolarity::Maxima => candidate > current,
            SeedPolarity::Minima => candidate < current,
        }
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -- Detection ---------------------------------------------------------
    /// Gaussian sigma for spot (cell interior) detection, in pixels.
    pub spot_sigma: f32,
    /// Gaussian sigma for outline (membrane) detection, in pixels.
    pub outline_sigma: f32,

    // -- Background threshold ----------------------------------------------
    /// Background cutoff as a fraction in `[0, 1]` of [`Config::normalization`].
    pub threshold: f32,
    pub normalization: Normalization,

    // -- Segmentation ------------------------------------------------------
    pub seed_polarity: SeedPolarity,
    pub connectivity: Connectivity,

    // -- Region filters ----------------------------------------------------
    /// Drop regions whose mean raw intensity is not above this value.
    pub min_region_intensity: Option<f32>,
    /// Drop regions with fewer pixels than this.
    pub min_cell_area: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spot_sigma: 6.0,
            outline_sigma: 3.0,
            threshold: 0.01,
            normalization: Normalization::default(),
            seed_polarity: SeedPolarity::default(),
            connectivity: Connectivity::default(),
            min_region_intensity: None,
            min_cell_area: 0,
        }
    }
}

impl Config {
    /// Check every parameter and report all violations in one error.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        check_sigma("spot_sigma", self.spot_sigma, &mut violations);
        check_sigma("outline_sigma", self.outline_sigma, &mut violations);
        check_cutoff("threshold", self.threshold, &mut violations);

        if let Some(min) = self.min_region_intensity
            && !min.is_finite()
        {
            violations.push(format!("min_region_intensity must be finite, got {}", min));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidParameter { violations })
        }
    }

    /// Parse a YAML or JSON config and validate it.
    pub fn from_str_with_format(text: &str, format: FileFormat) -> Result<Self> {
        let config: Config = common::deserialize(text, format)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; the format follows the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = FileFormat::from_path(path).map_err(|source| Error::ConfigExtension {
            path: path.to_path_buf(),
            source,
        })?;
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_str_with_format(&text, format)
    }

    /// Serialize to YAML or JSON.
    pub fn to_string_with_format(&self, format: FileFormat) -> Result<String> {
        Ok(common::serialize(self, format)?)
    }
}

pub(crate) fn check_sigma(name: &str, sigma: f32, violations: &mut Vec<String>) {
    if !(sigma > 0.0 && sigma <= MAX_SIGMA) {
        violations.push(format!(
            "{} must be within (0, {}], got {}",
            name, MAX_SIGMA, sigma
        ));
    }
}

pub(crate) fn check_cutoff(name: &str, cutoff: f32, violations: &mut Vec<String>) {
    if !(0.0..=1.0).contains(&cutoff) {
        violations.push(format!("{} must be within [0, 1], got {}", name, cutoff));
    }
}
