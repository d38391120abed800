use image::{Rgb, RgbImage};

use crate::edge_intensity::is_outline;
use crate::error::Result;
use crate::grid::{BitMask, Plane};
use crate::segmentation::{LabelMap, check_shape};

const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 48, 48]);
const SEED_COLOR: Rgb<u8> = Rgb([48, 255, 96]);

/// Read-only intermediate arrays of one pipeline run.
#[derive(Debug, Clone)]
pub struct QcArtifacts {
    spot_response: Plane<f32>,
    outline_response: Plane<f32>,
    outline_mask: BitMask,
    seeds: LabelMap,
    labels: LabelMap,
}

impl QcArtifacts {
    pub(super) fn new(
        spot_response: Plane<f32>,
        outline_response: Plane<f32>,
        outline_mask: BitMask,
        seeds: LabelMap,
        labels: LabelMap,
    ) -> Self {
        Self {
            spot_response,
            outline_response,
            outline_mask,
            seeds,
            labels,
        }
    }

    pub fn spot_response(&self) -> &Plane<f32> {
        &self.spot_response
    }

    pub fn outline_response(&self) -> &Plane<f32> {
        &self.outline_response
    }

    pub fn outline_mask(&self) -> &BitMask {
        &self.outline_mask
    }

    /// Seed clusters as found, before region filtering.
    pub fn seeds(&self) -> &LabelMap {
        &self.seeds
    }

    /// Final cell labels, matching the cell records.
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Grayscale rendering of `signal` with cell outlines in red and seeds in
    /// green. Gray levels are scaled to the signal maximum. Fails with
    /// `ShapeMismatch` if `signal` is not the segmented image's shape.
    pub fn render_overlay(&self, signal: &Plane<f32>) -> Result<RgbImage> {
        let (width, height) = self.labels.shape();
        check_shape((width, height), signal.shape())?;

        let max = signal
            .pixels()
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0f32, f32::max);
        let scale = if max > 0.0 { 255.0 / max } else { 0.0 };

        let raw = self.labels.labels();
        let seeds = self.seeds.labels();

        Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            let idx = y * width + x;
            if raw[idx] != 0 && is_outline(raw, width, height, x, y) {
                OUTLINE_COLOR
            } else if seeds[idx] != 0 {
                SEED_COLOR
            } else {
                let gray = (signal[idx].max(0.0) * scale).round().min(255.0) as u8;
                Rgb([gray, gray, gray])
            }
        }))
    }
}
