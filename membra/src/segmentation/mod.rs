//! Fusion of spot seeds and the outline mask into per-cell labels.
//!
//! # Algorithm Overview
//!
//! 1. **Territory**: pixels inside the thresholded outline mask (and, inside
//!    the pipeline, with positive raw signal). Everything else is a barrier
//!    that growth never crosses and that stays label 0.
//!
//! 2. **Seeds**: plateau-aware local extrema of the spot response inside the
//!    territory, one seed cluster per putative cell interior.
//!
//! 3. **Growth**: monotonic watershed flooding of a landscape (the outline
//!    response in the pipeline) from every seed into the territory. Ridges of
//!    the landscape are flooded last and become the boundaries between
//!    regions. Contested pixels go to the nearest seed centroid and then to
//!    the smallest label.
//!
//! 4. **Filtering** (optional): regions that are too small or too dim are
//!    dropped and the remaining labels are renumbered `1..=n`.
//!
//! No seeds is a valid outcome and yields a label map without cells.

mod growth;
mod seeds;


use crate::config::{Connectivity, SeedPolarity};
use crate::error::{Error, Result};
use crate::grid::{BitMask, Plane};

use growth::grow_regions;
use seeds::find_seeds;

// ============================================================================
// LabelMap
// ============================================================================

/// Per-pixel region labels: 0 is background, cells are `1..=num_labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Plane<u32>,
    num_labels: usize,
}

impl LabelMap {
    /// Wrap raw labels; the largest label present becomes `num_labels`.
    pub fn from_plane(labels: Plane<u32>) -> Self {
        let num_labels = labels.pixels().iter().copied().max().unwrap_or(0) as usize;
        Self { labels, num_labels }
    }

    /// A label map without any cell.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            labels: Plane::new_default(width, height),
            num_labels: 0,
        }
    }

    /// Number of cell labels (excluding background).
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.labels.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.labels.height()
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.labels.shape()
    }

    /// Raw row-major labels.
    #[inline]
    pub fn labels(&self) -> &[u32] {
        self.labels.pixels()
    }

    #[inline]
    pub fn as_plane(&self) -> &Plane<u32> {
        &self.labels
    }

    /// Pixel count per label, index `label` (index 0 counts background).
    pub fn region_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.num_labels + 1];
        for &l in self.labels() {
            sizes[l as usize] += 1;
        }
        sizes
    }

    /// Keep labels for which `keep(label)` is true and renumber them `1..=n`
    /// preserving their order. Returns the number of labels removed.
    pub fn retain(&mut self, mut keep: impl FnMut(u32) -> bool) -> usize {
        let mut remap = vec![0u32; self.num_labels + 1];
        let mut next = 0u32;
        for label in 1..=self.num_labels as u32 {
            if keep(label) {
                next += 1;
                remap[label as usize] = next;
            }
        }

        for l in self.labels.pixels_mut() {
            *l = remap[*l as usize];
        }

        let removed = self.num_labels - next as usize;
        self.num_labels = next as usize;
        removed
    }
}

impl std::ops::Index<usize> for LabelMap {
    type Output = u32;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.labels[idx]
    }
}

// ============================================================================
// Segmentation
// ============================================================================

/// Options for [`segment_within`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentParams {
    pub polarity: SeedPolarity,
    pub connectivity: Connectivity,
}

/// Seeds and grown regions of one segmentation.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Seed clusters. Seed `l` grew into region `l` before any region filter.
    pub seeds: LabelMap,
    /// Grown cell regions.
    pub labels: LabelMap,
}

/// Segment with the outline mask as the only territory and default options.
///
/// The spot response doubles as the flooding landscape.
pub fn segment(spot_response: &Plane<f32>, outline_mask: &BitMask) -> Result<LabelMap> {
    check_shape(spot_response.shape(), outline_mask.shape())?;
    let segmentation = segment_territory(
        spot_response,
        spot_response,
        outline_mask,
        SegmentParams::default(),
    );
    Ok(segmentation.labels)
}

/// Segment inside `outline_mask ∧ (signal > 0)`, flooding `outline_response`.
pub fn segment_within(
    spot_response: &Plane<f32>,
    outline_response: &Plane<f32>,
    outline_mask: &BitMask,
    signal: &Plane<f32>,
    params: SegmentParams,
) -> Result<Segmentation> {
    check_shape(spot_response.shape(), outline_response.shape())?;
    check_shape(spot_response.shape(), outline_mask.shape())?;
    check_shape(spot_response.shape(), signal.shape())?;

    let territory = outline_mask.and_where(|idx| signal[idx] > 0.0);
    Ok(segment_territory(
        spot_response,
        outline_response,
        &territory,
        params,
    ))
}

fn segment_territory(
    spot_response: &Plane<f32>,
    landscape: &Plane<f32>,
    territory: &BitMask,
    params: SegmentParams,
) -> Segmentation {
    let (width, height) = spot_response.shape();

    let seeds = find_seeds(
        spot_response,
        territory,
        params.polarity,
        params.connectivity,
    );
    tracing::debug!(
        "Found {} seed clusters in {} territory pixels",
        seeds.count(),
        territory.count_ones()
    );

    if seeds.count() == 0 {
        return Segmentation {
            seeds: LabelMap::empty(width, height),
            labels: LabelMap::empty(width, height),
        };
    }

    let grown = grow_regions(
        &seeds,
        landscape,
        territory,
        params.polarity,
        params.connectivity,
    );
    let num_labels = seeds.count();

    Segmentation {
        seeds: LabelMap {
            labels: seeds.labels,
            num_labels,
        },
        labels: LabelMap {
            labels: grown,
            num_labels,
        },
    }
}

/// Drop regions smaller than `min_area` or whose mean signal is not above
/// `min_intensity`, then renumber. Returns `(too_small, too_dim)` counts.
pub fn filter_regions(
    labels: &mut LabelMap,
    signal: &Plane<f32>,
    min_area: usize,
    min_intensity: Option<f32>,
) -> Result<(usize, usize)> {
    check_shape(labels.shape(), signal.shape())?;
    if min_area == 0 && min_intensity.is_none() {
        return Ok((0, 0));
    }

    let sizes = labels.region_sizes();
    let mut sums = vec![0.0f64; labels.num_labels() + 1];
    for (&l, &v) in labels.labels().iter().zip(signal.pixels()) {
        sums[l as usize] += v as f64;
    }

    let mut too_small = 0;
    let mut too_dim = 0;
    labels.retain(|label| {
        let area = sizes[label as usize];
        if area < min_area {
            too_small += 1;
            return false;
        }
        if let Some(min) = min_intensity {
            let mean = if area == 0 {
                0.0
            } else {
                sums[label as usize] / area as f64
            };
            if mean <= min as f64 {
                too_dim += 1;
                return false;
            }
        }
        true
    });

    if too_small + too_dim > 0 {
        tracing::debug!(
            "Region filter removed {} small and {} dim regions",
            too_small,
            too_dim
        );
    }
    Ok((too_small, too_dim))
}

pub(crate) fn check_shape(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(Error::ShapeMismatch { expected, actual });
    }
    Ok(())
}
