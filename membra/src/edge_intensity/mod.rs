//! Per-cell edge intensity statistics.
//!
//! The outline of a cell is the set of its pixels with at least one
//! 4-neighbour inside the image carrying a different label. The image border
//! is not treated as membrane. Statistics are computed from the raw signal,
//! never from smoothed responses.


use serde::Serialize;

use crate::error::Result;
use crate::grid::Plane;
use crate::segmentation::{LabelMap, check_shape};

/// Edge intensity summary of one detected cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRecord {
    /// Cell label in the label map.
    pub label: u32,
    /// Outline pixels as `(row, col)`, in row-major order.
    pub outline_pixels: Vec<(usize, usize)>,
    /// Mean raw intensity over the outline pixels.
    pub mean_intensity: f64,
    pub median_intensity: f64,
    pub total_intensity: f64,
    /// Number of outline pixels.
    pub pixel_count: usize,
    /// Number of pixels in the whole region.
    pub area: usize,
    /// Region centroid as `(row, col)`.
    pub centroid: (f64, f64),
}

/// Aggregation counters that are not part of the cell records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateDiagnostics {
    /// Labels present in the map but without any outline pixel.
    pub degenerate_regions: usize,
}

#[derive(Debug, Default)]
struct Accumulator {
    area: usize,
    sum_row: f64,
    sum_col: f64,
    outline: Vec<(usize, usize)>,
    intensities: Vec<f32>,
}

/// Cell records ordered by ascending label.
pub fn aggregate(labels: &LabelMap, signal: &Plane<f32>) -> Result<Vec<CellRecord>> {
    aggregate_with_diagnostics(labels, signal).map(|(cells, _)| cells)
}

/// Like [`aggregate`], also counting degenerate regions.
pub fn aggregate_with_diagnostics(
    labels: &LabelMap,
    signal: &Plane<f32>,
) -> Result<(Vec<CellRecord>, AggregateDiagnostics)> {
    check_shape(labels.shape(), signal.shape())?;

    let (width, height) = labels.shape();
    let raw = labels.labels();
    let mut acc: Vec<Accumulator> = (0..=labels.num_labels())
        .map(|_| Accumulator::default())
        .collect();

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let label = raw[idx];
            if label == 0 {
                continue;
            }

            let a = &mut acc[label as usize];
            a.area += 1;
            a.sum_row += y as f64;
            a.sum_col += x as f64;

            if is_outline(raw, width, height, x, y) {
                a.outline.push((y, x));
                a.intensities.push(signal[idx]);
            }
        }
    }

    let mut diagnostics = AggregateDiagnostics::default();
    let mut cells = Vec::with_capacity(labels.num_labels());

    for (label, a) in acc.into_iter().enumerate().skip(1) {
        if a.area == 0 {
            continue;
        }
        if a.outline.is_empty() {
            diagnostics.degenerate_regions += 1;
            continue;
        }

        let Accumulator {
            area,
            sum_row,
            sum_col,
            outline,
            mut intensities,
        } = a;

        let total: f64 = intensities.iter().map(|&v| v as f64).sum();
        let pixel_count = outline.len();
        cells.push(CellRecord {
            label: label as u32,
            outline_pixels: outline,
            mean_intensity: total / pixel_count as f64,
            median_intensity: median_f32_mut(&mut intensities),
            total_intensity: total,
            pixel_count,
            area,
            centroid: (sum_row / area as f64, sum_col / area as f64),
        });
    }

    if diagnostics.degenerate_regions > 0 {
        tracing::debug!(
            "Skipped {} regions without outline pixels",
            diagnostics.degenerate_regions
        );
    }

    Ok((cells, diagnostics))
}

/// Whether labelled pixel `(x, y)` has an in-image 4-neighbour with another label.
#[inline]
pub(crate) fn is_outline(raw: &[u32], width: usize, height: usize, x: usize, y: usize) -> bool {
    let idx = y * width + x;
    let label = raw[idx];
    (x > 0 && raw[idx - 1] != label)
        || (x + 1 < width && raw[idx + 1] != label)
        || (y > 0 && raw[idx - width] != label)
        || (y + 1 < height && raw[idx + width] != label)
}

/// Pixel-weighted mean intensity over the outlines of all cells.
///
/// This is the per-image "average edge intensity" figure; `None` when no
/// cell was detected.
pub fn mean_edge_intensity(cells: &[CellRecord]) -> Option<f64> {
    let pixels: usize = cells.iter().map(|c| c.pixel_count).sum();
    if pixels == 0 {
        return None;
    }
    let total: f64 = cells.iter().map(|c| c.total_intensity).sum();
    Some(total / pixels as f64)
}

/// Median of a non-empty slice, averaging the two middle values for even lengths.
fn median_f32_mut(values: &mut [f32]) -> f64 {
    debug_assert!(!values.is_empty());
    values.sort_unstable_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] as f64 + values[mid] as f64) / 2.0
    } else {
        values[mid] as f64
    }
}
