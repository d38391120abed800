//! Separable isotropic Gaussian smoothing.
//!
//! Convolves rows, then columns, which is O(n×k) instead of O(n×k²) for a
//! kernel of size k. Samples outside the image take the value of the nearest
//! edge pixel, so a zero background stays zero and flat images stay flat.


use rayon::prelude::*;

use crate::config::MAX_SIGMA;
use crate::grid::Plane;

/// Rows handled per rayon task, to keep each task on its own cache lines.
const ROWS_PER_CHUNK: usize = 8;

/// Compute a normalized 1D Gaussian kernel.
///
/// Kernel radius is `ceil(3 * sigma)`; the result has `2 * radius + 1` taps
/// summing to 1.0. Panics unless `0 < sigma <= MAX_SIGMA`.
pub fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    assert!(sigma > 0.0, "Sigma must be positive");
    assert!(sigma <= MAX_SIGMA, "Sigma must not exceed {}", MAX_SIGMA);

    let radius = (3.0 * sigma).ceil() as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..2 * radius + 1)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

/// Smooth `plane` with an isotropic Gaussian of standard deviation `sigma`.
pub fn gaussian_smooth(plane: &Plane<f32>, sigma: f32) -> Plane<f32> {
    assert!(sigma > 0.0, "Sigma must be positive");

    let width = plane.width();
    let height = plane.height();
    if plane.is_empty() {
        return plane.clone();
    }

    let kernel = gaussian_kernel_1d(sigma);

    let mut temp = vec![0.0f32; width * height];
    convolve_rows(plane.pixels(), &mut temp, width, &kernel);

    let mut output = vec![0.0f32; width * height];
    convolve_cols(&temp, &mut output, width, height, &kernel);

    Plane::new(width, height, output)
}

fn convolve_rows(input: &[f32], output: &mut [f32], width: usize, kernel: &[f32]) {
    let radius = kernel.len() / 2;

    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let y_start = chunk_idx * ROWS_PER_CHUNK;
            for (local_y, out_row) in out_chunk.chunks_mut(width).enumerate() {
                let y = y_start + local_y;
                let in_row = &input[y * width..(y + 1) * width];
                for (x, out) in out_row.iter_mut().enumerate() {
                    let mut sum = 0.0f32;
                    for (k, &kval) in kernel.iter().enumerate() {
                        let sx = clamp_index(x as isize + k as isize - radius as isize, width);
                        sum += in_row[sx] * kval;
                    }
                    *out = sum;
                }
            }
        });
}

fn convolve_cols(input: &[f32], output: &mut [f32], width: usize, height: usize, kernel: &[f32]) {
    let radius = kernel.len() / 2;

    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let y_start = chunk_idx * ROWS_PER_CHUNK;
            for (local_y, out_row) in out_chunk.chunks_mut(width).enumerate() {
                let y = y_start + local_y;
                for (x, out) in out_row.iter_mut().enumerate() {
                    let mut sum = 0.0f32;
                    for (k, &kval) in kernel.iter().enumerate() {
                        let sy = clamp_index(y as isize + k as isize - radius as isize, height);
                        sum += input[sy * width + x] * kval;
                    }
                    *out = sum;
                }
            }
        });
}

/// Nearest-edge boundary handling.
#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}
