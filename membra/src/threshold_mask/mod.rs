//! Background thresholding of response maps into bit-packed masks.
//!
//! The cutoff is a fraction in `[0, 1]` of a normalization reference taken
//! from the response map itself (see [`Normalization`]). Comparison is
//! strict, so a cutoff of 1.0 always gives an all-background mask, and a
//! constant response map has no foreground at any cutoff.


use rayon::prelude::*;

use crate::config::{Normalization, check_cutoff};
use crate::error::{Error, Result};
use crate::grid::{BitMask, Plane};

/// Threshold using the default [`Normalization::DynamicRange`] policy.
pub fn threshold(response: &Plane<f32>, cutoff: f32) -> Result<BitMask> {
    threshold_with(response, cutoff, Normalization::default())
}

/// Threshold with an explicit normalization policy.
pub fn threshold_with(
    response: &Plane<f32>,
    cutoff: f32,
    normalization: Normalization,
) -> Result<BitMask> {
    let mut violations = Vec::new();
    check_cutoff("threshold", cutoff, &mut violations);
    if !violations.is_empty() {
        return Err(Error::InvalidParameter { violations });
    }

    let width = response.width();
    let height = response.height();

    let Some((min, max)) = finite_range(response.pixels()) else {
        return Ok(BitMask::new_default(width, height));
    };
    if max - min <= 0.0 {
        tracing::debug!("Flat response map ({}), mask is all background", min);
        return Ok(BitMask::new_default(width, height));
    }

    // Foreground: pixel - offset > level
    let (offset, level) = match normalization {
        Normalization::DynamicRange => (min, cutoff * (max - min)),
        Normalization::Maximum => {
            if max <= 0.0 {
                return Ok(BitMask::new_default(width, height));
            }
            (0.0, cutoff * max)
        }
    };

    let pixels = response.pixels();
    let total_pixels = pixels.len();
    let mut words = vec![0u64; total_pixels.div_ceil(64)];

    words.par_iter_mut().enumerate().for_each(|(word_idx, word)| {
        let base_pixel = word_idx * 64;
        let end = (base_pixel + 64).min(total_pixels);
        let mut bits = 0u64;
        for (bit, &px) in pixels[base_pixel..end].iter().enumerate() {
            if px - offset > level {
                bits |= 1u64 << bit;
            }
        }
        *word = bits;
    });

    let mask = BitMask::from_words(width, height, words);
    tracing::debug!(
        "Threshold {:.4} ({:?}) kept {} of {} pixels",
        cutoff,
        normalization,
        mask.count_ones(),
        total_pixels
    );
    Ok(mask)
}

/// Min and max over finite values, `None` when there are none.
fn finite_range(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
