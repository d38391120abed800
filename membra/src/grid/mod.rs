//! Row-major 2D storage shared by every pipeline stage.
//!
//! [`Plane`] holds one value per pixel (intensities, responses, labels) and
//! [`BitMask`] packs binary masks at one bit per pixel. Pixels are addressed
//! either by linear index `y * width + x` or by `(x, y)`. Neighbourhoods are
//! computed on demand from coordinates, so no adjacency structure is stored.


use std::ops::{Index, IndexMut};

use arrayvec::ArrayVec;

use crate::config::Connectivity;

/// Number of bits per mask storage word.
const BITS_PER_WORD: usize = 64;

// ============================================================================
// Plane
// ============================================================================

/// A same-shape 2D array of per-pixel values.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Plane<T> {
    /// Wrap row-major pixels. Panics if the length does not match the shape.
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Build a plane by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::new(width, height, pixels)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.pixels
    }

    #[inline]
    pub fn into_pixels(self) -> Vec<T> {
        self.pixels
    }

    /// Linear index to `(x, y)`.
    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.width, idx / self.width)
    }

    /// Apply `f` to every pixel, keeping the shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Plane<U> {
        Plane {
            pixels: self.pixels.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Clone> Plane<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }
}

impl<T: Default + Clone> Plane<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, T::default())
    }
}

impl<T> Index<usize> for Plane<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.pixels[idx]
    }
}

impl<T> IndexMut<usize> for Plane<T> {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        &mut self.pixels[idx]
    }
}

impl<T> Index<(usize, usize)> for Plane<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.pixels[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Plane<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.pixels[y * self.width + x]
    }
}

// ============================================================================
// BitMask
// ============================================================================

/// A binary mask packed as bits, 64 pixels per `u64` word.
///
/// Bit `i % 64` of word `i / 64` holds pixel `i`. Padding bits past the last
/// pixel are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMask {
    words: Vec<u64>,
    width: usize,
    height: usize,
    len: usize,
}

impl BitMask {
    /// All-background mask.
    pub fn new_default(width: usize, height: usize) -> Self {
        let len = width * height;
        Self {
            words: vec![0; len.div_ceil(BITS_PER_WORD)],
            width,
            height,
            len,
        }
    }

    /// Build a mask from a row-major slice of booleans.
    pub fn from_slice(width: usize, height: usize, data: &[bool]) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "data length {} does not match dimensions {}x{}",
            data.len(),
            width,
            height
        );
        let mut mask = Self::new_default(width, height);
        for (i, &value) in data.iter().enumerate() {
            if value {
                mask.words[i / BITS_PER_WORD] |= 1u64 << (i % BITS_PER_WORD);
            }
        }
        mask
    }

    /// Wrap pre-packed words. Padding bits past `width * height` are cleared.
    pub(crate) fn from_words(width: usize, height: usize, mut words: Vec<u64>) -> Self {
        let len = width * height;
        assert_eq!(words.len(), len.div_ceil(BITS_PER_WORD), "word count mismatch");
        let tail = len % BITS_PER_WORD;
        if tail != 0
            && let Some(last) = words.last_mut()
        {
            *last &= (1u64 << tail) - 1;
        }
        Self {
            words,
            width,
            height,
            len,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len);
        (self.words[idx / BITS_PER_WORD] >> (idx % BITS_PER_WORD)) & 1 != 0
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: bool) {
        debug_assert!(idx < self.len);
        let bit = 1u64 << (idx % BITS_PER_WORD);
        if value {
            self.words[idx / BITS_PER_WORD] |= bit;
        } else {
            self.words[idx / BITS_PER_WORD] &= !bit;
        }
    }

    #[inline]
    pub fn get_xy(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < self.width && y < self.height);
        self.get(y * self.width + x)
    }

    /// Number of foreground pixels.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Linear indices of foreground pixels in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| {
                let mut remaining = word;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        return None;
                    }
                    let bit = remaining.trailing_zeros() as usize;
                    remaining &= remaining - 1;
                    Some(word_idx * BITS_PER_WORD + bit)
                })
            })
    }

    /// Pixel-wise AND with a predicate over linear indices.
    pub fn and_where(&self, mut keep: impl FnMut(usize) -> bool) -> Self {
        let mut out = self.clone();
        for idx in self.iter_ones() {
            if !keep(idx) {
                out.set(idx, false);
            }
        }
        out
    }
}

// ============================================================================
// Neighbourhoods
// ============================================================================

/// In-image neighbours of pixel `idx`, in row-major order.
#[inline]
pub(crate) fn neighbors(
    width: usize,
    height: usize,
    idx: usize,
    connectivity: Connectivity,
) -> ArrayVec<usize, 8> {
    let x = idx % width;
    let y = idx / width;
    let mut out = ArrayVec::new();

    let diagonal = connectivity == Connectivity::Eight;
    let x_lo = x.saturating_sub(1);
    let x_hi = (x + 1).min(width - 1);
    let y_lo = y.saturating_sub(1);
    let y_hi = (y + 1).min(height - 1);

    for ny in y_lo..=y_hi {
        for nx in x_lo..=x_hi {
            if nx == x && ny == y {
                continue;
            }
            if !diagonal && nx != x && ny != y {
                continue;
            }
            out.push(ny * width + nx);
        }
    }
    out
}
