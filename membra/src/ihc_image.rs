//! Decoded multi-channel IHC images.

use crate::error::{Error, Result};
use crate::grid::Plane;

/// An immutable, decoded image with interleaved channels.
///
/// Samples are non-negative finite intensities; integer inputs keep their
/// raw numeric scale.
#[derive(Debug, Clone, PartialEq)]
pub struct IhcImage {
    width: usize,
    height: usize,
    channels: usize,
    samples: Vec<f32>,
}

impl IhcImage {
    /// Build from interleaved `f32` samples (`channels` values per pixel).
    pub fn from_interleaved_f32(
        width: usize,
        height: usize,
        channels: usize,
        samples: Vec<f32>,
    ) -> Result<Self> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(Error::EmptyInput);
        }
        let expected = width * height * channels;
        if samples.len() != expected {
            return Err(Error::SampleCount {
                expected,
                actual: samples.len(),
            });
        }
        if let Some((index, &value)) = samples
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v >= 0.0))
        {
            return Err(Error::InvalidSample { index, value });
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    pub fn from_interleaved_u8(
        width: usize,
        height: usize,
        channels: usize,
        samples: &[u8],
    ) -> Result<Self> {
        let samples = samples.iter().map(|&v| v as f32).collect();
        Self::from_interleaved_f32(width, height, channels, samples)
    }

    pub fn from_interleaved_u16(
        width: usize,
        height: usize,
        channels: usize,
        samples: &[u16],
    ) -> Result<Self> {
        let samples = samples.iter().map(|&v| v as f32).collect();
        Self::from_interleaved_f32(width, height, channels, samples)
    }

    /// Single-channel image from a plane.
    pub fn from_plane(plane: Plane<f32>) -> Result<Self> {
        let (width, height) = plane.shape();
        Self::from_interleaved_f32(width, height, 1, plane.into_pixels())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Copy out one channel as the signal plane used by the pipeline.
    pub fn signal(&self, channel: usize) -> Result<Plane<f32>> {
        if channel >= self.channels {
            return Err(Error::ChannelOutOfRange {
                channel,
                channels: self.channels,
            });
        }
        let pixels = self
            .samples
            .iter()
            .skip(channel)
            .step_by(self.channels)
            .copied()
            .collect();
        Ok(Plane::new(self.width, self.height, pixels))
    }
}
