//! Flat sample space of a raster image.
//!
//! Samples are stored row-major with channels interleaved, so flat index
//! `i` addresses row `i / (width * channels)`, column `(i / channels) % width`
//! and channel `i % channels`.

use crate::error::{ChannelError, Result};
use image::{RgbImage, RgbaImage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleGrid {
    width: usize,
    height: usize,
    channels: usize,
    samples: Vec<u8>,
}

impl SampleGrid {
    pub fn new(width: usize, height: usize, channels: usize, samples: Vec<u8>) -> Result<Self> {
        let expected = sample_count(width, height, channels).ok_or(ChannelError::InvalidGrid {
            expected: usize::MAX,
            actual: samples.len(),
        })?;
        if samples.len() != expected {
            return Err(ChannelError::InvalidGrid {
                expected,
                actual: samples.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// A grid where every sample holds `value`.
    ///
    /// # Panics
    ///
    /// If `width * height * channels` overflows `usize`.
    pub fn filled(width: usize, height: usize, channels: usize, value: u8) -> Self {
        let len = sample_count(width, height, channels)
            .unwrap_or_else(|| panic!("{}x{}x{} grid overflows usize", width, height, channels));
        Self {
            width,
            height,
            channels,
            samples: vec![value; len],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of addressable samples, `width * height * channels`.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn index_of(&self, row: usize, col: usize, channel: usize) -> usize {
        debug_assert!(row < self.height && col < self.width && channel < self.channels);
        (row * self.width + col) * self.channels + channel
    }

    /// Inverse of [`SampleGrid::index_of`].
    pub fn coords(&self, index: usize) -> (usize, usize, usize) {
        debug_assert!(index < self.samples.len());
        let row = index / (self.width * self.channels);
        let col = (index / self.channels) % self.width;
        (row, col, index % self.channels)
    }

    pub fn get(&self, row: usize, col: usize, channel: usize) -> u8 {
        self.samples[self.index_of(row, col, channel)]
    }

    pub fn set(&mut self, row: usize, col: usize, channel: usize, value: u8) {
        let idx = self.index_of(row, col, channel);
        self.samples[idx] = value;
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Convert back into an `image` buffer. Only 3-channel grids qualify.
    pub fn into_rgb_image(self) -> Result<RgbImage> {
        if self.channels != 3 {
            return Err(ChannelError::InvalidConfig(format!(
                "an RGB image needs 3 channels, grid has {}",
                self.channels
            )));
        }

        let expected = self.samples.len();
        RgbImage::from_raw(self.width as u32, self.height as u32, self.samples).ok_or(
            ChannelError::InvalidGrid {
                expected,
                actual: expected,
            },
        )
    }
}

fn sample_count(width: usize, height: usize, channels: usize) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(channels)
}

impl From<RgbImage> for SampleGrid {
    fn from(img: RgbImage) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        Self {
            width,
            height,
            channels: 3,
            samples: img.into_raw(),
        }
    }
}

impl From<RgbaImage> for SampleGrid {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        Self {
            width,
            height,
            channels: 4,
            samples: img.into_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_bijection() {
        let grid = SampleGrid::filled(5, 3, 3, 0);
        assert_eq!(45, grid.len());

        for idx in 0..grid.len() {
            let (row, col, channel) = grid.coords(idx);
            assert!(row < 3 && col < 5 && channel < 3);
            assert_eq!(idx, grid.index_of(row, col, channel));
        }
    }

    #[test]
    fn test_coords_layout() {
        let grid = SampleGrid::filled(4, 4, 3, 0);
        assert_eq!((0, 0, 0), grid.coords(0));
        assert_eq!((0, 1, 2), grid.coords(5));
        assert_eq!((1, 0, 0), grid.coords(12));
        assert_eq!((3, 3, 2), grid.coords(47));
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        assert_eq!(
            Err(ChannelError::InvalidGrid {
                expected: 12,
                actual: 11
            }),
            SampleGrid::new(2, 2, 3, vec![0; 11])
        );
    }

    #[test]
    fn test_rgb_image_conversion() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(1, 0, image::Rgb([10, 20, 30]));

        let grid = SampleGrid::from(img.clone());
        assert_eq!(20, grid.get(0, 1, 1));

        let back = grid.into_rgb_image().expect("3-channel grid");
        assert_eq!(img, back);
    }

    #[test]
    fn test_rgba_grid_is_not_rgb() {
        let grid = SampleGrid::from(RgbaImage::new(1, 1));
        assert_eq!(4, grid.channels());
        assert!(grid.into_rgb_image().is_err());
    }

    #[test]
    fn test_new_rejects_overflowing_dimensions() {
        assert_eq!(
            Err(ChannelError::InvalidGrid {
                expected: usize::MAX,
                actual: 0
            }),
            SampleGrid::new(usize::MAX, 2, 3, Vec::new())
        );
    }

    #[test]
    #[should_panic(expected = "overflows usize")]
    fn test_filled_panics_on_overflow() {
        SampleGrid::filled(usize::MAX, usize::MAX, 3, 0);
    }
}
