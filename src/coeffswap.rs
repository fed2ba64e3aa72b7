//! Frequency-domain carrier: one bit per 8x8 block.
//!
//! The bit lives in the ordering of two mid/high frequency coefficients,
//! A = (6, 7) and B = (5, 1): `A > B` reads as `1`, anything else as `0`.
//! Embedding swaps the pair when needed and then widens the gap to at least
//! `intensity`, so requantization has to move a coefficient by roughly
//! `intensity / 2` before the bit flips.
//!
//! Blocks of one color channel are visited in row-major order. Edge pixels
//! that do not fill a complete block carry nothing.

use crate::carrier::{SlotReader, SlotWriter};
use crate::dct::{self, BLOCK};
use crate::error::{ChannelError, Result};
use crate::grid::SampleGrid;
use log::debug;

pub const CARRIER_A: usize = 6 * 8 + 7;
pub const CARRIER_B: usize = 5 * 8 + 1;

pub const DEFAULT_INTENSITY: f64 = 30.0;
/// Green, in RGB order.
pub const DEFAULT_CHANNEL: usize = 1;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SwapParams {
    pub channel: usize,
    pub intensity: f64,
}

impl Default for SwapParams {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL,
            intensity: DEFAULT_INTENSITY,
        }
    }
}

impl SwapParams {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.intensity.is_finite() || self.intensity < 0.0 {
            return Err(ChannelError::InvalidConfig(format!(
                "intensity must be a non-negative number, got {}",
                self.intensity
            )));
        }
        Ok(())
    }
}

pub fn embed_bit(block: &mut [f64; 64], bit: u8, intensity: f64) {
    let (mut a, mut b) = (block[CARRIER_A], block[CARRIER_B]);

    if (bit == 1 && a < b) || (bit == 0 && a > b) {
        std::mem::swap(&mut a, &mut b);
    }

    let gap = (a - b).abs();
    if gap < intensity {
        let push = (intensity - gap) / 2.0;
        if bit == 1 {
            a += push;
            b -= push;
        } else {
            a -= push;
            b += push;
        }
    }

    block[CARRIER_A] = a;
    block[CARRIER_B] = b;
}

pub fn read_bit(block: &[f64; 64]) -> u8 {
    if block[CARRIER_A] > block[CARRIER_B] {
        1
    } else {
        0
    }
}

/// Transform-domain view of one channel of a grid.
///
/// Built by [`BlockSlots::analyze`]; blocks written through [`SlotWriter`]
/// are synthesized back into pixels by [`BlockSlots::write_back`].
pub struct BlockSlots {
    params: SwapParams,
    blocks_wide: usize,
    blocks: Vec<[f64; 64]>,
    dirty: Vec<bool>,
}

impl BlockSlots {
    pub fn analyze(grid: &SampleGrid, params: SwapParams) -> Result<Self> {
        params.validate()?;
        if params.channel >= grid.channels() {
            return Err(ChannelError::InvalidConfig(format!(
                "channel {} does not exist in a {}-channel grid",
                params.channel,
                grid.channels()
            )));
        }

        let blocks_wide = grid.width() / BLOCK;
        let blocks_tall = grid.height() / BLOCK;

        let mut blocks = Vec::with_capacity(blocks_wide * blocks_tall);
        for br in 0..blocks_tall {
            for bc in 0..blocks_wide {
                let mut pixels = [0.0f64; 64];
                for (i, pixel) in pixels.iter_mut().enumerate() {
                    *pixel = grid.get(br * BLOCK + i / 8, bc * BLOCK + i % 8, params.channel) as f64;
                }
                blocks.push(dct::forward(&pixels));
            }
        }

        debug!(
            "analyzed {}x{} blocks of channel {}",
            blocks_wide, blocks_tall, params.channel
        );

        let dirty = vec![false; blocks.len()];
        Ok(Self {
            params,
            blocks_wide,
            blocks,
            dirty,
        })
    }

    pub fn block(&self, slot: usize) -> &[f64; 64] {
        &self.blocks[slot]
    }

    /// Inverse-transform every written block into `grid`, rounding and
    /// clamping to `0..=255`. Returns how many blocks were touched.
    pub fn write_back(&self, grid: &mut SampleGrid) -> usize {
        let mut touched = 0;
        for (slot, coeffs) in self.blocks.iter().enumerate() {
            if !self.dirty[slot] {
                continue;
            }

            let (br, bc) = (slot / self.blocks_wide, slot % self.blocks_wide);
            let pixels = dct::inverse(coeffs);
            for (i, &pixel) in pixels.iter().enumerate() {
                let value = pixel.round().max(0.0).min(255.0) as u8;
                grid.set(br * BLOCK + i / 8, bc * BLOCK + i % 8, self.params.channel, value);
            }
            touched += 1;
        }
        touched
    }
}

impl SlotReader for BlockSlots {
    fn slot_count(&self) -> usize {
        self.blocks.len()
    }

    fn read_slot(&self, slot: usize) -> u8 {
        read_bit(&self.blocks[slot])
    }
}

impl SlotWriter for BlockSlots {
    fn write_slot(&mut self, slot: usize, bit: u8) {
        embed_bit(&mut self.blocks[slot], bit, self.params.intensity);
        self.dirty[slot] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with(a: f64, b: f64) -> [f64; 64] {
        let mut block = [0.0f64; 64];
        block[CARRIER_A] = a;
        block[CARRIER_B] = b;
        block
    }

    fn textured_grid(width: usize, height: usize) -> SampleGrid {
        let mut samples = Vec::with_capacity(width * height * 3);
        for i in 0..width * height * 3 {
            samples.push((60 + (i * 31 + (i / 7) * 13) % 130) as u8);
        }
        SampleGrid::new(width, height, 3, samples).unwrap()
    }

    #[test]
    fn test_margin_for_one() {
        let mut block = block_with(3.0, 5.0);
        embed_bit(&mut block, 1, 30.0);
        assert_eq!(1, read_bit(&block));
        assert!(block[CARRIER_A] - block[CARRIER_B] >= 30.0 - 1e-9);
    }

    #[test]
    fn test_margin_for_zero() {
        let mut block = block_with(12.0, -4.0);
        embed_bit(&mut block, 0, 30.0);
        assert_eq!(0, read_bit(&block));
        assert!(block[CARRIER_B] - block[CARRIER_A] >= 30.0 - 1e-9);
    }

    #[test]
    fn test_equal_pair_nudged() {
        let mut block = block_with(7.0, 7.0);
        embed_bit(&mut block, 1, 30.0);
        assert!((block[CARRIER_A] - 22.0).abs() < 1e-9);
        assert!((block[CARRIER_B] + 8.0).abs() < 1e-9);

        let mut block = block_with(7.0, 7.0);
        embed_bit(&mut block, 0, 30.0);
        assert_eq!(0, read_bit(&block));
        assert!((block[CARRIER_B] - block[CARRIER_A] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_wide_gap_kept() {
        let mut block = block_with(80.0, -20.0);
        embed_bit(&mut block, 1, 30.0);
        assert_eq!((80.0, -20.0), (block[CARRIER_A], block[CARRIER_B]));
    }

    #[test]
    fn test_other_coefficients_untouched() {
        let mut block = [1.5f64; 64];
        embed_bit(&mut block, 0, 30.0);
        for (i, c) in block.iter().enumerate() {
            if i != CARRIER_A && i != CARRIER_B {
                assert_eq!(1.5, *c);
            }
        }
    }

    #[test]
    fn test_analyze_counts_complete_blocks() {
        let grid = textured_grid(20, 17);
        let slots = BlockSlots::analyze(&grid, SwapParams::default()).unwrap();
        assert_eq!(4, slots.slot_count());
    }

    #[test]
    fn test_analyze_rejects_missing_channel() {
        let grid = SampleGrid::filled(8, 8, 1, 0);
        assert!(matches!(
            BlockSlots::analyze(&grid, SwapParams::default()),
            Err(ChannelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bits_survive_pixel_rounding() {
        let mut grid = textured_grid(32, 24);
        let bits = [1u8, 0, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0];

        let mut slots = BlockSlots::analyze(&grid, SwapParams::default()).unwrap();
        assert_eq!(12, slots.slot_count());
        for (slot, &bit) in bits.iter().enumerate() {
            slots.write_slot(slot, bit);
        }
        assert_eq!(12, slots.write_back(&mut grid));

        let reread = BlockSlots::analyze(&grid, SwapParams::default()).unwrap();
        for (slot, &bit) in bits.iter().enumerate() {
            assert_eq!(bit, reread.read_slot(slot), "block {}", slot);
            let block = reread.block(slot);
            let gap = (block[CARRIER_A] - block[CARRIER_B]).abs();
            assert!(gap >= DEFAULT_INTENSITY - 8.0, "block {} gap {}", slot, gap);
        }
    }

    #[test]
    fn test_untouched_blocks_not_rewritten() {
        let mut grid = textured_grid(16, 8);
        let original = grid.clone();

        let mut slots = BlockSlots::analyze(&grid, SwapParams::default()).unwrap();
        slots.write_slot(1, 1);
        assert_eq!(1, slots.write_back(&mut grid));

        for row in 0..8 {
            for col in 0..8 {
                assert_eq!(original.get(row, col, 1), grid.get(row, col, 1));
            }
        }
    }

    #[test]
    fn test_negative_intensity_rejected() {
        let params = SwapParams {
            channel: 0,
            intensity: -1.0,
        };
        assert!(params.validate().is_err());
    }
}
