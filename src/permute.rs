//! Seeded selection of carrier locations.
//!
//! Both generators run the same partial Fisher-Yates shuffle over
//! `0..space`, driven by a ChaCha20 PRNG expanded from the 64-bit seed.
//! [`Locations`] keeps only the displaced entries in a sparse remap table,
//! so memory grows with the number of draws rather than with the image.
//! [`sample_locations`] materializes the whole index pool and is kept as the
//! reference the streaming form is checked against.
//!
//! Draws use `u64` ranges so the PRNG consumes the same entropy on 32-bit and
//! 64-bit targets.

use crate::error::{ChannelError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::HashMap;

/// Lazy sequence of `count` distinct indices drawn from `0..space`.
#[derive(Debug, Clone)]
pub struct Locations {
    seed: u64,
    space: usize,
    count: usize,
    cursor: usize,
    rng: ChaCha20Rng,
    remap: HashMap<usize, usize>,
}

impl Locations {
    pub fn new(seed: u64, space: usize, count: usize) -> Result<Self> {
        if count > space {
            return Err(ChannelError::CapacityExceeded {
                required_bits: count,
                available_bits: space,
            });
        }

        Ok(Self {
            seed,
            space,
            count,
            cursor: 0,
            rng: ChaCha20Rng::seed_from_u64(seed),
            remap: HashMap::new(),
        })
    }

    /// Rewind to the first location. The replayed sequence is identical.
    pub fn restart(&mut self) {
        self.cursor = 0;
        self.rng = ChaCha20Rng::seed_from_u64(self.seed);
        self.remap.clear();
    }

    pub fn space(&self) -> usize {
        self.space
    }
}

impl Iterator for Locations {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.count {
            return None;
        }

        let i = self.cursor;
        let j = self.rng.gen_range(i as u64..self.space as u64) as usize;

        let picked = self.remap.get(&j).copied().unwrap_or(j);
        // slot i is never drawn from again
        let displaced = self.remap.remove(&i).unwrap_or(i);
        if j != i {
            self.remap.insert(j, displaced);
        }

        self.cursor += 1;
        Some(picked)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Locations {}

/// Eager form of [`Locations`]: same output, O(space) memory.
pub fn sample_locations(seed: u64, space: usize, count: usize) -> Result<Vec<usize>> {
    if count > space {
        return Err(ChannelError::CapacityExceeded {
            required_bits: count,
            available_bits: space,
        });
    }

    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut pool: Vec<usize> = (0..space).collect();
    for i in 0..count {
        let j = rng.gen_range(i as u64..space as u64) as usize;
        pool.swap(i, j);
    }
    pool.truncate(count);

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streamed(seed: u64, space: usize, count: usize) -> Vec<usize> {
        Locations::new(seed, space, count)
            .expect("count fits")
            .collect()
    }

    #[test]
    fn test_distinct_and_in_range() {
        for &(space, count) in &[(1, 1), (48, 24), (1000, 999), (10_000, 50)] {
            let mut locations = streamed(7, space, count);
            assert_eq!(count, locations.len());
            assert!(locations.iter().all(|&l| l < space));

            locations.sort_unstable();
            locations.dedup();
            assert_eq!(count, locations.len());
        }
    }

    #[test]
    fn test_full_permutation() {
        let mut locations = streamed(99, 64, 64);
        locations.sort_unstable();
        assert_eq!((0..64).collect::<Vec<_>>(), locations);
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(streamed(1, 10, 0).is_empty());
        assert!(streamed(1, 0, 0).is_empty());
    }

    #[test]
    fn test_count_over_space_fails() {
        assert_eq!(
            ChannelError::CapacityExceeded {
                required_bits: 11,
                available_bits: 10
            },
            Locations::new(1, 10, 11).unwrap_err()
        );
        assert!(sample_locations(1, 10, 11).is_err());
    }

    #[test]
    fn test_reproducible() {
        assert_eq!(streamed(0xBEAD, 5000, 300), streamed(0xBEAD, 5000, 300));
    }

    #[test]
    fn test_seed_changes_sequence() {
        assert_ne!(streamed(1, 5000, 100), streamed(2, 5000, 100));
    }

    #[test]
    fn test_streaming_matches_materialized() {
        for &(seed, space, count) in &[(3, 48, 48), (0x11E6_0398, 4096, 700), (42, 17, 5)] {
            assert_eq!(
                sample_locations(seed, space, count).unwrap(),
                streamed(seed, space, count)
            );
        }
    }

    #[test]
    fn test_shorter_sequence_is_prefix() {
        let long = streamed(5, 2000, 400);
        let short = streamed(5, 2000, 100);
        assert_eq!(&long[..100], &short[..]);
    }

    #[test]
    fn test_restart_replays() {
        let mut locations = Locations::new(11, 300, 40).unwrap();
        let first: Vec<usize> = locations.by_ref().take(25).collect();

        locations.restart();
        assert_eq!(40, locations.len());
        let replay: Vec<usize> = locations.collect();
        assert_eq!(&first[..], &replay[..25]);
    }

    #[test]
    fn test_remap_stays_small() {
        let mut locations = Locations::new(8, 1_000_000_000, 1000).unwrap();
        locations.by_ref().for_each(drop);
        assert!(locations.remap.len() <= 1000);
    }

    #[test]
    fn test_pinned_sequence() {
        let seed = crate::seed::derive_seed(b"test-key");
        assert_eq!(vec![17, 44, 9, 45, 43, 40, 39, 24], streamed(seed, 48, 8));
        assert_eq!(
            vec![24, 982, 861, 188, 896, 240, 117, 255, 500, 773],
            streamed(0, 1000, 10)
        );
    }

    #[test]
    fn test_space_survives_iteration() {
        let mut locations = Locations::new(4, 500, 20).unwrap();
        let drawn: Vec<usize> = locations.by_ref().collect();

        assert_eq!(500, locations.space());
        assert!(drawn.iter().all(|&l| l < locations.space()));
    }
}
