//! Seed derivation from the shared key artifact.
//!
//! The seed must come out identical on every platform and toolchain, so a
//! fixed checksum over the raw key bytes is used instead of
//! `std::collections::hash_map::DefaultHasher`.

use crate::error::ChannelError;
use log::debug;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SeedHash {
    /// zlib Adler-32.
    Adler32,
    /// IEEE CRC-32.
    Crc32,
}

impl Default for SeedHash {
    fn default() -> Self {
        SeedHash::Adler32
    }
}

impl TryFrom<u8> for SeedHash {
    type Error = ChannelError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(SeedHash::Adler32),
            1 => Ok(SeedHash::Crc32),
            _ => Err(ChannelError::InvalidConfig(format!(
                "unsupported seed hash: {}",
                v
            ))),
        }
    }
}

impl SeedHash {
    pub fn derive(self, seed_source: &[u8]) -> u64 {
        let checksum = match self {
            SeedHash::Adler32 => {
                let mut adler = adler::Adler32::new();
                adler.write_slice(seed_source);
                adler.checksum()
            }
            SeedHash::Crc32 => crc32fast::hash(seed_source),
        };

        debug!(
            "derived seed {:#010x} from {} key bytes ({:?})",
            checksum,
            seed_source.len(),
            self
        );

        u64::from(checksum)
    }
}

/// Adler-32 seed of `seed_source`.
pub fn derive_seed(seed_source: &[u8]) -> u64 {
    SeedHash::Adler32.derive(seed_source)
}
