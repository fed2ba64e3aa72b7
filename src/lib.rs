//! A keyed steganographic data channel for raster images.
//!
//! Payload bytes are framed, expanded to bits, replicated `duplicate_count`
//! times and written either into one bit-plane of seeded pseudo-random
//! samples, or into the ordering of two DCT coefficients per 8x8 block.
//! Extraction regenerates the same locations from the same key bytes and
//! majority-votes the replicas back into the payload.
//!
//! ```
//! use stegchannel::{embed, extract, ChannelConfig, SampleGrid};
//!
//! let config = ChannelConfig::default();
//! let cover = SampleGrid::filled(4, 4, 3, 0x80);
//!
//! let stego = embed(b"A", cover, b"test-key", &config)?;
//! assert_eq!(b"A".to_vec(), extract(&stego, b"test-key", &config)?);
//! # Ok::<(), stegchannel::ChannelError>(())
//! ```

pub mod bitplane;
pub mod carrier;
pub mod channel;
pub mod coeffswap;
pub mod dct;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod framing;
pub mod grid;
pub mod permute;
pub mod redundancy;
pub mod seed;

pub use bitplane::BitPlane;
pub use channel::{Channel, ChannelConfig, Embedding};
pub use coeffswap::SwapParams;
pub use error::{ChannelError, Result};
pub use framing::{FramingMode, SymbolWidth};
pub use grid::SampleGrid;
pub use seed::{derive_seed, SeedHash};

/// Embed `payload` into `grid`, keyed by `seed_source`.
///
/// Fails with [`ChannelError::CapacityExceeded`] before touching any sample
/// when the framed and replicated payload does not fit.
pub fn embed(
    payload: &[u8],
    grid: SampleGrid,
    seed_source: &[u8],
    config: &ChannelConfig,
) -> Result<SampleGrid> {
    Channel::new(config.clone())?.embed(payload, grid, seed_source)
}

/// Recover a payload embedded with the same `seed_source` and `config`.
pub fn extract(grid: &SampleGrid, seed_source: &[u8], config: &ChannelConfig) -> Result<Vec<u8>> {
    Channel::new(config.clone())?.extract(grid, seed_source)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CompressInput {
    None,
    Gzip,
}

impl TryFrom<u8> for CompressInput {
    type Error = String;

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            0 => Ok(CompressInput::None),
            1 => Ok(CompressInput::Gzip),
            _ => Err("Unsupported value for CompressInput".to_string()),
        }
    }
}

impl From<CompressInput> for u8 {
    fn from(c: CompressInput) -> u8 {
        match c {
            CompressInput::None => 0,
            CompressInput::Gzip => 1,
        }
    }
}

fn err_to_io_error<E>(error: E) -> std::io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    std::io::Error::new(std::io::ErrorKind::Other, error.into())
}
