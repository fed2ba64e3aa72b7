use crate::bitplane::{BitPlane, PlaneSlots};
use crate::carrier::{gather, spread, SlotReader};
use crate::coeffswap::{BlockSlots, SwapParams};
use crate::error::{ChannelError, Result};
use crate::framing::{self, Budget, FramingMode, SymbolWidth};
use crate::grid::SampleGrid;
use crate::permute::Locations;
use crate::redundancy;
use crate::seed::SeedHash;
use log::{debug, warn};

pub const DEFAULT_CAPACITY_BYTES: usize = 1024;

/// Where payload bits are stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Embedding {
    /// One bit per sample, at seeded pseudo-random sample positions.
    BitPlane(BitPlane),
    /// One bit per 8x8 block of a single channel, in block order.
    CoefficientSwap(SwapParams),
}

impl Default for Embedding {
    fn default() -> Self {
        Embedding::BitPlane(BitPlane::LSB)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub embedding: Embedding,
    pub duplicate_count: usize,
    pub framing: FramingMode,
    /// Payload size for [`FramingMode::FixedCapacity`]; ignored otherwise.
    pub capacity_bytes: usize,
    pub symbol_width: SymbolWidth,
    pub seed_hash: SeedHash,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            embedding: Embedding::default(),
            duplicate_count: 1,
            framing: FramingMode::default(),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            symbol_width: SymbolWidth::default(),
            seed_hash: SeedHash::default(),
        }
    }
}

impl ChannelConfig {
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_bit_plane(self, plane: BitPlane) -> Self {
        self.with_embedding(Embedding::BitPlane(plane))
    }

    pub fn with_duplicate_count(mut self, duplicate_count: usize) -> Self {
        self.duplicate_count = duplicate_count;
        self
    }

    pub fn with_framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_capacity_bytes(mut self, capacity_bytes: usize) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    pub fn with_symbol_width(mut self, symbol_width: SymbolWidth) -> Self {
        self.symbol_width = symbol_width;
        self
    }

    pub fn with_seed_hash(mut self, seed_hash: SeedHash) -> Self {
        self.seed_hash = seed_hash;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.duplicate_count == 0 {
            return Err(ChannelError::InvalidConfig(
                "duplicate count must be at least 1".to_string(),
            ));
        }
        if let Embedding::CoefficientSwap(params) = &self.embedding {
            params.validate()?;
        }
        self.framing.validate()
    }
}

/// A configured steganographic channel.
///
/// Stateless between calls: the location sequence is regenerated from the
/// seed source on every embed and extract.
#[derive(Debug, Clone, Default)]
pub struct Channel {
    config: ChannelConfig,
}

impl Channel {
    pub fn new(config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Number of one-bit carriers `grid` offers under this configuration.
    pub fn capacity_bits(&self, grid: &SampleGrid) -> Result<usize> {
        match &self.config.embedding {
            Embedding::BitPlane(_) => Ok(grid.len()),
            Embedding::CoefficientSwap(params) => {
                Ok(BlockSlots::analyze(grid, *params)?.slot_count())
            }
        }
    }

    /// Largest payload `grid` can carry, `None` if not even an empty one fits.
    pub fn max_payload_bytes(&self, grid: &SampleGrid) -> Result<Option<usize>> {
        let budget = self.budget(self.capacity_bits(grid)?);
        let symbols = budget.replica_symbols();

        let max = match &self.config.framing {
            FramingMode::LengthPrefixed => {
                let mut len = symbols.saturating_sub(2);
                while len > 0 && decimal_digits(len) + 1 + len > symbols {
                    len -= 1;
                }
                Some(len).filter(|&len| decimal_digits(len) + 1 + len <= symbols)
            }
            FramingMode::FixedCapacity => {
                Some(self.config.capacity_bytes).filter(|&c| c <= symbols)
            }
            FramingMode::MarkerSearch { sentinel } => {
                Some(symbols / 2).filter(|&len| len >= sentinel.len())
            }
            FramingMode::Terminated { terminator } => symbols.checked_sub(terminator.len()),
        };

        Ok(max)
    }

    pub fn embed(&self, payload: &[u8], mut grid: SampleGrid, seed_source: &[u8]) -> Result<SampleGrid> {
        self.embed_in_place(payload, &mut grid, seed_source)?;
        Ok(grid)
    }

    /// Embed `payload` into `grid`. On error the grid is left untouched.
    pub fn embed_in_place(&self, payload: &[u8], grid: &mut SampleGrid, seed_source: &[u8]) -> Result<()> {
        let config = &self.config;

        let target = match &config.embedding {
            Embedding::BitPlane(plane) => Target::Plane(*plane),
            Embedding::CoefficientSwap(params) => Target::Blocks(BlockSlots::analyze(grid, *params)?),
        };
        let slots = match &target {
            Target::Plane(_) => grid.len(),
            Target::Blocks(blocks) => blocks.slot_count(),
        };

        let budget = self.budget(slots);
        let framed = config.framing.frame(payload, config.capacity_bytes, &budget)?;
        let bits = framing::to_bits(&framed, config.symbol_width)?;

        let required_bits = bits.len() * config.duplicate_count;
        let info_string = format!(
            "payload: {} bytes, framed: {} symbols, required bits: {}, available slots: {}, utilisation: {:.4}%",
            payload.len(),
            framed.len(),
            required_bits,
            slots,
            (required_bits as f64 / slots.max(1) as f64) * 100.0,
        );
        debug!("{}", info_string);

        if required_bits > slots {
            return Err(ChannelError::CapacityExceeded {
                required_bits,
                available_bits: slots,
            });
        }

        let replica_len = budget.replica_bits();
        let total = replica_len * config.duplicate_count;
        // nothing past the head of the last replica gets written
        let span = if bits.is_empty() {
            0
        } else {
            total - replica_len + bits.len()
        };

        debug!(
            "replicas: {} x {} bits, {} locations visited",
            config.duplicate_count, replica_len, span
        );

        let written = match target {
            Target::Plane(plane) => {
                let seed = config.seed_hash.derive(seed_source);
                let locations = Locations::new(seed, slots, total)?.take(span);
                let mut plane_slots = PlaneSlots::new(grid.samples_mut(), plane);
                spread(&mut plane_slots, locations, &bits, replica_len)
            }
            Target::Blocks(mut blocks) => {
                let written = spread(&mut blocks, 0..span, &bits, replica_len);
                blocks.write_back(grid);
                written
            }
        };

        debug!("wrote {} carrier bits", written);

        Ok(())
    }

    /// Recover the payload from `grid`.
    ///
    /// A `BadLength`, `LengthOutOfRange` or `SentinelNotFound` error means no
    /// framed payload was found, most often because the seed source differs
    /// from the one used to embed.
    pub fn extract(&self, grid: &SampleGrid, seed_source: &[u8]) -> Result<Vec<u8>> {
        let config = &self.config;

        let symbols = match &config.embedding {
            Embedding::BitPlane(plane) => {
                let slots = grid.len();
                let total = self.budget(slots).replica_bits() * config.duplicate_count;
                let seed = config.seed_hash.derive(seed_source);
                let plane_slots = PlaneSlots::new(grid.samples(), *plane);
                self.read_symbols(&plane_slots, Locations::new(seed, slots, total)?)
            }
            Embedding::CoefficientSwap(params) => {
                let blocks = BlockSlots::analyze(grid, *params)?;
                let total = self.budget(blocks.slot_count()).replica_bits() * config.duplicate_count;
                self.read_symbols(&blocks, 0..total)
            }
        };

        config
            .framing
            .unframe(&symbols, config.capacity_bytes)
            .map_err(|err| {
                if err.is_no_payload() {
                    warn!("no payload recovered: {}", err);
                }
                err
            })
    }

    /// Recover the symbol stream carried at `locations`.
    ///
    /// A single self-delimiting replica is read lazily and reading stops at
    /// the frame boundary. Otherwise every location is gathered and the
    /// replicas are majority-voted.
    fn read_symbols<R, I>(&self, slots: &R, locations: I) -> Vec<u8>
    where
        R: SlotReader,
        I: IntoIterator<Item = usize>,
    {
        let config = &self.config;

        if config.duplicate_count == 1 && config.framing.is_self_delimiting() {
            let (symbols, visited) =
                read_until_framed(slots, locations, config.symbol_width, &config.framing);
            debug!(
                "read {} symbols from {} locations",
                symbols.len(),
                visited
            );
            return symbols;
        }

        let raw = gather(slots, locations);
        let replica_len = redundancy::replica_len(raw.len(), config.duplicate_count);
        let (voted, quality) = redundancy::collapse_with_quality(&raw, replica_len);
        debug!(
            "voted {} bits over {} replicas, agreement {:.4}",
            voted.len(),
            quality.replicas,
            quality.agreement
        );

        framing::from_bits(&voted, config.symbol_width)
    }

    fn budget(&self, slots: usize) -> Budget {
        Budget {
            slots,
            duplicate_count: self.config.duplicate_count,
            width: self.config.symbol_width,
        }
    }
}

/// Carrier resolved for one embed call.
enum Target {
    Plane(BitPlane),
    Blocks(BlockSlots),
}

/// Decode symbols one at a time until `framing` reports a complete frame or
/// the locations run out. Returns the symbols and the number of locations
/// visited.
fn read_until_framed<R, I>(
    slots: &R,
    locations: I,
    width: SymbolWidth,
    mode: &FramingMode,
) -> (Vec<u8>, usize)
where
    R: SlotReader,
    I: IntoIterator<Item = usize>,
{
    let w = width.bits();
    let mut symbols = Vec::new();
    let mut bits = Vec::with_capacity(w);
    let mut visited = 0;

    for slot in locations {
        bits.push(slots.read_slot(slot));
        visited += 1;

        if bits.len() == w {
            symbols.extend(framing::from_bits(&bits, width));
            bits.clear();
            if mode.is_complete(&symbols) {
                break;
            }
        }
    }

    (symbols, visited)
}

fn decimal_digits(mut value: usize) -> usize {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}
