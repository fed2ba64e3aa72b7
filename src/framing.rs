//! Payload framing: how a decoder finds the end of the message.
//!
//! Framing works on symbols (bytes) before they are expanded to bits. On
//! decode a mode receives the voted replica, or for self-delimiting modes
//! possibly just the prefix up to its boundary, and must ignore whatever
//! follows that boundary.

use crate::error::{ChannelError, Result};
use crate::redundancy;

/// Longest decimal prefix accepted before the `:` marker.
const MAX_PREFIX_DIGITS: usize = 20;

const PADDING: u8 = b' ';

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SymbolWidth {
    /// For payloads known to be 7-bit ASCII, such as armored ciphertext.
    Seven,
    Eight,
}

impl SymbolWidth {
    pub fn bits(self) -> usize {
        match self {
            SymbolWidth::Seven => 7,
            SymbolWidth::Eight => 8,
        }
    }
}

impl Default for SymbolWidth {
    fn default() -> Self {
        SymbolWidth::Eight
    }
}

impl TryFrom<u8> for SymbolWidth {
    type Error = ChannelError;

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            7 => Ok(SymbolWidth::Seven),
            8 => Ok(SymbolWidth::Eight),
            _ => Err(ChannelError::InvalidConfig(format!(
                "unsupported symbol width: {}",
                v
            ))),
        }
    }
}

/// Expand symbols to bits, most significant bit first.
pub fn to_bits(symbols: &[u8], width: SymbolWidth) -> Result<Vec<u8>> {
    let w = width.bits();
    let mut bits = Vec::with_capacity(symbols.len() * w);

    for &byte in symbols {
        if w < 8 && byte >> w != 0 {
            return Err(ChannelError::SymbolOverflow {
                byte,
                width: w as u32,
            });
        }
        bits.extend((0..w).rev().map(|shift| (byte >> shift) & 0x01));
    }

    Ok(bits)
}

/// Pack bits back into symbols. A trailing partial symbol is dropped.
pub fn from_bits(bits: &[u8], width: SymbolWidth) -> Vec<u8> {
    bits.chunks_exact(width.bits())
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | (bit & 0x01)))
        .collect()
}

/// Carrier geometry the framer has to fit into.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Budget {
    pub slots: usize,
    pub duplicate_count: usize,
    pub width: SymbolWidth,
}

impl Budget {
    pub fn replica_bits(&self) -> usize {
        redundancy::replica_len(self.slots, self.duplicate_count)
    }

    pub fn replica_symbols(&self) -> usize {
        self.replica_bits() / self.width.bits()
    }

    /// Carrier bits consumed by `symbols` framed symbols across all replicas.
    pub fn required_bits(&self, symbols: usize) -> usize {
        symbols * self.width.bits() * self.duplicate_count
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FramingMode {
    /// `"<len>:"` followed by the payload.
    LengthPrefixed,
    /// Payload right-padded with spaces to the configured capacity.
    FixedCapacity,
    /// Payload repeated back to back; the decoder measures the distance
    /// between occurrences of `sentinel` to learn the length.
    MarkerSearch { sentinel: Vec<u8> },
    /// Payload followed by `terminator`; the decoder cuts at its first
    /// occurrence.
    Terminated { terminator: Vec<u8> },
}

impl Default for FramingMode {
    fn default() -> Self {
        FramingMode::LengthPrefixed
    }
}

impl FramingMode {
    pub fn frame(&self, payload: &[u8], capacity_bytes: usize, budget: &Budget) -> Result<Vec<u8>> {
        match self {
            FramingMode::LengthPrefixed => {
                let mut framed = format!("{}:", payload.len()).into_bytes();
                framed.extend_from_slice(payload);
                Ok(framed)
            }
            FramingMode::FixedCapacity => {
                if payload.len() > capacity_bytes {
                    return Err(ChannelError::CapacityExceeded {
                        required_bits: budget.required_bits(payload.len()),
                        available_bits: budget.required_bits(capacity_bytes),
                    });
                }

                let mut framed = payload.to_vec();
                framed.resize(capacity_bytes, PADDING);
                Ok(framed)
            }
            FramingMode::MarkerSearch { sentinel } => {
                let doubled = payload.repeat(2);
                let occurrences = find_all(&doubled, sentinel).len();
                if occurrences != 2 {
                    return Err(ChannelError::AmbiguousSentinel {
                        occurrences: (occurrences + 1) / 2,
                    });
                }

                let symbols = budget.replica_symbols();
                if symbols < 2 * payload.len() {
                    return Err(ChannelError::CapacityExceeded {
                        required_bits: budget.required_bits(2 * payload.len()),
                        available_bits: budget.slots,
                    });
                }

                Ok(payload.iter().cycle().take(symbols).copied().collect())
            }
            FramingMode::Terminated { terminator } => {
                let mut framed = payload.to_vec();
                framed.extend_from_slice(terminator);

                match find_all(&framed, terminator).as_slice() {
                    [only] if *only == payload.len() => Ok(framed),
                    found => Err(ChannelError::AmbiguousSentinel {
                        occurrences: found.len(),
                    }),
                }
            }
        }
    }

    /// Recover the payload from the voted symbol stream of one replica.
    pub fn unframe(&self, symbols: &[u8], capacity_bytes: usize) -> Result<Vec<u8>> {
        match self {
            FramingMode::LengthPrefixed => {
                let scan = &symbols[..symbols.len().min(MAX_PREFIX_DIGITS + 1)];
                let colon = scan.iter().position(|&c| c == b':').ok_or_else(|| {
                    ChannelError::BadLength {
                        prefix: String::from_utf8_lossy(scan).into_owned(),
                    }
                })?;

                let prefix = &symbols[..colon];
                let declared = parse_decimal(prefix).ok_or_else(|| ChannelError::BadLength {
                    prefix: String::from_utf8_lossy(prefix).into_owned(),
                })?;

                let body = &symbols[colon + 1..];
                if declared > body.len() {
                    return Err(ChannelError::LengthOutOfRange {
                        declared,
                        available: body.len(),
                    });
                }

                Ok(body[..declared].to_vec())
            }
            FramingMode::FixedCapacity => {
                if capacity_bytes > symbols.len() {
                    return Err(ChannelError::LengthOutOfRange {
                        declared: capacity_bytes,
                        available: symbols.len(),
                    });
                }
                Ok(symbols[..capacity_bytes].to_vec())
            }
            FramingMode::MarkerSearch { sentinel } => {
                let positions = find_all(symbols, sentinel);
                if positions.len() < 2 {
                    return Err(ChannelError::SentinelNotFound {
                        found: positions.len(),
                    });
                }

                // the smallest gap rejects spans widened by a corrupted sentinel
                let len = positions
                    .windows(2)
                    .map(|pair| pair[1] - pair[0])
                    .min()
                    .unwrap_or(0);

                Ok(symbols[..len].to_vec())
            }
            FramingMode::Terminated { terminator } => {
                match find_all(symbols, terminator).first() {
                    Some(&end) => Ok(symbols[..end].to_vec()),
                    None => Err(ChannelError::SentinelNotFound { found: 0 }),
                }
            }
        }
    }

    /// Whether a single stream carries its own end, so a decoder can stop
    /// reading once [`FramingMode::is_complete`] holds.
    pub fn is_self_delimiting(&self) -> bool {
        matches!(
            self,
            FramingMode::LengthPrefixed | FramingMode::Terminated { .. }
        )
    }

    /// True once `symbols`, a prefix of the recovered stream, decides the
    /// result of [`FramingMode::unframe`]: reading further cannot change it.
    ///
    /// Always false for modes that need the whole stream.
    pub fn is_complete(&self, symbols: &[u8]) -> bool {
        match self {
            FramingMode::LengthPrefixed => {
                let scan = &symbols[..symbols.len().min(MAX_PREFIX_DIGITS + 1)];
                match scan.iter().position(|&c| c == b':') {
                    Some(colon) => match parse_decimal(&symbols[..colon]) {
                        Some(declared) => symbols.len() - colon - 1 >= declared,
                        None => true,
                    },
                    None => symbols.len() > MAX_PREFIX_DIGITS,
                }
            }
            FramingMode::Terminated { terminator } => symbols.ends_with(terminator),
            FramingMode::FixedCapacity | FramingMode::MarkerSearch { .. } => false,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            FramingMode::MarkerSearch { sentinel } if sentinel.is_empty() => Err(
                ChannelError::InvalidConfig("marker search needs a non-empty sentinel".to_string()),
            ),
            FramingMode::Terminated { terminator } if terminator.is_empty() => Err(
                ChannelError::InvalidConfig("terminator must not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Drop the space padding added by [`FramingMode::FixedCapacity`].
///
/// A payload that itself ends in spaces loses them too.
pub fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != PADDING)
        .map_or(0, |last| last + 1);
    &bytes[..end]
}

fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Start offsets of every, possibly overlapping, occurrence of `needle`.
fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }

    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(offset, _)| offset)
        .collect()
}
