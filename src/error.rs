use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChannelError>;

/// Errors raised while embedding into or extracting from a sample grid.
///
/// Encode-side errors are always returned before any sample is touched.
/// Decode-side errors ([`ChannelError::is_no_payload`]) usually mean the image
/// carries no message, or that sender and receiver derived different seeds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("payload needs {required_bits} bits but only {available_bits} are available")]
    CapacityExceeded {
        required_bits: usize,
        available_bits: usize,
    },

    #[error("length prefix {prefix:?} is not a decimal byte count")]
    BadLength { prefix: String },

    #[error("declared payload of {declared} bytes exceeds the {available} recoverable bytes")]
    LengthOutOfRange { declared: usize, available: usize },

    #[error("sentinel not found in the recovered stream ({found} occurrence(s))")]
    SentinelNotFound { found: usize },

    #[error("sentinel must occur exactly once per framed payload, found {occurrences}")]
    AmbiguousSentinel { occurrences: usize },

    #[error("byte {byte:#04x} does not fit in a {width}-bit symbol")]
    SymbolOverflow { byte: u8, width: u32 },

    #[error("invalid channel configuration: {0}")]
    InvalidConfig(String),

    #[error("sample buffer holds {actual} samples, dimensions require {expected}")]
    InvalidGrid { expected: usize, actual: usize },
}

impl ChannelError {
    /// True for decode-time framing failures: nothing recoverable was found.
    pub fn is_no_payload(&self) -> bool {
        matches!(
            self,
            ChannelError::BadLength { .. }
                | ChannelError::LengthOutOfRange { .. }
                | ChannelError::SentinelNotFound { .. }
        )
    }
}
