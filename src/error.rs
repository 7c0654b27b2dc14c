use thiserror::Error;

/// Everything that can stop a decode. No variant is recoverable: the first
/// error aborts the whole call.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("bad magic number: expected {expected:#06x}, found {found:#06x}")]
    BadMagic { expected: u64, found: u64 },

    #[error("unexpected end of data (need {needed} bytes, have {remaining})")]
    OutOfData { needed: usize, remaining: usize },

    #[error("unsupported chunk type {0:#06x}")]
    UnsupportedChunk(u16),

    #[error("unsupported cel type {0}")]
    UnsupportedCelType(u16),

    #[error("invalid color depth {0} (expected 8, 16 or 32)")]
    InvalidColorDepth(u16),

    #[error("cel on layer {layer} in frame {frame} links to frame {target}, which has no usable cel")]
    DanglingCelLink { layer: u16, frame: usize, target: u16 },

    #[error("corrupt compressed data: {0}")]
    CorruptCompressedData(String),

    #[error("string is not valid UTF-8: {0}")]
    InvalidString(#[from] std::str::Utf8Error),

    #[error("declared length {declared} is smaller than its {minimum} byte header")]
    InvalidLength { declared: u64, minimum: usize },

    #[error("palette range {first}..={last} is empty")]
    InvalidPaletteRange { first: u32, last: u32 },

    #[error("palette of {len} entries exceeds the limit of {max}")]
    PaletteTooLarge { len: u64, max: usize },

    #[error("unsupported tile size of {0} bits")]
    UnsupportedBitsPerTile(u16),
}

impl From<parsing::Error> for DecodeError {
    fn from(err: parsing::Error) -> Self {
        match err {
            parsing::Error::OutOfData { needed, remaining } => {
                DecodeError::OutOfData { needed, remaining }
            }
            parsing::Error::BadMagic { expected, found } => {
                DecodeError::BadMagic { expected, found }
            }
            parsing::Error::InvalidUtf8(err) => DecodeError::InvalidString(err),
            // the chunk enum is the only enum in the wire layout
            parsing::Error::UnknownVariant { value } => DecodeError::UnsupportedChunk(value as u16),
            parsing::Error::InvalidLength { declared, minimum } => {
                DecodeError::InvalidLength { declared, minimum }
            }
            parsing::Error::SeekOutOfBounds { offset, len } => DecodeError::OutOfData {
                needed: offset,
                remaining: len,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
