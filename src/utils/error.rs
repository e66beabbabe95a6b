use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;

/// Problems with the container itself. Always fatal, no image is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    BadSignature,
    CrcMismatch {
        chunk: String,
        expected: u32,
        calculated: u32,
    },
    BadHeaderLength(u32),
    InvalidDimensions { width: u32, height: u32 },
    MissingHeader,
    Truncated,
}

/// Failures while turning sample data into pixels or back.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    InflateFailed(String),
    DeflateFailed(String),
    UnsupportedColorType(u8),
    UnsupportedBitDepth(u8),
    UnsupportedInterlace(u8),
    MissingPalette,
    MissingImageData,
    ScanlinesTruncated { expected: usize, actual: usize },
    BufferSizeMismatch { expected: usize, actual: usize },
    ColorNotInPalette([u8; 3]),
}

/// Rejected parameters, reported before any computation starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EvenKernelSize(usize),
    NonSquareKernel { width: usize, height: usize },
    InvalidSigma(f64),
    InvalidRatio(f64),
    LengthMismatch { expected: usize, actual: usize },
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
}

#[derive(Debug)]
pub enum CanvexError {
    IoError(io::Error),
    Format(FormatError),
    Codec(CodecError),
    Config(ConfigError),
}

impl Error for CanvexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CanvexError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::BadSignature => write!(f, "PNG signature check failed"),
            FormatError::CrcMismatch {
                chunk,
                expected,
                calculated,
            } => write!(
                f,
                "CRC mismatch for chunk {}: expected 0x{:08x}, calculated 0x{:08x}",
                chunk, expected, calculated
            ),
            FormatError::BadHeaderLength(length) => {
                write!(f, "Length of header chunk is {}, expected 13", length)
            }
            FormatError::InvalidDimensions { width, height } => {
                write!(f, "Invalid image dimensions: {}x{}", width, height)
            }
            FormatError::MissingHeader => write!(f, "No IHDR chunk found"),
            FormatError::Truncated => write!(f, "Stream ended in the middle of a chunk"),
        }
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InflateFailed(msg) => write!(f, "Inflate failed: {}", msg),
            CodecError::DeflateFailed(msg) => write!(f, "Deflate failed: {}", msg),
            CodecError::UnsupportedColorType(color_type) => {
                write!(f, "Unsupported color type: {}", color_type)
            }
            CodecError::UnsupportedBitDepth(depth) => write!(f, "Unsupported bit depth: {}", depth),
            CodecError::UnsupportedInterlace(method) => {
                write!(f, "Unsupported interlace method: {}", method)
            }
            CodecError::MissingPalette => write!(f, "Indexed image has no PLTE chunk"),
            CodecError::MissingImageData => write!(f, "Image has no IDAT chunks"),
            CodecError::ScanlinesTruncated { expected, actual } => write!(
                f,
                "Inflated data too short: expected {} bytes, got {}",
                expected, actual
            ),
            CodecError::BufferSizeMismatch { expected, actual } => write!(
                f,
                "Pixel buffer size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            CodecError::ColorNotInPalette([r, g, b]) => {
                write!(f, "Color ({}, {}, {}) is not in the palette", r, g, b)
            }
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EvenKernelSize(size) => {
                write!(f, "Kernel size must be odd and non-zero, got {}", size)
            }
            ConfigError::NonSquareKernel { width, height } => {
                write!(f, "Kernel must be square, got {}x{}", width, height)
            }
            ConfigError::InvalidSigma(sigma) => write!(f, "Sigma must be positive, got {}", sigma),
            ConfigError::InvalidRatio(ratio) => {
                write!(f, "Threshold ratio must be in (0, 1], got {}", ratio)
            }
            ConfigError::LengthMismatch { expected, actual } => {
                write!(f, "Matrix needs {} cells, got {}", expected, actual)
            }
            ConfigError::ShapeMismatch { left, right } => write!(
                f,
                "Matrix shapes differ: {}x{} vs {}x{}",
                left.0, left.1, right.0, right.1
            ),
        }
    }
}

impl Display for CanvexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CanvexError::IoError(err) => write!(f, "I/O error: {}", err),
            CanvexError::Format(err) => write!(f, "Format error: {}", err),
            CanvexError::Codec(err) => write!(f, "Codec error: {}", err),
            CanvexError::Config(err) => write!(f, "Config error: {}", err),
        }
    }
}

impl From<io::Error> for CanvexError {
    fn from(error: io::Error) -> Self {
        // A short read while inside a chunk means the container is cut off
        if error.kind() == io::ErrorKind::UnexpectedEof {
            return CanvexError::Format(FormatError::Truncated);
        }

        CanvexError::IoError(error)
    }
}

impl From<FormatError> for CanvexError {
    fn from(error: FormatError) -> Self {
        CanvexError::Format(error)
    }
}

impl From<CodecError> for CanvexError {
    fn from(error: CodecError) -> Self {
        CanvexError::Codec(error)
    }
}

impl From<ConfigError> for CanvexError {
    fn from(error: ConfigError) -> Self {
        CanvexError::Config(error)
    }
}

// Result type alias for Canvex operations
pub type CanvexResult<T> = Result<T, CanvexError>;
