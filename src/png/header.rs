use crate::log_warn;
use crate::utils::error::{CanvexResult, CodecError, FormatError};
use std::fmt::{self, Display, Formatter};

pub const HEADER_LENGTH: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Grayscale = 0,
    RGB = 2,
    Indexed = 3,
    GrayscaleAlpha = 4,
    RGBA = 6,
}

impl ColorType {
    pub fn from_u8(value: u8) -> Option<ColorType> {
        match value {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::RGB),
            3 => Some(ColorType::Indexed),
            4 => Some(ColorType::GrayscaleAlpha),
            6 => Some(ColorType::RGBA),
            _ => None,
        }
    }

    /// Bytes per pixel in the raw scanline (8-bit samples only).
    pub fn sample_width(&self) -> usize {
        match self {
            ColorType::Grayscale | ColorType::Indexed => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::RGB => 3,
            ColorType::RGBA => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorType::GrayscaleAlpha | ColorType::RGBA)
    }
}

/// Decoded view of the 13-byte IHDR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

impl Header {
    /// Non-interlaced 8-bit header with deflate compression.
    pub fn new(width: u32, height: u32, color_type: ColorType) -> Header {
        Header {
            width,
            height,
            bit_depth: 8,
            color_type: color_type as u8,
            compression_method: 0,
            filter_method: 0,
            interlace_method: 0,
        }
    }

    pub fn parse(payload: &[u8]) -> CanvexResult<Header> {
        if payload.len() != HEADER_LENGTH {
            return Err(FormatError::BadHeaderLength(payload.len() as u32).into());
        }

        let width = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let height = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);

        if width == 0 || height == 0 {
            return Err(FormatError::InvalidDimensions { width, height }.into());
        }

        Ok(Header {
            width,
            height,
            bit_depth: payload[8],
            color_type: payload[9],
            compression_method: payload[10],
            filter_method: payload[11],
            interlace_method: payload[12],
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LENGTH] {
        let mut bytes = [0u8; HEADER_LENGTH];
        bytes[0..4].copy_from_slice(&self.width.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.height.to_be_bytes());
        bytes[8] = self.bit_depth;
        bytes[9] = self.color_type;
        bytes[10] = self.compression_method;
        bytes[11] = self.filter_method;
        bytes[12] = self.interlace_method;

        bytes
    }

    pub fn color_type(&self) -> Result<ColorType, CodecError> {
        ColorType::from_u8(self.color_type).ok_or(CodecError::UnsupportedColorType(self.color_type))
    }

    /// Checks the fields the scanline path depends on: known colour type,
    /// 8-bit samples, no interlacing.
    pub fn check_supported(&self) -> Result<ColorType, CodecError> {
        let color_type = self.color_type()?;

        if self.bit_depth != 8 {
            return Err(CodecError::UnsupportedBitDepth(self.bit_depth));
        }

        if self.interlace_method != 0 {
            return Err(CodecError::UnsupportedInterlace(self.interlace_method));
        }

        Ok(color_type)
    }

    fn too_large(&self) -> FormatError {
        FormatError::InvalidDimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Length of one unfiltered row, without the filter-type byte.
    pub fn row_bytes(&self, color_type: ColorType) -> Result<usize, FormatError> {
        (self.width as usize)
            .checked_mul(color_type.sample_width())
            .ok_or_else(|| self.too_large())
    }

    /// Size of the unfiltered sample grid, `height` rows of [`row_bytes`](Self::row_bytes).
    pub fn samples_len(&self, color_type: ColorType) -> Result<usize, FormatError> {
        self.row_bytes(color_type)?
            .checked_mul(self.height as usize)
            .ok_or_else(|| self.too_large())
    }

    /// Size of the inflated IDAT stream: every row plus its filter-type byte.
    pub fn inflated_len(&self, color_type: ColorType) -> Result<usize, FormatError> {
        self.row_bytes(color_type)?
            .checked_add(1)
            .and_then(|stride| stride.checked_mul(self.height as usize))
            .ok_or_else(|| self.too_large())
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Image info:")?;
        writeln!(f, "  Image width: {}", self.width)?;
        writeln!(f, "  Image height: {}", self.height)?;
        writeln!(f, "  Bit depth: {}", self.bit_depth)?;
        writeln!(f, "  Colour type: {}", self.color_type)?;
        writeln!(f, "  Compression method: {}", self.compression_method)?;
        writeln!(f, "  Filter method: {}", self.filter_method)?;
        write!(f, "  Interlace method: {}", self.interlace_method)
    }
}

/// RGB entries from a PLTE chunk, indexed by raw sample value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
}

impl Palette {
    pub fn new(entries: Vec<[u8; 3]>) -> Palette {
        Palette { entries }
    }

    pub fn parse(payload: &[u8]) -> Palette {
        if payload.len() % 3 != 0 {
            log_warn!("PLTE chunk length {} is not a multiple of 3", payload.len());
        }

        Palette {
            entries: payload.chunks_exact(3).map(|rgb| [rgb[0], rgb[1], rgb[2]]).collect(),
        }
    }

    pub fn get(&self, index: u8) -> Option<[u8; 3]> {
        self.entries.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanvexError;

    #[test]
    fn parses_and_serializes_header() -> CanvexResult<()> {
        let header = Header::new(640, 480, ColorType::RGBA);
        let parsed = Header::parse(&header.to_bytes())?;

        assert_eq!(parsed, header);
        assert_eq!(parsed.color_type()?, ColorType::RGBA);
        assert_eq!(parsed.row_bytes(ColorType::RGBA)?, 2560);
        assert_eq!(parsed.samples_len(ColorType::RGBA)?, 2560 * 480);
        assert_eq!(parsed.inflated_len(ColorType::RGBA)?, 2561 * 480);

        Ok(())
    }

    #[test]
    fn rejects_wrong_length_and_zero_size() {
        assert!(matches!(
            Header::parse(&[0u8; 12]),
            Err(CanvexError::Format(FormatError::BadHeaderLength(12)))
        ));

        let mut bytes = Header::new(1, 1, ColorType::Grayscale).to_bytes();
        bytes[3] = 0;
        assert!(matches!(
            Header::parse(&bytes),
            Err(CanvexError::Format(FormatError::InvalidDimensions { width: 0, height: 1 }))
        ));
    }

    #[test]
    fn unsupported_fields_are_codec_errors() {
        let mut header = Header::new(1, 1, ColorType::Grayscale);
        header.bit_depth = 16;
        assert_eq!(header.check_supported(), Err(CodecError::UnsupportedBitDepth(16)));

        header.bit_depth = 8;
        header.interlace_method = 1;
        assert_eq!(header.check_supported(), Err(CodecError::UnsupportedInterlace(1)));

        header.color_type = 5;
        assert_eq!(header.check_supported(), Err(CodecError::UnsupportedColorType(5)));
    }

    #[test]
    fn oversized_dimensions_do_not_overflow() {
        let header = Header::new(u32::MAX, u32::MAX, ColorType::RGBA);

        assert_eq!(
            header.inflated_len(ColorType::RGBA),
            Err(FormatError::InvalidDimensions {
                width: u32::MAX,
                height: u32::MAX
            })
        );
        assert!(header.samples_len(ColorType::RGBA).is_err());
    }

    #[test]
    fn palette_ignores_trailing_bytes() {
        let palette = Palette::parse(&[1, 2, 3, 4, 5, 6, 7]);

        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(1), Some([4, 5, 6]));
        assert_eq!(palette.get(2), None);
    }
}
