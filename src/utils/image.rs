use crate::matrix::Matrix;
use crate::utils::error::{CanvexResult, CodecError, FormatError};

fn drop_transparency_channel(pixels: &[u8]) -> Vec<u8> {
    pixels.chunks_exact(4).flat_map(|chunk| [chunk[0], chunk[1], chunk[2]]).collect()
}

/// Capability set a decoded image exposes to callers that only need pixels.
pub trait Image {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn has_alpha(&self) -> bool;

    /// Decodes and returns the full pixel buffer.
    fn pixel_buffer(&self) -> CanvexResult<PixelBuffer>;

    /// Replaces the image content with `pixels`, which must match the image size.
    fn set_pixel_buffer(&mut self, pixels: &PixelBuffer) -> CanvexResult<()>;

    fn print_info(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGB8,
    RGBA8,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::RGB8 => 3,
            PixelFormat::RGBA8 => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        *self == PixelFormat::RGBA8
    }
}

/// Byte length of a `width` x `height` grid with `channels` bytes per cell.
pub fn buffer_len(width: u32, height: u32, channels: usize) -> Result<usize, FormatError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|cells| cells.checked_mul(channels))
        .ok_or(FormatError::InvalidDimensions { width, height })
}

/// Owned, interleaved 8-bit pixel data.
///
/// Row stride is `width * channels`; every accessor checks bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> CanvexResult<PixelBuffer> {
        let expected = buffer_len(width, height, format.channels())?;

        if data.len() != expected {
            return Err(CodecError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            }
            .into());
        }

        Ok(PixelBuffer {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn has_alpha(&self) -> bool {
        self.format.has_alpha()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.format.channels()
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }

        Some(y as usize * self.stride() + x as usize * self.format.channels())
    }

    /// Returns the channels of the pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        let start = self.offset(x, y)?;
        self.data.get(start..start + self.format.channels())
    }

    /// Overwrites the pixel at `(x, y)`. Returns `false` when out of bounds or
    /// when `value` has the wrong channel count.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: &[u8]) -> bool {
        let channels = self.format.channels();

        match self.offset(x, y) {
            Some(start) if value.len() == channels => {
                self.data[start..start + channels].copy_from_slice(value);
                true
            }
            _ => false,
        }
    }

    /// Converts the buffer to RGB8, dropping alpha if present.
    pub fn into_rgb8(self) -> PixelBuffer {
        match self.format {
            PixelFormat::RGB8 => self,
            PixelFormat::RGBA8 => PixelBuffer {
                width: self.width,
                height: self.height,
                format: PixelFormat::RGB8,
                data: drop_transparency_channel(&self.data),
            },
        }
    }

    /// Rec.601 luma of every pixel as a `width x height` matrix. Alpha is ignored.
    pub fn to_luminance_matrix(&self) -> CanvexResult<Matrix<f64>> {
        let channels = self.format.channels();
        let values = self
            .data
            .chunks_exact(channels)
            .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
            .collect();

        Matrix::from_vec(self.width as usize, self.height as usize, values)
    }
}
