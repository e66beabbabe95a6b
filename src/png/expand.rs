use crate::log_warn;
use crate::png::header::{ColorType, Palette};
use crate::utils::error::{CanvexResult, CodecError};
use crate::utils::image::{buffer_len, PixelBuffer, PixelFormat};
use crate::utils::traits::SafeAccess;
use std::collections::HashMap;

fn luma(rgb: &[u8]) -> u8 {
    (0.299 * rgb[0] as f64 + 0.587 * rgb[1] as f64 + 0.114 * rgb[2] as f64)
        .round()
        .clamp(0.0, 255.0) as u8
}

fn expand_grayscale(samples: &[u8]) -> Vec<u8> {
    samples.iter().flat_map(|&v| [v, v, v]).collect()
}

fn expand_grayscale_alpha(samples: &[u8]) -> Vec<u8> {
    samples.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect()
}

fn expand_indexed(samples: &[u8], palette: &Palette) -> Vec<u8> {
    let mut out_of_range = 0usize;

    let pixels = samples
        .iter()
        .flat_map(|&index| {
            palette.get(index).unwrap_or_else(|| {
                out_of_range += 1;
                [0, 0, 0]
            })
        })
        .collect();

    if out_of_range > 0 {
        log_warn!(
            "{} palette indices out of range (palette has {} entries), using black",
            out_of_range,
            palette.len()
        );
    }

    pixels
}

impl ColorType {
    pub fn pixel_format(&self) -> PixelFormat {
        if self.has_alpha() {
            PixelFormat::RGBA8
        } else {
            PixelFormat::RGB8
        }
    }

    /// Expands raw 8-bit samples into interleaved RGB8, or RGBA8 for types
    /// that carry alpha. Indexed samples are resolved through `palette`.
    pub fn expand(
        &self,
        width: u32,
        height: u32,
        samples: &[u8],
        palette: Option<&Palette>,
    ) -> CanvexResult<PixelBuffer> {
        let expected = buffer_len(width, height, self.sample_width())?;
        let samples = samples.get_range_safe(0..expected).map_err(|_| CodecError::BufferSizeMismatch {
            expected,
            actual: samples.len(),
        })?;

        let data = match self {
            ColorType::Grayscale => expand_grayscale(samples),
            ColorType::RGB | ColorType::RGBA => samples.to_vec(),
            ColorType::GrayscaleAlpha => expand_grayscale_alpha(samples),
            ColorType::Indexed => expand_indexed(samples, palette.ok_or(CodecError::MissingPalette)?),
        };

        PixelBuffer::new(width, height, self.pixel_format(), data)
    }

    /// Inverse of [`expand`](Self::expand): converts pixels back into raw
    /// samples of this colour type.
    ///
    /// Greyscale types take the Rec.601 luma of each pixel, missing alpha is
    /// written as opaque, and indexed output requires every colour to be
    /// present in `palette`.
    pub fn collapse(&self, pixels: &PixelBuffer, palette: Option<&Palette>) -> CanvexResult<Vec<u8>> {
        let channels = pixels.format().channels();
        let has_alpha = pixels.has_alpha();
        let capacity = buffer_len(pixels.width(), pixels.height(), self.sample_width())?;
        let mut samples = Vec::with_capacity(capacity);

        match self {
            ColorType::Grayscale => {
                samples.extend(pixels.as_bytes().chunks_exact(channels).map(luma));
            }
            ColorType::GrayscaleAlpha => {
                for p in pixels.as_bytes().chunks_exact(channels) {
                    samples.push(luma(p));
                    samples.push(if has_alpha { p[3] } else { 255 });
                }
            }
            ColorType::RGB => {
                for p in pixels.as_bytes().chunks_exact(channels) {
                    samples.extend_from_slice(&p[..3]);
                }
            }
            ColorType::RGBA => {
                for p in pixels.as_bytes().chunks_exact(channels) {
                    samples.extend_from_slice(&p[..3]);
                    samples.push(if has_alpha { p[3] } else { 255 });
                }
            }
            ColorType::Indexed => {
                let palette = palette.ok_or(CodecError::MissingPalette)?;
                let mut lookup = HashMap::with_capacity(palette.len());

                // First entry wins when a palette repeats a colour.
                for (index, rgb) in palette.entries().iter().enumerate().take(256) {
                    lookup.entry(*rgb).or_insert(index as u8);
                }

                for p in pixels.as_bytes().chunks_exact(channels) {
                    let rgb = [p[0], p[1], p[2]];
                    let index = lookup.get(&rgb).ok_or(CodecError::ColorNotInPalette(rgb))?;
                    samples.push(*index);
                }
            }
        }

        Ok(samples)
    }
}
