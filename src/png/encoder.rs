use crate::log_debug;
use crate::png::chunk::{write_signature, Chunk, ChunkType};
use crate::png::filter::filter_scanlines_none;
use crate::png::image::PngImage;
use crate::utils::error::{CanvexResult, CodecError};
use crate::utils::image::PixelBuffer;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

fn deflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let capacity = data.len() + data.len() / 5 + 12;
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(capacity), Compression::default());

    encoder
        .write_all(data)
        .map_err(|e| CodecError::DeflateFailed(e.to_string()))?;

    encoder.finish().map_err(|e| CodecError::DeflateFailed(e.to_string()))
}

impl PngImage {
    /// Replaces the image data with `samples` laid out in the header's colour type.
    ///
    /// Rows are written with filter type `None` and compressed into a single
    /// IDAT chunk. On failure the existing chunks are kept.
    pub fn set_raw_samples(&mut self, samples: &[u8]) -> CanvexResult<()> {
        let color_type = self.header.check_supported()?;
        let row_bytes = self.header.row_bytes(color_type)?;
        let expected = self.header.samples_len(color_type)?;

        if samples.len() != expected {
            return Err(CodecError::BufferSizeMismatch {
                expected,
                actual: samples.len(),
            }
            .into());
        }

        let filtered = filter_scanlines_none(samples, row_bytes);
        let compressed = deflate(&filtered)?;

        log_debug!("Deflated {} bytes to {}", filtered.len(), compressed.len());

        self.data_chunks = vec![Chunk::new(ChunkType::ImageData, compressed)];

        Ok(())
    }

    /// Converts `pixels` into the header's colour type and stores them.
    ///
    /// Indexed images map every colour back to its palette entry.
    pub fn set_pixel_buffer(&mut self, pixels: &PixelBuffer) -> CanvexResult<()> {
        if pixels.width() != self.header.width || pixels.height() != self.header.height {
            return Err(CodecError::BufferSizeMismatch {
                expected: (self.header.width as usize).saturating_mul(self.header.height as usize),
                actual: (pixels.width() as usize).saturating_mul(pixels.height() as usize),
            }
            .into());
        }

        let color_type = self.header.check_supported()?;
        let samples = color_type.collapse(pixels, self.palette.as_ref())?;

        self.set_raw_samples(&samples)
    }

    /// Writes the signature, IHDR, PLTE (if any), every IDAT and an empty IEND.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> CanvexResult<()> {
        write_signature(writer)?;
        Chunk::new(ChunkType::Header, self.header.to_bytes().to_vec()).write_to(writer)?;

        if let Some(palette) = &self.palette {
            Chunk::new(ChunkType::Palette, palette.to_bytes()).write_to(writer)?;
        }

        for chunk in &self.data_chunks {
            chunk.write_to(writer)?;
        }

        Chunk::new(ChunkType::End, Vec::new()).write_to(writer)
    }

    pub fn encode(&self) -> CanvexResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::decoder::PngDecoder;
    use crate::png::header::{ColorType, Header, Palette};
    use crate::CanvexError;
    use std::io::Cursor;

    #[test]
    fn encoded_stream_decodes_to_same_samples() -> CanvexResult<()> {
        let mut image = PngImage::new(Header::new(3, 2, ColorType::RGB));
        let samples: Vec<u8> = (0..18).collect();
        image.set_raw_samples(&samples)?;

        let decoded = PngDecoder::new(Cursor::new(image.encode()?)).decode()?;

        assert_eq!(decoded.data_chunks().len(), 1);
        assert_eq!(decoded.raw_samples()?, samples);

        Ok(())
    }

    #[test]
    fn wrong_sample_count_keeps_old_chunks() -> CanvexResult<()> {
        let mut image = PngImage::new(Header::new(2, 2, ColorType::Grayscale));
        image.set_raw_samples(&[1, 2, 3, 4])?;
        let before = image.data_chunks().to_vec();

        assert!(matches!(
            image.set_raw_samples(&[1, 2, 3]),
            Err(CanvexError::Codec(CodecError::BufferSizeMismatch { expected: 4, actual: 3 }))
        ));
        assert_eq!(image.data_chunks(), &before[..]);

        Ok(())
    }

    #[test]
    fn palette_is_written_before_image_data() -> CanvexResult<()> {
        let mut image = PngImage::new(Header::new(2, 1, ColorType::Indexed));
        image.set_palette(Palette::new(vec![[255, 0, 0], [0, 0, 255]]));
        image.set_raw_samples(&[1, 0])?;

        let decoded = PngDecoder::new(Cursor::new(image.encode()?)).decode()?;
        let pixels = decoded.decode_pixels()?;

        assert_eq!(pixels.as_bytes(), &[0, 0, 255, 255, 0, 0]);

        Ok(())
    }
}
