use crate::log_debug;
use crate::png::chunk::Chunk;
use crate::png::filter::unfilter_scanlines;
use crate::png::header::{ColorType, Header, Palette};
use crate::utils::error::{CanvexResult, CodecError};
use crate::utils::image::{Image, PixelBuffer};
use flate2::read::ZlibDecoder;
use std::fmt::Write as _;
use std::io::Read;

/// Inflates a zlib stream, stopping after `limit` output bytes.
fn inflate(compressed: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut inflated = Vec::new();

    (&mut decoder)
        .take(limit as u64)
        .read_to_end(&mut inflated)
        .map_err(|e| CodecError::InflateFailed(e.to_string()))?;

    Ok(inflated)
}

/// A parsed PNG: header, optional palette and the IDAT chunks in stream order.
///
/// Pixels are only reconstructed on request, so an image with a valid header
/// but no image data is still usable for its metadata.
#[derive(Debug, Clone)]
pub struct PngImage {
    pub(crate) header: Header,
    pub(crate) palette: Option<Palette>,
    pub(crate) data_chunks: Vec<Chunk>,
}

impl PngImage {
    pub fn new(header: Header) -> PngImage {
        PngImage {
            header,
            palette: None,
            data_chunks: Vec::new(),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = Some(palette);
    }

    pub fn data_chunks(&self) -> &[Chunk] {
        &self.data_chunks
    }

    pub fn color_type(&self) -> Result<ColorType, CodecError> {
        self.header.color_type()
    }

    /// All IDAT payloads joined into one zlib stream.
    pub fn compressed_data(&self) -> Vec<u8> {
        let total = self.data_chunks.iter().map(Chunk::length).sum();
        let mut data = Vec::with_capacity(total);

        for chunk in &self.data_chunks {
            data.extend_from_slice(chunk.payload());
        }

        data
    }

    /// Inflates and unfilters the image data.
    ///
    /// The result holds `height` rows of `width * sample_width` bytes, still in
    /// the colour type's own sample layout.
    pub fn raw_samples(&self) -> CanvexResult<Vec<u8>> {
        let color_type = self.header.check_supported()?;

        if self.data_chunks.is_empty() {
            return Err(CodecError::MissingImageData.into());
        }

        let expected = self.header.inflated_len(color_type)?;
        let compressed = self.compressed_data();
        let inflated = inflate(&compressed, expected)?;

        log_debug!("Inflated {} bytes to {}", compressed.len(), inflated.len());

        unfilter_scanlines(
            inflated,
            self.header.row_bytes(color_type)?,
            self.header.height as usize,
            color_type.sample_width(),
        )
    }

    /// Reconstructs the interleaved RGB8/RGBA8 pixel buffer.
    pub fn decode_pixels(&self) -> CanvexResult<PixelBuffer> {
        let samples = self.raw_samples()?;
        let color_type = self.header.check_supported()?;

        color_type.expand(self.header.width, self.header.height, &samples, self.palette.as_ref())
    }

    pub fn info(&self) -> String {
        let mut info = self.header.to_string();

        if let Some(palette) = &self.palette {
            let _ = write!(info, "\n  Palette entries: {}", palette.len());
        }

        let _ = write!(
            info,
            "\n  IDAT chunks: {} ({} bytes)",
            self.data_chunks.len(),
            self.data_chunks.iter().map(Chunk::length).sum::<usize>()
        );

        info
    }
}

impl Image for PngImage {
    fn width(&self) -> u32 {
        self.header.width
    }

    fn height(&self) -> u32 {
        self.header.height
    }

    fn has_alpha(&self) -> bool {
        self.color_type().map(|c| c.has_alpha()).unwrap_or(false)
    }

    fn pixel_buffer(&self) -> CanvexResult<PixelBuffer> {
        self.decode_pixels()
    }

    fn set_pixel_buffer(&mut self, pixels: &PixelBuffer) -> CanvexResult<()> {
        PngImage::set_pixel_buffer(self, pixels)
    }

    fn print_info(&self) -> String {
        self.info()
    }
}
