mod canny;
mod matrix;
mod png;
mod utils;

pub use canny::{
    detect_edges, detect_edges_in, double_threshold, gaussian_kernel, hysteresis, non_max_suppression, sobel,
    CannyConfig,
};
pub use matrix::{Element, Matrix};
pub use png::chunk::{read_chunk, read_signature, write_chunk, write_signature, Chunk, ChunkType, PNG_SIGNATURE};
pub use png::crc::CrcCalculator;
pub use png::filter::{filter_scanlines_none, paeth_predictor, unfilter_scanlines, FilterType};
pub use png::{ColorType, Header, Palette, PngDecoder, PngImage};
pub use utils::bytereader::ByteReader;
pub use utils::error::{CanvexError, CanvexResult, CodecError, ConfigError, FormatError};
pub use utils::image::{Image, PixelBuffer, PixelFormat};
pub use utils::logger::Logger;
pub use utils::writer::Writer;

use std::path::Path;

/// Opens and parses a PNG file. Pixels are decoded lazily through [`Image::pixel_buffer`].
pub fn decode_png<P: AsRef<Path>>(path: P) -> CanvexResult<PngImage> {
    PngDecoder::open(path)?.decode()
}
