use crate::png::chunk::{read_chunk, read_signature, ChunkType};
use crate::png::header::{Header, Palette};
use crate::png::image::PngImage;
use crate::utils::bytereader::ByteReader;
use crate::utils::error::{CanvexResult, FormatError};
use crate::{log_debug, log_warn};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Reads a PNG chunk stream into a [`PngImage`].
///
/// Only IHDR, PLTE, IDAT and IEND are interpreted; other chunks are skipped
/// after their CRC is checked. Pixels are not reconstructed here.
#[derive(Debug)]
pub struct PngDecoder<R: Read> {
    reader: ByteReader<R>,
}

impl PngDecoder<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> CanvexResult<Self> {
        let file = File::open(path)?;

        Ok(PngDecoder::new(BufReader::new(file)))
    }
}

impl<R: Read> PngDecoder<R> {
    pub fn new(reader: R) -> Self {
        PngDecoder {
            reader: ByteReader::new(reader),
        }
    }

    pub fn decode(&mut self) -> CanvexResult<PngImage> {
        read_signature(&mut self.reader)?;

        let mut header: Option<Header> = None;
        let mut palette: Option<Palette> = None;
        let mut data_chunks = Vec::new();

        while let Some(chunk) = read_chunk(&mut self.reader)? {
            log_debug!("Found chunk {:?} at offset {}", chunk, self.reader.position());

            match chunk.chunk_type() {
                ChunkType::Header => {
                    if header.is_some() {
                        log_warn!("Duplicate IHDR chunk ignored");
                        continue;
                    }

                    header = Some(Header::parse(chunk.payload())?);
                }
                ChunkType::Palette => {
                    if palette.is_some() {
                        log_warn!("Duplicate PLTE chunk ignored");
                        continue;
                    }

                    palette = Some(Palette::parse(chunk.payload()));
                }
                ChunkType::ImageData => data_chunks.push(chunk),
                ChunkType::End => break,
                ChunkType::Unknown(tag) => {
                    log_debug!("Skipping unknown chunk {}", String::from_utf8_lossy(&tag));
                }
            }
        }

        let header = header.ok_or(FormatError::MissingHeader)?;

        Ok(PngImage {
            header,
            palette,
            data_chunks,
        })
    }
}
