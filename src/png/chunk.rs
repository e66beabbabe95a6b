use crate::png::crc::CrcCalculator;
use crate::utils::bytereader::ByteReader;
use crate::utils::error::{CanvexError, CanvexResult, FormatError};
use std::fmt::{self, Debug, Formatter};
use std::io::{Read, Write};
use std::sync::Arc;

pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const IHDR: u32 = u32::from_be_bytes(*b"IHDR");
const PLTE: u32 = u32::from_be_bytes(*b"PLTE");
const IDAT: u32 = u32::from_be_bytes(*b"IDAT");
const IEND: u32 = u32::from_be_bytes(*b"IEND");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    Header,
    Palette,
    ImageData,
    End,
    Unknown([u8; 4]),
}

impl ChunkType {
    pub fn from_tag(tag: [u8; 4]) -> ChunkType {
        match u32::from_be_bytes(tag) {
            IHDR => ChunkType::Header,
            PLTE => ChunkType::Palette,
            IDAT => ChunkType::ImageData,
            IEND => ChunkType::End,
            _ => ChunkType::Unknown(tag),
        }
    }

    pub fn tag(&self) -> [u8; 4] {
        match self {
            ChunkType::Header => IHDR.to_be_bytes(),
            ChunkType::Palette => PLTE.to_be_bytes(),
            ChunkType::ImageData => IDAT.to_be_bytes(),
            ChunkType::End => IEND.to_be_bytes(),
            ChunkType::Unknown(tag) => *tag,
        }
    }
}

/// A CRC-validated chunk. The payload is immutable and cheap to share.
#[derive(Clone, PartialEq)]
pub struct Chunk {
    chunk_type: ChunkType,
    payload: Arc<[u8]>,
}

impl Chunk {
    pub fn new(chunk_type: ChunkType, payload: Vec<u8>) -> Chunk {
        Chunk {
            chunk_type,
            payload: payload.into(),
        }
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    pub fn length(&self) -> usize {
        self.payload.len()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Writes length, tag, payload and a freshly computed CRC.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> CanvexResult<()> {
        write_chunk(writer, &self.chunk_type.tag(), &self.payload)
    }
}

impl Debug for Chunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("type", &String::from_utf8_lossy(&self.chunk_type.tag()))
            .field("length", &self.payload.len())
            .finish()
    }
}

/// Consumes the 8-byte signature, failing with `BadSignature` on any mismatch
/// (including a stream too short to hold one).
pub fn read_signature<R: Read>(reader: &mut ByteReader<R>) -> CanvexResult<()> {
    let signature = match reader.read_array::<8>() {
        Ok(signature) => signature,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(FormatError::BadSignature.into());
        }
        Err(e) => return Err(CanvexError::IoError(e)),
    };

    if signature != PNG_SIGNATURE {
        return Err(FormatError::BadSignature.into());
    }

    Ok(())
}

/// Reads the next chunk, or `None` if the stream ends cleanly on a chunk boundary.
pub fn read_chunk<R: Read>(reader: &mut ByteReader<R>) -> CanvexResult<Option<Chunk>> {
    let length = match reader.try_read_u32()? {
        Some(length) => length,
        None => return Ok(None),
    };

    let tag = reader.read_array::<4>()?;
    let payload = reader.read_bytes(length as usize)?;
    let expected = reader.read_u32()?;
    let calculated = CrcCalculator::chunk_crc(&tag, &payload);

    if calculated != expected {
        return Err(FormatError::CrcMismatch {
            chunk: String::from_utf8_lossy(&tag).to_string(),
            expected,
            calculated,
        }
        .into());
    }

    Ok(Some(Chunk::new(ChunkType::from_tag(tag), payload)))
}

pub fn write_signature<W: Write>(writer: &mut W) -> CanvexResult<()> {
    writer.write_all(&PNG_SIGNATURE)?;

    Ok(())
}

pub fn write_chunk<W: Write>(writer: &mut W, tag: &[u8; 4], payload: &[u8]) -> CanvexResult<()> {
    writer.write_all(&(payload.len() as u32).to_be_bytes())?;
    writer.write_all(tag)?;
    writer.write_all(payload)?;
    writer.write_all(&CrcCalculator::chunk_crc(tag, payload).to_be_bytes())?;

    Ok(())
}
