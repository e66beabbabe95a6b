use std::io::{ErrorKind, Read};

/// Big-endian primitive reads over a byte stream.
#[derive(Debug)]
pub struct ByteReader<R: Read> {
    reader: R,
    position: u64,
}

impl<R: Read> ByteReader<R> {
    pub fn new(reader: R) -> Self {
        ByteReader { reader, position: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads a single byte.
    ///
    /// # Returns
    /// - The byte read
    /// - `std::io::Error` if an I/O error occurs
    pub fn read_u8(&mut self) -> Result<u8, std::io::Error> {
        let mut byte = [0u8; 1];
        self.reader.read_exact(&mut byte)?;
        self.position += 1;

        Ok(byte[0])
    }

    /// Reads a big-endian 32-bit value.
    ///
    /// # Returns
    /// - The 32-bit value read
    /// - `std::io::Error` if an I/O error occurs
    pub fn read_u32(&mut self) -> Result<u32, std::io::Error> {
        let mut bytes = [0u8; 4];
        self.reader.read_exact(&mut bytes)?;
        self.position += 4;

        Ok(u32::from_be_bytes(bytes))
    }

    /// Like [`read_u32`](Self::read_u32), but returns `Ok(None)` when the stream
    /// is already exhausted before the first byte.
    ///
    /// A stream that ends after one to three bytes is still an `UnexpectedEof` error.
    pub fn try_read_u32(&mut self) -> Result<Option<u32>, std::io::Error> {
        let mut bytes = [0u8; 4];
        let mut filled = 0;

        while filled < bytes.len() {
            match self.reader.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        self.position += filled as u64;

        match filled {
            0 => Ok(None),
            4 => Ok(Some(u32::from_be_bytes(bytes))),
            _ => Err(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("Expected 4 bytes, stream ended after {}", filled),
            )),
        }
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], std::io::Error> {
        let mut bytes = [0u8; N];
        self.reader.read_exact(&mut bytes)?;
        self.position += N as u64;

        Ok(bytes)
    }

    /// Reads specified number of bytes from the stream.
    ///
    /// The buffer grows as data actually arrives, so a bogus length field
    /// cannot force a huge allocation up front.
    ///
    /// # Parameters
    /// - `n`: The number of bytes to read
    ///
    /// # Returns
    /// - A vector of exactly `n` bytes
    /// - `std::io::Error` with `UnexpectedEof` if the stream is shorter
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, std::io::Error> {
        let mut bytes = Vec::new();
        let read = (&mut self.reader).take(n as u64).read_to_end(&mut bytes)?;
        self.position += read as u64;

        if read < n {
            return Err(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("Expected {} bytes, got {}", n, read),
            ));
        }

        Ok(bytes)
    }
}
