const CRC_POLYNOMIAL: u32 = 0xedb8_8320;

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;

    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;

        while k < 8 {
            if c & 1 == 1 {
                c = CRC_POLYNOMIAL ^ (c >> 1);
            } else {
                c >>= 1;
            }
            k += 1;
        }

        table[n] = c;
        n += 1;
    }

    table
}

static CRC_TABLE: [u32; 256] = make_table();

/// Running CRC-32 as used by PNG chunk trailers.
#[derive(Debug, Clone, Copy)]
pub struct CrcCalculator {
    state: u32,
}

impl Default for CrcCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl CrcCalculator {
    pub fn new() -> Self {
        Self { state: 0xffff_ffff }
    }

    pub fn update(&mut self, buf: &[u8]) -> &mut Self {
        let mut c = self.state;
        for &b in buf {
            c = CRC_TABLE[((c ^ u32::from(b)) & 0xff) as usize] ^ (c >> 8);
        }
        self.state = c;

        self
    }

    pub fn finish(&self) -> u32 {
        self.state ^ 0xffff_ffff
    }

    /// CRC over a single contiguous range.
    pub fn calculate_crc(data: &[u8]) -> u32 {
        Self::new().update(data).finish()
    }

    /// CRC over `chunk_type ∥ payload`, the range a chunk trailer protects.
    pub fn chunk_crc(chunk_type: &[u8; 4], payload: &[u8]) -> u32 {
        Self::new().update(chunk_type).update(payload).finish()
    }
}
