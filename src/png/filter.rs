use crate::log_warn;
use crate::utils::error::{CanvexResult, CodecError};
use crate::utils::traits::SafeAccess;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    /// Unknown filter bytes fall back to `None` with a warning.
    pub fn from_u8(value: u8) -> FilterType {
        match value {
            0 => FilterType::None,
            1 => FilterType::Sub,
            2 => FilterType::Up,
            3 => FilterType::Average,
            4 => FilterType::Paeth,
            _ => {
                log_warn!("Invalid filter type: {}", value);
                FilterType::None
            }
        }
    }
}

pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    // a = left, b = above, c = upper left
    let a = a as i16;
    let b = b as i16;
    let c = c as i16;

    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

fn unfilter_row(filter_type: FilterType, row: &mut [u8], prior: &[u8], bpp: usize) {
    match filter_type {
        FilterType::None => {}
        FilterType::Sub => {
            for i in bpp..row.len() {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        FilterType::Up => {
            for (value, &above) in row.iter_mut().zip(prior) {
                *value = value.wrapping_add(above);
            }
        }
        FilterType::Average => {
            for i in 0..row.len() {
                let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                let above = prior[i] as u16;
                row[i] = row[i].wrapping_add(((left + above) / 2) as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..row.len() {
                let (left, upper_left) = if i >= bpp { (row[i - bpp], prior[i - bpp]) } else { (0, 0) };
                row[i] = row[i].wrapping_add(paeth_predictor(left, prior[i], upper_left));
            }
        }
    }
}

/// Reverses per-row filtering on inflated IDAT data.
///
/// `data` holds `height` rows of `1 + row_bytes` bytes, each led by its filter
/// type. Rows are reconstructed in place, top to bottom, and the filter bytes
/// are stripped from the result. Bytes past the last row are ignored.
pub fn unfilter_scanlines(mut data: Vec<u8>, row_bytes: usize, height: usize, bpp: usize) -> CanvexResult<Vec<u8>> {
    let stride = row_bytes.saturating_add(1);
    // Saturates on overflow, which no real buffer can satisfy.
    let expected = stride.saturating_mul(height);

    if data.len() < expected {
        return Err(CodecError::ScanlinesTruncated {
            expected,
            actual: data.len(),
        }
        .into());
    }

    data.truncate(expected);
    let zero_row = vec![0u8; row_bytes];

    for y in 0..height {
        let start = y * stride;
        let filter_type = FilterType::from_u8(*data.get_safe(start)?);

        let (before, current) = data.split_at_mut(start);
        let row = &mut current[1..stride];
        let prior = if y == 0 {
            &zero_row[..]
        } else {
            before.get_range_safe(start - row_bytes..start)?
        };

        unfilter_row(filter_type, row, prior, bpp);
    }

    let mut samples = Vec::with_capacity(row_bytes * height);
    for scanline in data.chunks_exact(stride) {
        samples.extend_from_slice(&scanline[1..]);
    }

    Ok(samples)
}

/// Prefixes every row with filter type `None`.
pub fn filter_scanlines_none(samples: &[u8], row_bytes: usize) -> Vec<u8> {
    if row_bytes == 0 {
        return Vec::new();
    }

    let mut filtered = Vec::with_capacity(samples.len() + samples.len() / row_bytes);
    for row in samples.chunks(row_bytes) {
        filtered.push(FilterType::None as u8);
        filtered.extend_from_slice(row);
    }

    filtered
}
