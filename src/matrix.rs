use crate::utils::error::{CanvexResult, ConfigError};
use std::fmt::{self, Debug, Display, Formatter};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

const NORMALIZED_EPSILON: f64 = 1e-9;

/// Numeric cell type of a [`Matrix`]. All arithmetic is carried out in `f64`.
pub trait Element: Copy + Default + PartialOrd + Debug + Send + Sync {
    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_element!(f64, f32, i32, i16, u8);

/// Maps an out-of-range index back inside `[0, len)` by half-sample reflection
/// (`-1 -> 0`, `len -> len - 1`), clamping whatever is still outside.
fn reflect_index(index: isize, len: usize) -> usize {
    let len = len as isize;
    let mut index = index;

    if index < 0 {
        index = -index - 1;
    }

    if index >= len {
        index = 2 * len - index - 1;
    }

    index.clamp(0, len - 1) as usize
}

/// Dense row-major `width x height` grid.
///
/// Every transformation returns a new matrix; inputs are never modified.
#[derive(Clone, PartialEq)]
pub struct Matrix<T: Element> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Zero-filled matrix.
    pub fn new(width: usize, height: usize) -> Matrix<T> {
        Matrix {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> CanvexResult<Matrix<T>> {
        if data.len() != width * height {
            return Err(ConfigError::LengthMismatch {
                expected: width * height,
                actual: data.len(),
            }
            .into());
        }

        Ok(Matrix { width, height, data })
    }

    /// Builds a matrix from nested rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<T>]) -> CanvexResult<Matrix<T>> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());

        if let Some(row) = rows.iter().find(|row| row.len() != width) {
            return Err(ConfigError::ShapeMismatch {
                left: (width, height),
                right: (row.len(), height),
            }
            .into());
        }

        Ok(Matrix {
            width,
            height,
            data: rows.concat(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.height || col >= self.width {
            return None;
        }

        self.data.get(row * self.width + col).copied()
    }

    /// Writes one cell, returning `false` when `(row, col)` is outside the matrix.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }

        self.data[row * self.width + col] = value;
        true
    }

    fn map<F: Fn(f64) -> f64>(&self, f: F) -> Matrix<T> {
        Matrix {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|v| T::from_f64(f(v.to_f64()))).collect(),
        }
    }

    fn zip_map<F: Fn(f64, f64) -> f64>(&self, other: &Matrix<T>, f: F) -> CanvexResult<Matrix<T>> {
        if self.shape() != other.shape() {
            return Err(ConfigError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            }
            .into());
        }

        Ok(Matrix {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| T::from_f64(f(a.to_f64(), b.to_f64())))
                .collect(),
        })
    }

    pub fn add(&self, other: &Matrix<T>) -> CanvexResult<Matrix<T>> {
        self.zip_map(other, |a, b| a + b)
    }

    pub fn mult(&self, k: f64) -> Matrix<T> {
        self.map(|v| v * k)
    }

    pub fn div(&self, k: f64) -> Matrix<T> {
        self.map(|v| v / k)
    }

    pub fn power(&self, exponent: i32) -> Matrix<T> {
        self.map(|v| v.powi(exponent))
    }

    pub fn neg(&self) -> Matrix<T> {
        self.map(|v| -v)
    }

    pub fn exp(&self) -> Matrix<T> {
        self.map(f64::exp)
    }

    /// Per-cell Euclidean magnitude `sqrt(self^2 + other^2)`.
    pub fn hypot(&self, other: &Matrix<T>) -> CanvexResult<Matrix<T>> {
        self.zip_map(other, f64::hypot)
    }

    /// Per-cell angle `atan2(self, other)` in radians, with `self` as the y component.
    pub fn arctan2(&self, other: &Matrix<T>) -> CanvexResult<Matrix<T>> {
        self.zip_map(other, f64::atan2)
    }

    pub fn sum(&self) -> T {
        T::from_f64(self.data.iter().map(|v| v.to_f64()).sum())
    }

    /// Largest cell, or the zero value for an empty matrix.
    pub fn max(&self) -> T {
        self.data
            .iter()
            .copied()
            .reduce(|a, b| if b > a { b } else { a })
            .unwrap_or_default()
    }

    /// Correlates the matrix with a square, odd-sided kernel.
    ///
    /// Source reads outside the matrix are reflected back inside. The result is
    /// divided by the kernel sum unless the kernel already sums to 1 (or to 0,
    /// as derivative kernels do).
    ///
    /// Rows are filled in parallel when the `rayon` feature is enabled.
    pub fn convolve(&self, kernel: &Matrix<T>) -> CanvexResult<Matrix<T>> {
        self.convolve_with(kernel, cfg!(feature = "rayon"))
    }

    #[cfg_attr(not(feature = "rayon"), allow(unused_variables))]
    fn convolve_with(&self, kernel: &Matrix<T>, parallel: bool) -> CanvexResult<Matrix<T>> {
        if kernel.width != kernel.height {
            return Err(ConfigError::NonSquareKernel {
                width: kernel.width,
                height: kernel.height,
            }
            .into());
        }

        if kernel.width % 2 == 0 {
            return Err(ConfigError::EvenKernelSize(kernel.width).into());
        }

        let mut result = Matrix::new(self.width, self.height);

        if self.data.is_empty() {
            return Ok(result);
        }

        let kernel_sum = kernel.sum().to_f64();
        let normalizer = if kernel_sum.abs() < NORMALIZED_EPSILON
            || (kernel_sum - 1.0).abs() < NORMALIZED_EPSILON
        {
            1.0
        } else {
            kernel_sum
        };

        let side = kernel.width;
        let offset = (side / 2) as isize;
        let weights: Vec<f64> = kernel.data.iter().map(|v| v.to_f64()).collect();

        let fill_row = |y: usize, out_row: &mut [T]| {
            for (x, cell) in out_row.iter_mut().enumerate() {
                let mut acc = 0.0;

                for ky in 0..side {
                    let sy = reflect_index(y as isize + ky as isize - offset, self.height);
                    let src_row = &self.data[sy * self.width..(sy + 1) * self.width];

                    for kx in 0..side {
                        let sx = reflect_index(x as isize + kx as isize - offset, self.width);
                        acc += weights[ky * side + kx] * src_row[sx].to_f64();
                    }
                }

                *cell = T::from_f64(acc / normalizer);
            }
        };

        #[cfg(feature = "rayon")]
        if parallel {
            result
                .data
                .par_chunks_mut(self.width)
                .enumerate()
                .for_each(|(y, row)| fill_row(y, row));

            return Ok(result);
        }

        result
            .data
            .chunks_mut(self.width)
            .enumerate()
            .for_each(|(y, row)| fill_row(y, row));

        Ok(result)
    }

    /// Clamps every cell into `0..=255` and rounds it to a byte.
    pub fn to_gray8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|v| v.to_f64().round().clamp(0.0, 255.0) as u8)
            .collect()
    }
}

impl<T: Element> Debug for Matrix<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl<T: Element + Display> Display for Matrix<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.width.max(1)) {
            let line: Vec<String> = row.iter().map(|v| format!("{}", v)).collect();
            writeln!(f, "{}", line.join(" "))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanvexError;

    #[test]
    fn reflect_index_mirrors_edges() {
        assert_eq!(reflect_index(-1, 5), 0);
        assert_eq!(reflect_index(-2, 5), 1);
        assert_eq!(reflect_index(5, 5), 4);
        assert_eq!(reflect_index(6, 5), 3);
        assert_eq!(reflect_index(-4, 2), 0);
        assert_eq!(reflect_index(2, 1), 0);
    }

    #[test]
    fn elementwise_ops_keep_shape() -> CanvexResult<()> {
        let m = Matrix::from_rows(&[vec![1.0, -2.0, 3.0], vec![0.0, 4.0, -1.0]])?;

        assert_eq!(m.power(2).as_slice(), &[1.0, 4.0, 9.0, 0.0, 16.0, 1.0]);
        assert_eq!(m.neg().as_slice(), &[-1.0, 2.0, -3.0, 0.0, -4.0, 1.0]);
        assert_eq!(m.mult(2.0).div(4.0).as_slice(), &[0.5, -1.0, 1.5, 0.0, 2.0, -0.5]);
        assert_eq!(m.add(&m)?.as_slice(), &[2.0, -4.0, 6.0, 0.0, 8.0, -2.0]);
        assert_eq!(m.sum(), 5.0);
        assert_eq!(m.max(), 4.0);
        assert_eq!(m.shape(), (3, 2));

        Ok(())
    }

    #[test]
    fn add_rejects_shape_mismatch() -> CanvexResult<()> {
        let a: Matrix<f64> = Matrix::new(2, 2);
        let b: Matrix<f64> = Matrix::new(3, 2);

        assert!(a.add(&b).is_err());
        assert!(a.hypot(&b).is_err());

        Ok(())
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);

        assert!(result.is_err());
    }

    #[test]
    fn from_vec_reports_cell_count() {
        let result = Matrix::from_vec(3, 2, vec![0.0; 5]);

        assert!(matches!(
            result,
            Err(CanvexError::Config(ConfigError::LengthMismatch { expected: 6, actual: 5 }))
        ));
    }

    fn counting() -> Matrix<f64> {
        Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]]).unwrap()
    }

    #[test]
    fn convolve_rejects_bad_kernels() {
        let source = counting();

        assert!(matches!(
            source.convolve(&Matrix::new(3, 1)),
            Err(CanvexError::Config(ConfigError::NonSquareKernel { width: 3, height: 1 }))
        ));
        assert!(matches!(
            source.convolve(&Matrix::new(2, 2)),
            Err(CanvexError::Config(ConfigError::EvenKernelSize(2)))
        ));
    }

    #[test]
    fn convolve_normalizes_by_kernel_sum() -> CanvexResult<()> {
        let flat: Matrix<f64> = Matrix::from_vec(4, 3, vec![7.0; 12])?;
        let ones = Matrix::from_vec(3, 3, vec![1.0; 9])?;

        let result = flat.convolve(&ones)?;
        assert!(result.as_slice().iter().all(|&v| (v - 7.0).abs() < 1e-9));

        // Corner window reads rows 0, 0, 1 and columns 0, 0, 1.
        let blurred = counting().convolve(&ones)?;
        assert!((blurred.get(0, 0).unwrap_or_default() - 21.0 / 9.0).abs() < 1e-9);
        assert!((blurred.get(1, 1).unwrap_or_default() - 5.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn convolve_reflects_at_borders() -> CanvexResult<()> {
        // Sums to zero, so no normalization: out = src(up-left) - src(down-right).
        let diagonal = Matrix::from_rows(&[vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 0.0], vec![0.0, 0.0, -1.0]])?;
        let result = counting().convolve(&diagonal)?;

        assert_eq!(result.get(0, 0), Some(1.0 - 5.0));
        assert_eq!(result.get(1, 1), Some(1.0 - 9.0));
        assert_eq!(result.get(2, 2), Some(5.0 - 9.0));
        assert_eq!(result.get(0, 2), Some(2.0 - 6.0));

        Ok(())
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_convolve_matches_serial() -> CanvexResult<()> {
        let source = Matrix::from_vec(17, 11, (0..187).map(|i| ((i * 31) % 97) as f64).collect())?;
        let kernel = crate::canny::gaussian_kernel(5, 1.4)?;

        assert_eq!(source.convolve_with(&kernel, true)?, source.convolve_with(&kernel, false)?);

        Ok(())
    }
}
