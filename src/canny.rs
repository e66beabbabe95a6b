use crate::matrix::Matrix;
use crate::{log_debug, time_block};
use crate::utils::error::{CanvexResult, ConfigError};
use crate::utils::image::PixelBuffer;
use std::f64::consts::PI;

const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: [[f64; 3]; 3] = [[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]];

/// Parameters of the edge detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyConfig {
    /// Side of the Gaussian kernel, odd.
    pub kernel_size: usize,
    pub sigma: f64,
    /// Fraction of the high threshold used as the low threshold.
    pub low_ratio: f64,
    /// Fraction of the strongest gradient used as the high threshold.
    pub high_ratio: f64,
    pub weak_value: f64,
    pub strong_value: f64,
}

impl Default for CannyConfig {
    fn default() -> Self {
        CannyConfig {
            kernel_size: 5,
            sigma: 1.0,
            low_ratio: 0.03,
            high_ratio: 0.12,
            weak_value: 25.0,
            strong_value: 255.0,
        }
    }
}

impl CannyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kernel_size % 2 == 0 {
            return Err(ConfigError::EvenKernelSize(self.kernel_size));
        }

        if !(self.sigma > 0.0) {
            return Err(ConfigError::InvalidSigma(self.sigma));
        }

        for ratio in [self.low_ratio, self.high_ratio] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(ConfigError::InvalidRatio(ratio));
            }
        }

        Ok(())
    }
}

fn kernel_from(rows: &[[f64; 3]; 3]) -> CanvexResult<Matrix<f64>> {
    Matrix::from_vec(3, 3, rows.iter().flatten().copied().collect())
}

/// Normalized `size x size` Gaussian kernel centred on the middle cell.
pub fn gaussian_kernel(size: usize, sigma: f64) -> CanvexResult<Matrix<f64>> {
    if size % 2 == 0 {
        return Err(ConfigError::EvenKernelSize(size).into());
    }

    if !(sigma > 0.0) {
        return Err(ConfigError::InvalidSigma(sigma).into());
    }

    let half = (size / 2) as isize;
    let squared_distance: Vec<f64> = (-half..=half)
        .flat_map(|y| (-half..=half).map(move |x| (x * x + y * y) as f64))
        .collect();

    let two_sigma_sq = 2.0 * sigma * sigma;
    let kernel = Matrix::from_vec(size, size, squared_distance)?
        .neg()
        .div(two_sigma_sq)
        .exp()
        .div(PI * two_sigma_sq);

    let total = kernel.sum();

    Ok(kernel.div(total))
}

/// Gradient magnitude (rescaled to a maximum of 255) and direction in radians.
pub fn sobel(image: &Matrix<f64>) -> CanvexResult<(Matrix<f64>, Matrix<f64>)> {
    let gx = image.convolve(&kernel_from(&SOBEL_X)?)?;
    let gy = image.convolve(&kernel_from(&SOBEL_Y)?)?;

    let magnitude = gx.hypot(&gy)?;
    let max = magnitude.max();
    let magnitude = if max > 0.0 { magnitude.mult(255.0 / max) } else { magnitude };

    let direction = gy.arctan2(&gx)?;

    Ok((magnitude, direction))
}

/// Neighbour offsets `(d_row, d_col)` compared along the gradient at `degrees`.
fn neighbour_offsets(degrees: f64) -> [(isize, isize); 2] {
    if !(22.5..157.5).contains(&degrees) {
        [(0, -1), (0, 1)]
    } else if degrees < 67.5 {
        [(1, -1), (-1, 1)]
    } else if degrees < 112.5 {
        [(-1, 0), (1, 0)]
    } else {
        [(-1, -1), (1, 1)]
    }
}

fn offset_get(matrix: &Matrix<f64>, row: usize, col: usize, (dr, dc): (isize, isize)) -> Option<f64> {
    let r = row.checked_add_signed(dr)?;
    let c = col.checked_add_signed(dc)?;

    matrix.get(r, c)
}

/// Thins ridges to one pixel by keeping only local maxima along the gradient.
///
/// Pixels whose comparison neighbours fall outside the matrix stay 0.
pub fn non_max_suppression(magnitude: &Matrix<f64>, direction: &Matrix<f64>) -> CanvexResult<Matrix<f64>> {
    if magnitude.shape() != direction.shape() {
        return Err(ConfigError::ShapeMismatch {
            left: magnitude.shape(),
            right: direction.shape(),
        }
        .into());
    }

    let (width, height) = magnitude.shape();
    let mut result = Matrix::new(width, height);

    for row in 0..height {
        for col in 0..width {
            let (Some(value), Some(angle)) = (magnitude.get(row, col), direction.get(row, col)) else {
                continue;
            };

            let mut degrees = angle.to_degrees();
            if degrees < 0.0 {
                degrees += 180.0;
            }

            let [first, second] = neighbour_offsets(degrees);
            let (Some(q), Some(r)) = (
                offset_get(magnitude, row, col, first),
                offset_get(magnitude, row, col, second),
            ) else {
                continue;
            };

            if value >= q && value >= r {
                result.set(row, col, value);
            }
        }
    }

    Ok(result)
}

/// Classifies every cell as strong, weak or zero.
///
/// Thresholds are relative to the maximum, so an all-zero matrix is all strong.
pub fn double_threshold(matrix: &Matrix<f64>, config: &CannyConfig) -> Matrix<f64> {
    let high = matrix.max() * config.high_ratio;
    let low = high * config.low_ratio;

    let (width, height) = matrix.shape();
    let mut result = Matrix::new(width, height);

    for row in 0..height {
        for col in 0..width {
            let value = matrix.get(row, col).unwrap_or_default();

            if value >= high {
                result.set(row, col, config.strong_value);
            } else if value >= low {
                result.set(row, col, config.weak_value);
            }
        }
    }

    result
}

/// Promotes weak cells touching a strong cell and drops the remaining weak ones.
///
/// Neighbours are read from the thresholded input, so promotion does not chain
/// within a single pass.
pub fn hysteresis(thresholded: &Matrix<f64>, config: &CannyConfig) -> Matrix<f64> {
    let (width, height) = thresholded.shape();
    let mut result = thresholded.clone();

    for row in 0..height {
        for col in 0..width {
            if thresholded.get(row, col) != Some(config.weak_value) {
                continue;
            }

            let has_strong_neighbour = (-1..=1isize)
                .flat_map(|dr| (-1..=1isize).map(move |dc| (dr, dc)))
                .filter(|&offset| offset != (0, 0))
                .any(|offset| offset_get(thresholded, row, col, offset) == Some(config.strong_value));

            let value = if has_strong_neighbour { config.strong_value } else { 0.0 };
            result.set(row, col, value);
        }
    }

    result
}

/// Runs the five stages over a greyscale intensity matrix.
pub fn detect_edges_in(luma: &Matrix<f64>, config: &CannyConfig) -> CanvexResult<Matrix<f64>> {
    config.validate()?;

    let smoothed = time_block!("gaussian", {
        let kernel = gaussian_kernel(config.kernel_size, config.sigma)?;
        luma.convolve(&kernel)?
    });
    let (magnitude, direction) = time_block!("sobel", { sobel(&smoothed)? });
    let thinned = time_block!("non-max suppression", { non_max_suppression(&magnitude, &direction)? });

    if thinned.max() <= 0.0 {
        log_debug!("No gradient left after suppression, edge map is empty");
        let (width, height) = thinned.shape();
        return Ok(Matrix::new(width, height));
    }

    let thresholded = time_block!("double threshold", { double_threshold(&thinned, config) });

    Ok(time_block!("hysteresis", { hysteresis(&thresholded, config) }))
}

/// Edge map of `pixels`, computed on their Rec.601 luminance.
pub fn detect_edges(pixels: &PixelBuffer, config: &CannyConfig) -> CanvexResult<Matrix<f64>> {
    let luma = pixels.to_luminance_matrix()?;

    detect_edges_in(&luma, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanvexError;

    fn uniform(value: f64) -> Matrix<f64> {
        Matrix::from_vec(3, 3, vec![value; 9]).unwrap()
    }

    #[test]
    fn gaussian_kernel_sums_to_one() -> CanvexResult<()> {
        for (size, sigma) in [(1, 1.0), (3, 0.5), (5, 1.0), (7, 2.5), (9, 10.0)] {
            let kernel = gaussian_kernel(size, sigma)?;

            assert_eq!(kernel.shape(), (size, size));
            assert!((kernel.sum() - 1.0).abs() < 1e-9, "size {} sigma {}", size, sigma);
        }

        Ok(())
    }

    #[test]
    fn gaussian_kernel_peaks_in_centre() -> CanvexResult<()> {
        let kernel = gaussian_kernel(5, 1.0)?;

        assert_eq!(kernel.get(2, 2), Some(kernel.max()));
        assert_eq!(kernel.get(0, 1), kernel.get(1, 0));

        Ok(())
    }

    #[test]
    fn even_kernel_size_is_rejected() {
        assert!(matches!(
            gaussian_kernel(4, 1.0),
            Err(CanvexError::Config(ConfigError::EvenKernelSize(4)))
        ));

        let config = CannyConfig { kernel_size: 6, ..CannyConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::EvenKernelSize(6)));
    }

    #[test]
    fn bad_ratios_and_sigma_are_rejected() {
        let config = CannyConfig { sigma: 0.0, ..CannyConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSigma(0.0)));

        let config = CannyConfig { high_ratio: 1.5, ..CannyConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidRatio(1.5)));
    }

    #[test]
    fn sobel_on_flat_image_is_zero() -> CanvexResult<()> {
        let (magnitude, _) = sobel(&uniform(42.0))?;

        assert!(magnitude.as_slice().iter().all(|&v| v == 0.0));

        Ok(())
    }

    #[test]
    fn sobel_rescales_to_255() -> CanvexResult<()> {
        let image = Matrix::from_rows(&[
            vec![0.0, 0.0, 10.0, 10.0],
            vec![0.0, 0.0, 10.0, 10.0],
            vec![0.0, 0.0, 10.0, 10.0],
        ])?;
        let (magnitude, direction) = sobel(&image)?;

        assert!((magnitude.max() - 255.0).abs() < 1e-9);
        // Horizontal step: gradient points along +x.
        assert_eq!(direction.get(1, 1), Some(0.0));

        Ok(())
    }

    #[test]
    fn non_max_suppression_is_idempotent() -> CanvexResult<()> {
        let image = Matrix::from_rows(&[
            vec![0.0, 10.0, 50.0, 200.0, 90.0, 0.0],
            vec![5.0, 30.0, 120.0, 255.0, 60.0, 10.0],
            vec![0.0, 20.0, 80.0, 210.0, 40.0, 0.0],
            vec![10.0, 0.0, 60.0, 180.0, 100.0, 20.0],
            vec![0.0, 0.0, 30.0, 90.0, 30.0, 0.0],
        ])?;
        let (magnitude, direction) = sobel(&image)?;

        let once = non_max_suppression(&magnitude, &direction)?;
        let twice = non_max_suppression(&once, &direction)?;

        assert_eq!(once, twice);

        Ok(())
    }

    #[test]
    fn non_max_suppression_skips_border() -> CanvexResult<()> {
        let magnitude = uniform(7.0);
        let direction = uniform(0.0);
        let result = non_max_suppression(&magnitude, &direction)?;

        // Horizontal comparison: only the middle column has both neighbours.
        assert_eq!(result.as_slice(), &[0.0, 7.0, 0.0, 0.0, 7.0, 0.0, 0.0, 7.0, 0.0]);

        Ok(())
    }

    #[test]
    fn uniform_matrix_thresholds_to_strong() {
        let config = CannyConfig::default();
        let result = double_threshold(&uniform(100.0), &config);

        assert!(result.as_slice().iter().all(|&v| v == 255.0));
    }

    #[test]
    fn uniform_matrix_below_high_is_weak() -> CanvexResult<()> {
        let config = CannyConfig::default();
        // max 1000 puts high at 120 and low at 3.6, so every 100 is weak.
        let mut matrix = uniform(100.0);
        matrix.set(1, 1, 1000.0);
        let result = double_threshold(&matrix, &config);

        assert_eq!(result.get(1, 1), Some(255.0));
        assert_eq!(result.as_slice().iter().filter(|&&v| v == 25.0).count(), 8);

        Ok(())
    }

    #[test]
    fn zero_matrix_thresholds_to_strong() {
        let result = double_threshold(&uniform(0.0), &CannyConfig::default());

        assert_eq!(result.as_slice(), &[255.0; 9]);
    }

    #[test]
    fn flat_intensity_has_no_edges() -> CanvexResult<()> {
        let luma = Matrix::from_vec(6, 5, vec![80.0; 30])?;
        let edges = detect_edges_in(&luma, &CannyConfig::default())?;

        assert_eq!(edges.shape(), (6, 5));
        assert!(edges.as_slice().iter().all(|&v| v == 0.0));

        Ok(())
    }

    #[test]
    fn weak_cell_next_to_strong_is_promoted() -> CanvexResult<()> {
        let config = CannyConfig::default();
        let matrix = Matrix::from_rows(&[
            vec![0.0, 0.0, 0.0],
            vec![0.0, 25.0, 0.0],
            vec![0.0, 0.0, 255.0],
        ])?;

        let result = hysteresis(&matrix, &config);

        assert_eq!(result.get(1, 1), Some(255.0));
        assert_eq!(result.get(2, 2), Some(255.0));

        Ok(())
    }

    #[test]
    fn isolated_weak_cell_is_dropped() -> CanvexResult<()> {
        let config = CannyConfig::default();
        let matrix = Matrix::from_rows(&[
            vec![25.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 25.0],
            vec![0.0, 0.0, 0.0, 255.0],
        ])?;

        let result = hysteresis(&matrix, &config);

        assert_eq!(result.get(0, 0), Some(0.0));
        assert_eq!(result.get(1, 3), Some(255.0));

        Ok(())
    }

    #[test]
    fn square_outline_produces_edges() -> CanvexResult<()> {
        let mut rows = vec![vec![0.0; 16]; 16];
        for row in rows.iter_mut().take(12).skip(4) {
            for value in row.iter_mut().take(12).skip(4) {
                *value = 255.0;
            }
        }
        let luma = Matrix::from_rows(&rows)?;

        let edges = detect_edges_in(&luma, &CannyConfig::default())?;

        assert_eq!(edges.shape(), (16, 16));
        assert!(edges.as_slice().iter().all(|&v| v == 0.0 || v == 255.0));
        assert!(edges.as_slice().iter().any(|&v| v == 255.0));
        // Far from the square nothing changes.
        assert_eq!(edges.get(0, 0), Some(0.0));
        assert_eq!(edges.get(8, 8), Some(0.0));

        Ok(())
    }
}
