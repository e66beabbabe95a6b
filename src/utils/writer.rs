use crate::matrix::{Element, Matrix};
use crate::png::PngImage;
use crate::utils::error::CanvexResult;
use crate::utils::image::PixelBuffer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct Writer {}

impl Writer {
    /// Writes `pixels` as a binary PPM (P6). Alpha is dropped.
    pub fn write_ppm(output_path: &Path, pixels: &PixelBuffer) -> CanvexResult<()> {
        let rgb = pixels.clone().into_rgb8();
        let mut file = BufWriter::new(File::create(output_path)?);

        file.write_all(b"P6\n")?;
        file.write_all(format!("{} {}\n", rgb.width(), rgb.height()).as_bytes())?;
        file.write_all(b"255\n")?;
        file.write_all(rgb.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Writes a matrix as a binary PGM (P5), clamping cells to `0..=255`.
    pub fn write_pgm<T: Element>(output_path: &Path, matrix: &Matrix<T>) -> CanvexResult<()> {
        let mut file = BufWriter::new(File::create(output_path)?);

        file.write_all(b"P5\n")?;
        file.write_all(format!("{} {}\n", matrix.width(), matrix.height()).as_bytes())?;
        file.write_all(b"255\n")?;
        file.write_all(&matrix.to_gray8())?;
        file.flush()?;

        Ok(())
    }

    pub fn write_png(output_path: &Path, image: &PngImage) -> CanvexResult<()> {
        let mut file = BufWriter::new(File::create(output_path)?);

        image.write_to(&mut file)?;
        file.flush()?;

        Ok(())
    }
}
