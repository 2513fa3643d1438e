// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns a finished `PixelGrid` into an 8-bit grayscale image and
//! writes it to disk.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::png::PNGEncoder;
use image::pnm::{PNMEncoder, PNMSubtype, SampleEncoding};
use image::ColorType;
use num::clamp;

use crate::error::RenderError;
use crate::executor::Strategy;
use crate::grid::PixelGrid;

/// Supported output encodings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics.
    Png,
    /// Binary portable graymap.
    Pgm,
}

impl ImageFormat {
    /// The file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Pgm => "pgm",
        }
    }
}

impl Default for ImageFormat {
    fn default() -> Self {
        ImageFormat::Png
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(ImageFormat::Png),
            "pgm" | "pnm" => Ok(ImageFormat::Pgm),
            _ => Err(format!("unknown image format '{}'", s)),
        }
    }
}

/// Intensity for a single escape count: `round(255 * count / depth)`,
/// clamped to a byte.
pub fn shade(count: u32, depth: u32) -> u8 {
    let scaled = (255.0 * f64::from(count) / f64::from(depth)).round();
    clamp(scaled, 0.0, 255.0) as u8
}

/// Lays the grid out row by row, as image encoders expect.  Raster
/// index `i` comes from pixel `(i % width, i / width)`, so row 0 of the
/// image is the window's lower imaginary edge.
pub fn to_raster(grid: &PixelGrid, depth: u32) -> Result<Vec<u8>, RenderError> {
    if depth == 0 {
        return Err(RenderError::ZeroDepth);
    }
    let (width, height) = (grid.width(), grid.height());
    Ok((0..width * height)
        .map(|i| shade(grid.get(i % width, i / width), depth))
        .collect())
}

/// `<prefix>_Mandelbrot_<depth>.<ext>`, e.g. `S_Mandelbrot_50.png`.
pub fn output_name(strategy: Strategy, depth: u32, format: ImageFormat) -> String {
    format!(
        "{}_Mandelbrot_{}.{}",
        strategy.prefix(),
        depth,
        format.extension()
    )
}

/// Writes a grayscale raster of `bounds.0` by `bounds.1` pixels.
pub fn write_image(
    path: &Path,
    pixels: &[u8],
    bounds: (usize, usize),
    format: ImageFormat,
) -> Result<(), RenderError> {
    let mut output = BufWriter::new(File::create(path)?);
    let (width, height) = (bounds.0 as u32, bounds.1 as u32);
    match format {
        ImageFormat::Png => {
            PNGEncoder::new(&mut output).encode(pixels, width, height, ColorType::Gray(8))?
        }
        ImageFormat::Pgm => PNMEncoder::new(&mut output)
            .with_subtype(PNMSubtype::Graymap(SampleEncoding::Binary))
            .encode(pixels, width, height, ColorType::Gray(8))?,
    }
    output.flush()?;
    Ok(())
}

/// Shades `grid` and writes it into `dir` under its conventional name.
/// Returns the path written.
pub fn save(
    grid: &PixelGrid,
    strategy: Strategy,
    depth: u32,
    dir: &Path,
    format: ImageFormat,
) -> Result<PathBuf, RenderError> {
    let pixels = to_raster(grid, depth)?;
    let path = dir.join(output_name(strategy, depth, format));
    write_image(&path, &pixels, (grid.width(), grid.height()), format)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn shade_spans_the_byte() {
        assert_eq!(shade(0, 50), 0);
        assert_eq!(shade(50, 50), 255);
        assert_eq!(shade(25, 50), 128);
        assert_eq!(shade(1, 3), 85);
        assert_eq!(shade(2, 3), 170);
        assert_eq!(shade(999, 50), 255);
    }

    #[test]
    fn raster_is_row_major() {
        let mut grid = PixelGrid::new(3, 2);
        for (x, column) in grid.columns_mut().enumerate() {
            for (y, cell) in column.iter_mut().enumerate() {
                *cell = (x + 3 * y) as u32;
            }
        }
        let raster = to_raster(&grid, 255).unwrap();
        assert_eq!(raster, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn zero_depth_is_refused() {
        match to_raster(&PixelGrid::new(2, 2), 0) {
            Err(RenderError::ZeroDepth) => {}
            other => panic!("expected ZeroDepth, got {:?}", other),
        }
    }

    #[test]
    fn names_follow_the_strategy() {
        assert_eq!(
            output_name(Strategy::Sequential, 50, ImageFormat::Png),
            "S_Mandelbrot_50.png"
        );
        assert_eq!(
            output_name(Strategy::Pool(4), 7, ImageFormat::Pgm),
            "E_Mandelbrot_7.pgm"
        );
        assert_eq!("pnm".parse::<ImageFormat>(), Ok(ImageFormat::Pgm));
    }

    #[test]
    fn writes_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let grid = PixelGrid::filled(8, 4, 3);
        for &format in &[ImageFormat::Png, ImageFormat::Pgm] {
            let path = save(&grid, Strategy::Unbounded, 6, dir.path(), format).unwrap();
            assert!(path.ends_with(format!("P_Mandelbrot_6.{}", format)));
            assert!(fs::metadata(&path).unwrap().len() > 0);
        }
        let pgm = fs::read(dir.path().join("P_Mandelbrot_6.pgm")).unwrap();
        assert!(pgm.starts_with(b"P5"));
        assert!(pgm.ends_with(&[128; 32]));
    }
}
