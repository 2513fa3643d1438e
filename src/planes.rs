//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane bounded by a PlaneWindow.
//! The mapper is what turns a pixel grid into a grid of sample points.

use itertools::iproduct;

use crate::complex::Complex;
use crate::error::RenderError;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the x, y of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The rectangle of the complex plane that gets sampled.  The real
/// axis runs along x and the imaginary axis along y.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneWindow {
    /// Left edge.
    pub real_min: f64,
    /// Right edge (exclusive when sampling).
    pub real_max: f64,
    /// Bottom edge.
    pub imag_min: f64,
    /// Top edge (exclusive when sampling).
    pub imag_max: f64,
}

impl PlaneWindow {
    /// The view of the whole set used by default.
    pub const DEFAULT: PlaneWindow = PlaneWindow {
        real_min: -2.0,
        real_max: 0.75,
        imag_min: -1.2,
        imag_max: 1.2,
    };

    /// Builds a window, refusing one with no area or with non-finite
    /// edges.
    pub fn new(
        real_min: f64,
        real_max: f64,
        imag_min: f64,
        imag_max: f64,
    ) -> Result<PlaneWindow, RenderError> {
        let window = PlaneWindow {
            real_min,
            real_max,
            imag_min,
            imag_max,
        };
        window.validate()?;
        Ok(window)
    }

    /// Builds a window from its left-lower and right-upper corners.
    pub fn from_corners(
        leftlower: Complex,
        rightupper: Complex,
    ) -> Result<PlaneWindow, RenderError> {
        PlaneWindow::new(leftlower.re, rightupper.re, leftlower.im, rightupper.im)
    }

    /// Checks the invariants `new` enforces.  Useful for windows built
    /// field by field.
    pub fn validate(&self) -> Result<(), RenderError> {
        let edges = [self.real_min, self.real_max, self.imag_min, self.imag_max];
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(RenderError::InvalidWindow {
                reason: format!("edges must be finite, got {:?}", self),
            });
        }
        if self.real_min >= self.real_max {
            return Err(RenderError::InvalidWindow {
                reason: format!(
                    "the left edge ({}) is not to the left of the right edge ({})",
                    self.real_min, self.real_max
                ),
            });
        }
        if self.imag_min >= self.imag_max {
            return Err(RenderError::InvalidWindow {
                reason: format!(
                    "the lower edge ({}) is not below the upper edge ({})",
                    self.imag_min, self.imag_max
                ),
            });
        }
        Ok(())
    }

    /// Width of the window along the real axis.
    pub fn real_span(&self) -> f64 {
        self.real_max - self.real_min
    }

    /// Height of the window along the imaginary axis.
    pub fn imag_span(&self) -> f64 {
        self.imag_max - self.imag_min
    }
}

impl Default for PlaneWindow {
    fn default() -> Self {
        PlaneWindow::DEFAULT
    }
}

/// Contains the definitions of two planes: an integral cartesian plane,
/// and a window onto the complex plane.  Maps pixels in one to points
/// in the other.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The sampled region of the complex plane.
    pub window: PlaneWindow,
    // How far one pixel moves along the real and imaginary axes.
    steps: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the
    /// window onto the complex plane.  Fails fast on an empty grid or a
    /// degenerate window, before anything gets sampled.
    pub fn new(
        width: usize,
        height: usize,
        window: PlaneWindow,
    ) -> Result<PlaneMapper, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyGrid { width, height });
        }
        window.validate()?;

        let steps = (
            window.real_span() / (width as f64),
            window.imag_span() / (height as f64),
        );

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            window,
            steps,
        })
    }

    /// Pixels along x.
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// Pixels along y.
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// Given a pixel on the integral cartesian plane, return the point
    /// it samples.  x walks the real axis and y the imaginary axis, each
    /// starting from the window's minimum edge.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex {
        Complex::new(
            self.window.real_min + (pixel.0 as f64) * self.steps.0,
            self.window.imag_min + (pixel.1 as f64) * self.steps.1,
        )
    }

    /// Samples every pixel.  The grid is stored column by column: all
    /// of column 0 from y = 0 upward, then column 1, and so on.
    pub fn sample(&self) -> SampleGrid {
        let points = iproduct!(0..self.width(), 0..self.height())
            .map(|(x, y)| self.pixel_to_point(&Pixel(x, y)))
            .collect();
        SampleGrid {
            width: self.width(),
            height: self.height(),
            points,
        }
    }
}

/// One sample point per pixel, laid out column-major.  Read-only once
/// built, so it can be shared freely between workers.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleGrid {
    width: usize,
    height: usize,
    points: Vec<Complex>,
}

impl SampleGrid {
    /// Columns in the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows in the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The point sampled for pixel (x, y).
    pub fn get(&self, x: usize, y: usize) -> Complex {
        self.points[x * self.height + y]
    }

    /// Every point of column x, from y = 0 upward.
    pub fn column(&self, x: usize) -> &[Complex] {
        &self.points[x * self.height..(x + 1) * self.height]
    }
}
