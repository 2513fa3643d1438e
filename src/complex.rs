// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A small, immutable complex number.  Every operation hands back a
//! fresh value; nothing here ever mutates in place.  The escape-time
//! loop only needs addition, multiplication and the magnitude, but the
//! rest of the field operations are here so the type stands on its
//! own.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A point on the complex plane.  Equality is exact, component by
/// component, with no tolerance.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Complex {
    /// The real part, plotted along x.
    pub re: f64,
    /// The imaginary part, plotted along y.
    pub im: f64,
}

impl Complex {
    /// The origin.
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    /// Builds a complex number from its two parts.
    pub const fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    /// Distance from the origin.  Uses `hypot` rather than the naive
    /// square root of the sum of squares, so very large or very small
    /// components neither overflow nor flush to zero.
    #[inline]
    pub fn magnitude(self) -> f64 {
        self.re.hypot(self.im)
    }

    /// Mirror image across the real axis.
    pub fn conjugate(self) -> Self {
        Complex::new(self.re, -self.im)
    }

    /// Multiplies both parts by a real factor.
    pub fn scale(self, alpha: f64) -> Self {
        Complex::new(alpha * self.re, alpha * self.im)
    }

    /// `1 / self`, or `None` for the origin.
    pub fn reciprocal(self) -> Option<Self> {
        let scale = self.re * self.re + self.im * self.im;
        if scale == 0.0 {
            return None;
        }
        Some(Complex::new(self.re / scale, -self.im / scale))
    }

    /// `self / divisor`, or `None` when the divisor is the origin.
    pub fn divide(self, divisor: Complex) -> Option<Self> {
        divisor.reciprocal().map(|r| self * r)
    }
}

impl Add for Complex {
    type Output = Complex;

    #[inline]
    fn add(self, b: Complex) -> Complex {
        Complex::new(self.re + b.re, self.im + b.im)
    }
}

impl Sub for Complex {
    type Output = Complex;

    #[inline]
    fn sub(self, b: Complex) -> Complex {
        Complex::new(self.re - b.re, self.im - b.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    #[inline]
    fn mul(self, b: Complex) -> Complex {
        Complex::new(
            self.re * b.re - self.im * b.im,
            self.re * b.im + self.im * b.re,
        )
    }
}

impl Mul<f64> for Complex {
    type Output = Complex;

    fn mul(self, alpha: f64) -> Complex {
        self.scale(alpha)
    }
}

impl Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        Complex::new(-self.re, -self.im)
    }
}

impl From<num::Complex<f64>> for Complex {
    fn from(c: num::Complex<f64>) -> Self {
        Complex::new(c.re, c.im)
    }
}

impl From<Complex> for num::Complex<f64> {
    fn from(c: Complex) -> Self {
        num::Complex::new(c.re, c.im)
    }
}

/// Renders as `a + bi`, `a - bi`, or just one part when the other is
/// zero.
impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.im == 0.0 {
            write!(f, "{}", self.re)
        } else if self.re == 0.0 {
            write!(f, "{}i", self.im)
        } else if self.im < 0.0 {
            write!(f, "{} - {}i", self.re, -self.im)
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}
