// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time iterator.  Pure, so any number of threads can call
//! it for distinct points without coordinating.

use crate::complex::Complex;

/// Once an orbit is further than this from the origin it is known to
/// run off to infinity.
pub const ESCAPE_RADIUS: f64 = 2.0;

/// This is our classic iterator function.  Starting from `z = c`, it
/// applies `z = z * z + c` until the orbit leaves the escape radius,
/// and returns the iteration at which that was noticed.  A point that
/// is still inside after `max_iterations` steps is treated as a member
/// of the set and gets `max_iterations` itself.
#[inline]
pub fn escape_time(c: Complex, max_iterations: u32) -> u32 {
    let mut z = c;
    for t in 0..max_iterations {
        if z.magnitude() > ESCAPE_RADIUS {
            return t;
        }
        z = z * z + c;
    }
    max_iterations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planes::{PlaneMapper, PlaneWindow};

    #[test]
    fn origin_never_escapes() {
        for n in 0..64 {
            assert_eq!(escape_time(Complex::ZERO, n), n);
        }
    }

    #[test]
    fn far_points_escape_immediately() {
        for n in 1..64 {
            assert_eq!(escape_time(Complex::new(5.0, 5.0), n), 0);
        }
    }

    #[test]
    fn zero_depth_is_always_zero() {
        assert_eq!(escape_time(Complex::new(5.0, 5.0), 0), 0);
        assert_eq!(escape_time(Complex::new(-0.5, 0.1), 0), 0);
    }

    #[test]
    fn hand_traced_orbits() {
        // 1 -> 2 -> 5
        assert_eq!(escape_time(Complex::new(1.0, 0.0), 10), 2);
        // 2 sits exactly on the radius, then 6
        assert_eq!(escape_time(Complex::new(2.0, 0.0), 10), 1);
        // -2 -> 2 -> 2 -> ...
        assert_eq!(escape_time(Complex::new(-2.0, 0.0), 100), 100);
        // -1 -> 0 -> -1 -> ...
        assert_eq!(escape_time(Complex::new(-1.0, 0.0), 100), 100);
        // -1-i -> -1+i -> -1-3i
        assert_eq!(escape_time(Complex::new(-1.0, -1.0), 10), 2);
    }

    #[test]
    fn result_is_bounded_by_depth() {
        let pm = PlaneMapper::new(48, 32, PlaneWindow::new(-2.5, 1.5, -1.5, 1.5).unwrap()).unwrap();
        let grid = pm.sample();
        for x in 0..grid.width() {
            for &c in grid.column(x) {
                for &depth in &[1, 7, 50] {
                    let t = escape_time(c, depth);
                    assert!(t <= depth);
                }
            }
        }
    }

    #[test]
    fn capped_iff_orbit_stays_inside() {
        let depth = 25;
        let pm = PlaneMapper::new(20, 20, PlaneWindow::DEFAULT).unwrap();
        let grid = pm.sample();
        for x in 0..grid.width() {
            for &c in grid.column(x) {
                let mut z = c;
                let mut stayed = true;
                for _ in 0..depth {
                    if z.magnitude() > ESCAPE_RADIUS {
                        stayed = false;
                        break;
                    }
                    z = z * z + c;
                }
                assert_eq!(escape_time(c, depth) == depth, stayed, "{}", c);
            }
        }
    }
}
