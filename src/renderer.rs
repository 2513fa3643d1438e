// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Ties the pieces together: a plane, a depth, and the escape-time
//! function, run under whichever strategy the caller asks for.

use crate::complex::Complex;
use crate::error::RenderError;
use crate::escape::escape_time;
use crate::executor::{execute, Strategy};
use crate::grid::PixelGrid;
use crate::latch::CancelToken;
use crate::planes::{PlaneMapper, PlaneWindow, SampleGrid};

/// Takes a plane and a limit (the number of iterations to conduct
/// per-point) and renders the Mandelbrot set's escape times over it.
/// Holds configuration only; the sample grid and pixel grid of a pass
/// are arguments and results, never fields.
#[derive(Copy, Clone, Debug)]
pub struct MandelbrotRenderer {
    plane: PlaneMapper,
    depth: u32,
}

impl MandelbrotRenderer {
    /// Requires the width and height of the image, the window onto the
    /// complex plane, and the iteration cap.
    pub fn new(
        width: usize,
        height: usize,
        window: PlaneWindow,
        depth: u32,
    ) -> Result<Self, RenderError> {
        let plane = PlaneMapper::new(width, height, window)?;
        Ok(MandelbrotRenderer { plane, depth })
    }

    /// The mapping from pixels to points.
    pub fn plane(&self) -> &PlaneMapper {
        &self.plane
    }

    /// The iteration cap.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The escape time of a single point at this renderer's depth.
    pub fn escape_time(&self, c: Complex) -> u32 {
        escape_time(c, self.depth)
    }

    /// Fills `grid` from `samples`.  Both must match the plane's shape.
    pub fn render_into(
        &self,
        strategy: Strategy,
        samples: &SampleGrid,
        grid: &mut PixelGrid,
        cancel: &CancelToken,
    ) -> Result<(), RenderError> {
        let depth = self.depth;
        execute(strategy, samples, grid, cancel, |c| escape_time(c, depth))
    }

    /// One complete pass: sample the plane, render into a fresh grid,
    /// and hand the grid back.
    pub fn render(&self, strategy: Strategy) -> Result<PixelGrid, RenderError> {
        self.render_with_cancel(strategy, &CancelToken::new())
    }

    /// `render`, abandoning the pass if `cancel` fires.
    pub fn render_with_cancel(
        &self,
        strategy: Strategy,
        cancel: &CancelToken,
    ) -> Result<PixelGrid, RenderError> {
        let samples = self.plane.sample();
        let mut grid = PixelGrid::new(self.plane.width(), self.plane.height());
        self.render_into(strategy, &samples, &mut grid, cancel)?;
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_default_view_identically() {
        let renderer = MandelbrotRenderer::new(96, 96, PlaneWindow::DEFAULT, 50).unwrap();
        let reference = renderer.render(Strategy::Sequential).unwrap();
        assert_eq!(renderer.render(Strategy::Unbounded).unwrap(), reference);
        assert_eq!(renderer.render(Strategy::pool()).unwrap(), reference);
        // The main cardioid holds the origin; the far corner escapes at once.
        let origin_x = (2.0 / 2.75 * 96.0) as usize;
        assert_eq!(reference.get(origin_x, 48), 50);
        assert_eq!(reference.get(0, 0), 0);
    }

    #[test]
    fn grids_are_reusable_across_passes() {
        let renderer = MandelbrotRenderer::new(16, 16, PlaneWindow::DEFAULT, 20).unwrap();
        let samples = renderer.plane().sample();
        let mut grid = PixelGrid::new(16, 16);
        let cancel = CancelToken::new();
        renderer
            .render_into(Strategy::Pool(2), &samples, &mut grid, &cancel)
            .unwrap();
        let first = grid.clone();
        grid.reset();
        renderer
            .render_into(Strategy::Unbounded, &samples, &mut grid, &cancel)
            .unwrap();
        assert_eq!(grid, first);
    }

    #[test]
    fn point_escape_uses_depth() {
        let renderer = MandelbrotRenderer::new(4, 4, PlaneWindow::DEFAULT, 12).unwrap();
        assert_eq!(renderer.escape_time(Complex::ZERO), 12);
        assert_eq!(renderer.depth(), 12);
    }
}
