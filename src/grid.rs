//! The output buffer: one escape count per pixel, stored column-major
//! so that each column is a contiguous slice and can be handed to a
//! worker on its own.

use std::slice::ChunksMut;

/// A W×H grid of escape counts.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl PixelGrid {
    /// A zeroed grid.
    pub fn new(width: usize, height: usize) -> Self {
        PixelGrid::filled(width, height, 0)
    }

    /// A grid with every cell set to `value`.  Handy as a sentinel for
    /// checking that a pass touched everything.
    pub fn filled(width: usize, height: usize, value: u32) -> Self {
        PixelGrid {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    /// Columns in the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows in the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The count stored for pixel (x, y).
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[x * self.height + y]
    }

    /// Column x, from y = 0 upward.
    pub fn column(&self, x: usize) -> &[u32] {
        &self.cells[x * self.height..(x + 1) * self.height]
    }

    /// Splits the grid into its columns, each one a disjoint mutable
    /// slice.  This is the only way a pass writes into the grid.
    pub fn columns_mut(&mut self) -> ChunksMut<u32> {
        self.cells.chunks_mut(self.height.max(1))
    }

    /// Every cell, column-major.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// Zeroes the grid so it can be reused for another pass.
    pub fn reset(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = 0;
        }
    }
}
