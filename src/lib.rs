#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer, three ways
//!
//! The Mandelbrot set takes a point on the complex plane and
//! repeatedly squares it and adds the original point back, measuring
//! how quickly that number runs off to infinity.  The iteration at
//! which it leaves a circle of radius 2 is the "escape time", and it is
//! the number used to shade the pixel.
//!
//! Every pixel is independent of every other, which makes the set a
//! convenient yardstick for parallel execution.  This crate samples a
//! window of the complex plane into a grid, computes the escape time of
//! every sample, and can do so sequentially, with one thread per
//! column, or with a fixed pool of workers pulling columns from a
//! queue.  All three produce the same grid, bit for bit.

pub mod complex;
pub mod config;
pub mod error;
pub mod escape;
pub mod executor;
pub mod grid;
pub mod latch;
pub mod planes;
pub mod raster;
pub mod renderer;

pub use crate::complex::Complex;
pub use crate::config::RenderConfig;
pub use crate::error::RenderError;
pub use crate::escape::escape_time;
pub use crate::executor::{execute, Strategy};
pub use crate::grid::PixelGrid;
pub use crate::latch::{CancelToken, CountDownLatch};
pub use crate::planes::{PlaneMapper, PlaneWindow, SampleGrid};
pub use crate::raster::ImageFormat;
pub use crate::renderer::MandelbrotRenderer;
