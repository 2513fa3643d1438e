// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single error type shared by every fallible operation in the
//! crate.

use failure::Fail;
use std::io;

/// Everything that can go wrong while configuring, rendering, or
/// writing out a Mandelbrot pass.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The window onto the complex plane has no area.
    #[fail(display = "invalid plane window: {}", reason)]
    InvalidWindow {
        /// What was wrong with it.
        reason: String,
    },

    /// The pixel grid has no cells.
    #[fail(display = "grid of {}x{} pixels is empty", width, height)]
    EmptyGrid {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// A pixel grid was handed to a pass with a sample grid of a
    /// different shape.
    #[fail(
        display = "pixel grid is {}x{} but sample grid is {}x{}",
        grid_width, grid_height, sample_width, sample_height
    )]
    GridMismatch {
        /// Pixel grid width.
        grid_width: usize,
        /// Pixel grid height.
        grid_height: usize,
        /// Sample grid width.
        sample_width: usize,
        /// Sample grid height.
        sample_height: usize,
    },

    /// A worker pool was requested with no workers.
    #[fail(display = "worker pool needs at least one thread")]
    NoThreads,

    /// Intensity scaling divides by the iteration depth.
    #[fail(display = "cannot shade an image rendered with an iteration depth of 0")]
    ZeroDepth,

    /// A unit of work panicked.
    #[fail(display = "worker for column {} failed: {}", column, message)]
    Worker {
        /// The column the unit was computing.
        column: usize,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// The caller's cancel token fired while waiting for the pass.
    #[fail(display = "interrupted with {} column(s) outstanding", remaining)]
    Interrupted {
        /// Units that had not signalled completion.
        remaining: usize,
    },

    /// The operating system refused to start a worker thread.
    #[fail(display = "could not spawn thread {}: {}", name, error)]
    Spawn {
        /// Name of the thread that failed to start.
        name: String,
        /// The underlying error.
        #[cause]
        error: io::Error,
    },

    /// Writing an image failed.
    #[fail(display = "i/o error: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        RenderError::Io(err)
    }
}
