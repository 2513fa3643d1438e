//! Everything needed to describe a run, with defaults matching the
//! reference benchmark: a 1024×1024 view of the whole set at depth 50.

use std::path::PathBuf;

use crate::error::RenderError;
use crate::executor::Strategy;
use crate::planes::{PlaneMapper, PlaneWindow};
use crate::raster::ImageFormat;
use crate::renderer::MandelbrotRenderer;

/// Default image width in pixels.
pub const IMAGE_WIDTH: usize = 1024;
/// Default image height in pixels.
pub const IMAGE_HEIGHT: usize = 1024;
/// Default cap on escape-time iterations.
pub const ITERATION_DEPTH: u32 = 50;

/// A complete description of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// The sampled region of the complex plane.
    pub window: PlaneWindow,
    /// Cap on escape-time iterations.
    pub depth: u32,
    /// Strategies to run, in order.
    pub strategies: Vec<Strategy>,
    /// Where images are written.
    pub output_dir: PathBuf,
    /// How images are encoded.
    pub format: ImageFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            window: PlaneWindow::DEFAULT,
            depth: ITERATION_DEPTH,
            strategies: Strategy::all(),
            output_dir: PathBuf::from("."),
            format: ImageFormat::default(),
        }
    }
}

impl RenderConfig {
    /// Fails fast on anything that would make a pass meaningless.
    pub fn validate(&self) -> Result<(), RenderError> {
        PlaneMapper::new(self.width, self.height, self.window)?;
        if self.depth == 0 {
            return Err(RenderError::ZeroDepth);
        }
        if self.strategies.contains(&Strategy::Pool(0)) {
            return Err(RenderError::NoThreads);
        }
        Ok(())
    }

    /// The renderer this configuration describes.
    pub fn renderer(&self) -> Result<MandelbrotRenderer, RenderError> {
        self.validate()?;
        MandelbrotRenderer::new(self.width, self.height, self.window, self.depth)
    }
}
