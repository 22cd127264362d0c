mod png;

pub use png::PngFile;

use anyhow::Result;
use image::RgbaImage;

/// Trait for output destinations
pub trait OutputSink {
    /// Write a rendered frame to the output
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()>;
}
