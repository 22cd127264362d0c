use super::OutputSink;
use crate::compositor;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Writes frames as PNG files (the download path)
pub struct PngFile {
    path: PathBuf,
}

impl PngFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl OutputSink for PngFile {
    fn write_frame(&mut self, frame: &image::RgbaImage) -> Result<()> {
        let bytes = compositor::encode_png(frame).context("Failed to encode PNG")?;
        std::fs::write(&self.path, bytes)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        tracing::info!(
            "Wrote {}x{} PNG to {}",
            frame.width(),
            frame.height(),
            self.path.display()
        );
        Ok(())
    }
}
