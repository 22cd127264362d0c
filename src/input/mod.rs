mod file;
mod upload;

pub use file::FileUpload;
pub use upload::{SourceImage, Upload};

#[cfg(test)]
pub(crate) use upload::png_upload;

use anyhow::Result;

/// Trait for places an image upload can come from
pub trait UploadSource {
    /// Read the selected file, with its declared MIME type
    fn read_upload(&mut self) -> Result<Upload>;
}
