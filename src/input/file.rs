use super::{Upload, UploadSource};
use anyhow::{Context, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};

/// Reads an upload from disk, guessing the MIME type from the extension
pub struct FileUpload {
    path: PathBuf,
}

impl FileUpload {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn guess_mime(path: &Path) -> &'static str {
        ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream")
    }
}

impl UploadSource for FileUpload {
    fn read_upload(&mut self) -> Result<Upload> {
        let path = &self.path;
        tracing::info!("Reading upload from {}", path.display());

        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_string();

        Ok(Upload::new(file_name, Self::guess_mime(path), bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_from_extension() {
        assert_eq!(FileUpload::guess_mime(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(FileUpload::guess_mime(Path::new("cut.png")), "image/png");
        assert_eq!(
            FileUpload::guess_mime(Path::new("report.pdf")),
            "application/octet-stream"
        );
    }
}
