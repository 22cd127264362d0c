use crate::error::{Result, SessionError};
use bytes::Bytes;
use image::RgbaImage;

/// A user-selected file before decoding
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Decoded upload. Never mutated once loaded; a new upload replaces it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    upload: Upload,
    pixels: RgbaImage,
}

impl SourceImage {
    /// Validate the MIME type and decode the upload into straight RGBA pixels.
    pub fn decode(upload: Upload) -> Result<Self> {
        let _span = tracing::debug_span!("decode", file = %upload.file_name).entered();

        if !upload.is_image() {
            return Err(SessionError::InvalidInput(format!(
                "{} has type '{}', expected image/*",
                upload.file_name, upload.mime
            )));
        }

        let pixels = image::load_from_memory(&upload.bytes)
            .map_err(|e| SessionError::InvalidInput(format!("{}: {e}", upload.file_name)))?
            .to_rgba8();

        tracing::debug!(
            "Decoded {} at {}x{}",
            upload.file_name,
            pixels.width(),
            pixels.height()
        );

        Ok(Self { upload, pixels })
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn upload(&self) -> &Upload {
        &self.upload
    }

    /// Native (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

#[cfg(test)]
pub(crate) fn png_upload(image: &RgbaImage) -> Upload {
    let mut buf = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    Upload::new("test.png", "image/png", buf.into_inner())
}
