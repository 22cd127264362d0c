use crate::error::{Result, SessionError};
use crate::mask::MaskBuffer;
use image::{GrayImage, Luma, RgbaImage};

/// Every Nth pixel is inspected when classifying a result
pub const SAMPLE_STRIDE: usize = 10;

/// Max per-channel spread for a pixel to count as grey
pub const GRAY_TOLERANCE: u8 = 5;

/// What a segmentation backend actually sent back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKind {
    /// Already transparent where the background was removed
    AlphaCutout,
    /// Opaque black/white (or grey) matte: brightness is the alpha
    GrayscaleMask,
    /// Opaque colour image; the background was probably not removed
    OpaqueFallback,
}

/// Classifies remote results and normalizes them into a straight-alpha mask
#[derive(Debug, Clone)]
pub struct MaskInterpreter {
    accept_opaque_fallback: bool,
}

impl Default for MaskInterpreter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MaskInterpreter {
    pub fn new(accept_opaque_fallback: bool) -> Self {
        Self {
            accept_opaque_fallback,
        }
    }

    /// Sample the result at a fixed stride.
    ///
    /// Any translucent sample wins immediately; otherwise one chromatic
    /// sample is enough to rule out a grayscale matte.
    pub fn classify(image: &RgbaImage) -> MaskKind {
        let mut grayscale = true;

        for pixel in image.pixels().step_by(SAMPLE_STRIDE) {
            let [r, g, b, a] = pixel.0;
            if a < u8::MAX {
                return MaskKind::AlphaCutout;
            }
            if r.abs_diff(g) > GRAY_TOLERANCE || g.abs_diff(b) > GRAY_TOLERANCE {
                grayscale = false;
            }
        }

        if grayscale {
            MaskKind::GrayscaleMask
        } else {
            MaskKind::OpaqueFallback
        }
    }

    /// Extract the alpha plane for a given classification
    pub fn alpha_plane(image: &RgbaImage, kind: MaskKind) -> GrayImage {
        let channel = match kind {
            MaskKind::GrayscaleMask => 0,
            MaskKind::AlphaCutout | MaskKind::OpaqueFallback => 3,
        };
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            Luma([image.get_pixel(x, y)[channel]])
        })
    }

    /// Classify `image` and write its alpha into `mask`.
    ///
    /// A rejected opaque fallback leaves `mask` untouched.
    pub fn apply(&self, image: &RgbaImage, mask: &mut MaskBuffer) -> Result<MaskKind> {
        let _span = tracing::debug_span!("interpret").entered();

        let kind = Self::classify(image);
        tracing::debug!("Segmentation result classified as {:?}", kind);

        if kind == MaskKind::OpaqueFallback {
            if !self.accept_opaque_fallback {
                return Err(SessionError::backend(
                    "Backend returned an opaque colour image; background removal likely failed",
                ));
            }
            tracing::warn!("Backend returned opaque colour image. Background removal likely failed.");
        }

        mask.overwrite(Self::alpha_plane(image, kind));
        Ok(kind)
    }
}
